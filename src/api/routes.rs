use crate::api::api_error::APIError;
use crate::api::model::{zone_from_host, Registration};
use crate::api::server::AppState;
use crate::error::Error;
use axum::extract::{ConnectInfo, Host, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/", get(readme))
        .route("/healthcheck", get(health_check))
        .route("/register", get(register))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn readme(State(state): State<AppState>) -> Response {
    let Some(path) = &state.config.readme_path else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match tokio::fs::read_to_string(path).await {
        Ok(readme) => readme.into_response(),
        Err(err) => APIError::from(Error::PathIO(path.clone(), err)).into_response(),
    }
}

async fn register(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    WithRejection(Host(host), _): WithRejection<Host, APIError>,
) -> Result<Registration, APIError> {
    Ok(register_host(&state, &host, client_addr.ip()).await?)
}

async fn register_host(
    state: &AppState,
    host: &str,
    client_ip: IpAddr,
) -> Result<Registration, Error> {
    let zone = zone_from_host(host)?;
    match state.registrar.register(&zone, client_ip).await {
        Ok(name) => {
            tracing::info!("registered \"{name}.{zone}\" for {client_ip}");
            Ok(Registration { name, zone })
        }
        Err(err) => {
            tracing::debug!("rejected registration from {client_ip} for \"{host}\": {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Arc;

    const CONFIG: &str = r#"{
        "api_bind_addr": "127.0.0.1:8080",
        "api_timeout": 10,
        "dns_udp_bind_addr": "127.0.0.1:5353",
        "dns_tcp_bind_addr": "127.0.0.1:5353",
        "dns_tcp_timeout": 10,
        "zones": [
            {
                "type": "words",
                "domain": "words.example.com",
                "ns_domain": "ns.example.com",
                "arity": 2,
                "subnet": "198.51.100.0/24"
            }
        ]
    }"#;

    async fn state(dir: &std::path::Path) -> AppState {
        std::fs::write(dir.join("word_list"), "apple\nbanana\ncherry\ndurian\n").unwrap();
        let mut config = Config::try_from_reader(CONFIG.as_bytes()).unwrap();
        config.data_dir = Some(dir.to_path_buf());
        let store = config.slot_store().await.unwrap();
        let registry = Arc::new(config.name_registry(store).await.unwrap());
        let registrar = config.registrar(registry);
        AppState {
            config: Arc::new(config),
            registrar,
        }
    }

    #[tokio::test]
    async fn registers_from_host() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        let client: IpAddr = "198.51.100.9".parse().unwrap();

        let first = register_host(&state, "words.example.com:8080", client)
            .await
            .unwrap();
        let second = register_host(&state, "WORDS.example.com", client)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name.split('-').count(), 2);
    }

    #[tokio::test]
    async fn rejections() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        let inside: IpAddr = "198.51.100.9".parse().unwrap();
        let outside: IpAddr = "203.0.113.9".parse().unwrap();

        assert!(matches!(
            register_host(&state, "echo.example.com", inside).await,
            Err(Error::UnknownZone(_))
        ));
        assert!(matches!(
            register_host(&state, "[::1]:8080", inside).await,
            Err(Error::InvalidHost(_))
        ));
        assert!(matches!(
            register_host(&state, "words.example.com", outside).await,
            Err(Error::Forbidden(_, _))
        ));
    }

    #[tokio::test]
    async fn readme_without_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path()).await;
        assert_eq!(readme(State(state)).await.status(), StatusCode::NOT_FOUND);
    }
}
