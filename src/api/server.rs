use crate::api::routes;
use crate::config::Shared;
use crate::registry::Registrar;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: Shared,
    pub registrar: Registrar,
}

pub fn new(config: Shared, registrar: Registrar) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.api_bind_addr).serve(
        routes::new(AppState { config, registrar })
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
}
