use crate::error::Error;
use axum::extract::rejection::HostRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<HostRejection>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<Error>() {
            Some(Error::UnknownZone(_) | Error::InvalidHost(_)) => StatusCode::BAD_REQUEST,
            Some(Error::Forbidden(_, _)) => StatusCode::FORBIDDEN,
            Some(Error::ZoneFull(_)) => StatusCode::INSUFFICIENT_STORAGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let status = self.status();
        let any_err = self.0;
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {any_err:?}");
            "something odd happened".to_string()
        } else {
            format!("{any_err}")
        };
        let body = Json(json!({
            "error": message,
        }));
        (status, body).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use trust_dns_server::client::rr::{LowerName, Name};

    fn status_of(err: Error) -> StatusCode {
        APIError::from(err).into_response().status()
    }

    #[test]
    fn maps_errors_to_status_codes() {
        let zone = LowerName::from(Name::from_str("words.example.").unwrap());
        assert_eq!(status_of(Error::UnknownZone(zone.clone())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::InvalidHost("[::1]".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::Forbidden("192.0.2.1".parse().unwrap(), zone.clone())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::ZoneFull(zone)),
            StatusCode::INSUFFICIENT_STORAGE
        );
        assert_eq!(
            status_of(Error::IO(std::io::Error::from(std::io::ErrorKind::Other))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
