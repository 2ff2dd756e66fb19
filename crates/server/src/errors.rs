use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{debug, error, warn};

/// HTTP face of [`ServiceError`].
#[derive(Debug)]
pub struct JsonApiError(pub ServiceError);

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self { Self(e) }
}

fn body(status: StatusCode, error: &str, code: u16, message: String) -> Response {
    (status, Json(ErrorBody { error: error.to_string(), code, message })).into_response()
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let e = self.0;
        match e.kind() {
            "validation" => body(StatusCode::BAD_REQUEST, "validation", e.code(), e.to_string()),
            // unauthorized looks exactly like not found from outside
            "not_found" | "unauthorized" => {
                debug!(kind = e.kind(), error = %e, "hidden as not found");
                body(StatusCode::NOT_FOUND, "not_found", 2002, "resource not found".into())
            }
            "invalid_transition" | "conflict" => body(StatusCode::CONFLICT, e.kind(), e.code(), e.to_string()),
            "transient" => {
                warn!(error = %e, "store unavailable");
                body(StatusCode::SERVICE_UNAVAILABLE, "transient", e.code(), "temporarily unavailable, try again".into())
            }
            _ => {
                error!(error = %e, "request failed");
                body(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.code(), "internal error".into())
            }
        }
    }
}

/// Missing, malformed or unknown `x-user-id`.
pub fn unauthenticated(reason: &str) -> Response {
    debug!(reason, "caller rejected");
    body(StatusCode::UNAUTHORIZED, "unauthenticated", 1001, reason.to_string())
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage init failed: {0}")]
    Storage(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(e: ServiceError) -> StatusCode { JsonApiError(e).into_response().status() }

    #[test]
    fn status_mapping() {
        assert_eq!(status(ServiceError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ServiceError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::Unauthorized("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::invalid_transition("booking", "REJECTED", "confirm")), StatusCode::CONFLICT);
        assert_eq!(status(ServiceError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(ServiceError::Transient("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(ServiceError::Db("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
