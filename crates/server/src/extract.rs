use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use service::booking::Actor;
use service::errors::ServiceError;

use crate::errors::{unauthenticated, JsonApiError};
use crate::state::AppState;

/// Identity set by the upstream authenticator.
pub const USER_HEADER: &str = "x-user-id";

/// The calling user, resolved against the user directory.
pub struct Caller(pub Actor);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthenticated("missing x-user-id"))?;
        let user_id = Uuid::parse_str(raw.trim()).map_err(|_| unauthenticated("malformed x-user-id"))?;
        match state.bookings.resolve_actor(user_id).await {
            Ok(actor) => Ok(Caller(actor)),
            Err(ServiceError::Unauthorized(_)) => Err(unauthenticated("unknown caller")),
            Err(e) => Err(JsonApiError(e).into_response()),
        }
    }
}
