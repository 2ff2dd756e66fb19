use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use models::notification;

use crate::errors::JsonApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(read_all))
        .route("/notifications/:id/read", post(read))
}

#[utoipa::path(get, path = "/notifications", tag = "notifications", responses((status = 200, description = "Caller's notifications, newest first")))]
pub async fn list(State(state): State<AppState>, Caller(actor): Caller) -> Result<Json<Vec<notification::Model>>, JsonApiError> {
    Ok(Json(state.notifications.list_for(actor.user_id).await?))
}

#[utoipa::path(get, path = "/notifications/unread-count", tag = "notifications", responses((status = 200, description = "Unread notifications", body = crate::openapi::CountResponse)))]
pub async fn unread_count(State(state): State<AppState>, Caller(actor): Caller) -> Result<Json<CountOutput>, JsonApiError> {
    let count = state.notifications.unread_count(actor.user_id).await?;
    Ok(Json(CountOutput { count }))
}

#[utoipa::path(post, path = "/notifications/{id}/read", tag = "notifications", params(("id" = Uuid, Path, description = "Notification id")), responses((status = 200, description = "Marked read"), (status = 404, description = "Not Found")))]
pub async fn read(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<notification::Model>, JsonApiError> {
    Ok(Json(state.notifications.mark_read(id, actor.user_id).await?))
}

#[utoipa::path(post, path = "/notifications/read-all", tag = "notifications", responses((status = 200, description = "Number of notifications marked read", body = crate::openapi::CountResponse)))]
pub async fn read_all(State(state): State<AppState>, Caller(actor): Caller) -> Result<Json<CountOutput>, JsonApiError> {
    let count = state.notifications.mark_all_read(actor.user_id).await?;
    Ok(Json(CountOutput { count }))
}
