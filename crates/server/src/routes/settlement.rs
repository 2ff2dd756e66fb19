//! Actions addressed by change request, quote or billing id.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use models::{billing, booking_change_request as change_request, quote};
use service::booking::AcceptedQuote;

use crate::errors::JsonApiError;
use crate::extract::Caller;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/change-requests/:id/approve", post(approve_change))
        .route("/change-requests/:id/deny", post(deny_change))
        .route("/quotes/:id/accept", post(accept_quote))
        .route("/quotes/:id/reject", post(reject_quote))
        .route("/billings/:id/pay", post(pay_billing))
}

#[utoipa::path(post, path = "/change-requests/{id}/approve", tag = "settlement", params(("id" = Uuid, Path, description = "Change request id")), responses((status = 200, description = "Approved, booking rescheduled"), (status = 409, description = "Already resolved")))]
pub async fn approve_change(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<change_request::Model>, JsonApiError> {
    Ok(Json(state.bookings.approve_change(&actor, id).await?))
}

#[utoipa::path(post, path = "/change-requests/{id}/deny", tag = "settlement", params(("id" = Uuid, Path, description = "Change request id")), responses((status = 200, description = "Denied"), (status = 409, description = "Already resolved")))]
pub async fn deny_change(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<change_request::Model>, JsonApiError> {
    Ok(Json(state.bookings.deny_change(&actor, id).await?))
}

#[utoipa::path(post, path = "/quotes/{id}/accept", tag = "settlement", params(("id" = Uuid, Path, description = "Quote id")), responses((status = 200, description = "Quote approved with its billing"), (status = 409, description = "Already accepted")))]
pub async fn accept_quote(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<AcceptedQuote>, JsonApiError> {
    Ok(Json(state.bookings.accept_quote(&actor, id).await?))
}

#[utoipa::path(post, path = "/quotes/{id}/reject", tag = "settlement", params(("id" = Uuid, Path, description = "Quote id")), responses((status = 200, description = "Rejected"), (status = 409, description = "Not PENDING")))]
pub async fn reject_quote(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<quote::Model>, JsonApiError> {
    Ok(Json(state.bookings.reject_quote(&actor, id).await?))
}

#[utoipa::path(post, path = "/billings/{id}/pay", tag = "settlement", params(("id" = Uuid, Path, description = "Billing id")), responses((status = 200, description = "Marked PAID"), (status = 409, description = "Already PAID")))]
pub async fn pay_billing(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<billing::Model>, JsonApiError> {
    Ok(Json(state.bookings.mark_billing_paid(&actor, id).await?))
}
