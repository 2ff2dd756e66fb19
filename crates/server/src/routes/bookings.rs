use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use models::booking::{self, BookingStatus};
use models::booking_change_request as change_request;
use models::quote;
use service::booking::{
    BookingAggregate, CancelBookingInput, ConfirmBookingInput, CreateBookingInput, EditBookingInput, IssueQuoteInput,
    RejectBookingInput, RequestChangeInput,
};

use crate::errors::JsonApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<BookingStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create).get(list))
        .route("/bookings/:id", get(get_one).patch(edit))
        .route("/bookings/:id/confirm", post(confirm))
        .route("/bookings/:id/reject", post(reject))
        .route("/bookings/:id/cancel", post(cancel))
        .route("/bookings/:id/complete", post(complete))
        .route("/bookings/:id/change-requests", post(request_change))
        .route("/bookings/:id/quotes", post(issue_quote))
}

#[utoipa::path(post, path = "/bookings", tag = "bookings", request_body = crate::openapi::CreateBookingRequest, responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthenticated")))]
pub async fn create(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Json(input): Json<CreateBookingInput>,
) -> Result<(StatusCode, Json<booking::Model>), JsonApiError> {
    let b = state.bookings.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(b)))
}

#[utoipa::path(get, path = "/bookings", tag = "bookings", params(("status" = Option<String>, Query, description = "PENDING, CONFIRMED, REJECTED, COMPLETED or CANCELLED")), responses((status = 200, description = "Bookings visible to the caller")))]
pub async fn list(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<booking::Model>>, JsonApiError> {
    Ok(Json(state.bookings.list(&actor, q.status).await?))
}

#[utoipa::path(get, path = "/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), responses((status = 200, description = "Booking aggregate"), (status = 404, description = "Not Found")))]
pub async fn get_one(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingAggregate>, JsonApiError> {
    Ok(Json(state.bookings.get(&actor, id).await?))
}

#[utoipa::path(patch, path = "/bookings/{id}", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::EditBookingRequest, responses((status = 200, description = "Edited"), (status = 409, description = "Not PENDING")))]
pub async fn edit(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<EditBookingInput>,
) -> Result<Json<booking::Model>, JsonApiError> {
    Ok(Json(state.bookings.edit(&actor, id, input).await?))
}

#[utoipa::path(post, path = "/bookings/{id}/confirm", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::ConfirmBookingRequest, responses((status = 200, description = "Confirmed"), (status = 409, description = "Invalid transition")))]
pub async fn confirm(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<ConfirmBookingInput>,
) -> Result<Json<BookingAggregate>, JsonApiError> {
    Ok(Json(state.bookings.confirm(&actor, id, input).await?))
}

#[utoipa::path(post, path = "/bookings/{id}/reject", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::ReasonRequest, responses((status = 200, description = "Rejected"), (status = 409, description = "Invalid transition")))]
pub async fn reject(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<RejectBookingInput>,
) -> Result<Json<booking::Model>, JsonApiError> {
    Ok(Json(state.bookings.reject(&actor, id, input).await?))
}

#[utoipa::path(post, path = "/bookings/{id}/cancel", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::ReasonRequest, responses((status = 200, description = "Cancelled"), (status = 409, description = "Invalid transition")))]
pub async fn cancel(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    input: Option<Json<CancelBookingInput>>,
) -> Result<Json<booking::Model>, JsonApiError> {
    let input = input.map(|Json(i)| i).unwrap_or_default();
    Ok(Json(state.bookings.cancel(&actor, id, input).await?))
}

#[utoipa::path(post, path = "/bookings/{id}/complete", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), responses((status = 200, description = "Completed"), (status = 409, description = "Invalid transition")))]
pub async fn complete(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<booking::Model>, JsonApiError> {
    Ok(Json(state.bookings.complete(&actor, id).await?))
}

#[utoipa::path(post, path = "/bookings/{id}/change-requests", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::ChangeRequestRequest, responses((status = 201, description = "Requested"), (status = 409, description = "Already pending")))]
pub async fn request_change(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<RequestChangeInput>,
) -> Result<(StatusCode, Json<change_request::Model>), JsonApiError> {
    let cr = state.bookings.request_change(&actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(cr)))
}

#[utoipa::path(post, path = "/bookings/{id}/quotes", tag = "bookings", params(("id" = Uuid, Path, description = "Booking id")), request_body = crate::openapi::QuoteRequest, responses((status = 201, description = "Issued"), (status = 409, description = "Open quote exists")))]
pub async fn issue_quote(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<IssueQuoteInput>,
) -> Result<(StatusCode, Json<quote::Model>), JsonApiError> {
    let q = state.bookings.issue_quote(&actor, id, input).await?;
    Ok((StatusCode::CREATED, Json(q)))
}
