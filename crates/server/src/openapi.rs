use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct CountResponse { pub count: usize }

#[derive(ToSchema)]
pub struct ServicePreferencesDoc {
    pub preferred_technician_id: Option<Uuid>,
    pub need_extra_filter: bool,
    pub notes_for_tech: Option<String>,
}

/// Exactly one of `service_id` and `pack_id`.
#[derive(ToSchema)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub service_id: Option<Uuid>,
    pub pack_id: Option<Uuid>,
    /// RFC 3339 timestamp
    pub scheduled_at: String,
    pub customer_notes: Option<String>,
    pub service_preferences: Option<ServicePreferencesDoc>,
}

#[derive(ToSchema)]
pub struct EditBookingRequest {
    pub customer_notes: Option<String>,
    pub service_preferences: Option<ServicePreferencesDoc>,
}

#[derive(ToSchema)]
pub struct ConfirmBookingRequest {
    pub technician_ids: Vec<Uuid>,
    pub multi_assign: Option<bool>,
    pub scheduled_at: Option<String>,
}

#[derive(ToSchema)]
pub struct ReasonRequest { pub reason: Option<String> }

#[derive(ToSchema)]
pub struct ChangeRequestRequest { pub requested_at: String }

/// Amount in minor currency units.
#[derive(ToSchema)]
pub struct QuoteRequest { pub amount: i64 }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::bookings::create,
        crate::routes::bookings::list,
        crate::routes::bookings::get_one,
        crate::routes::bookings::edit,
        crate::routes::bookings::confirm,
        crate::routes::bookings::reject,
        crate::routes::bookings::cancel,
        crate::routes::bookings::complete,
        crate::routes::bookings::request_change,
        crate::routes::bookings::issue_quote,
        crate::routes::settlement::approve_change,
        crate::routes::settlement::deny_change,
        crate::routes::settlement::accept_quote,
        crate::routes::settlement::reject_quote,
        crate::routes::settlement::pay_billing,
        crate::routes::notifications::list,
        crate::routes::notifications::unread_count,
        crate::routes::notifications::read,
        crate::routes::notifications::read_all,
    ),
    components(
        schemas(
            HealthResponse,
            CountResponse,
            ServicePreferencesDoc,
            CreateBookingRequest,
            EditBookingRequest,
            ConfirmBookingRequest,
            ReasonRequest,
            ChangeRequestRequest,
            QuoteRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "bookings"),
        (name = "settlement"),
        (name = "notifications")
    )
)]
pub struct ApiDoc;
