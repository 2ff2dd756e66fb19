use async_trait::async_trait;
use uuid::Uuid;

use models::{
    billing::{self, BillingStatus},
    booking::{self, BookingStatus},
    booking_change_request as change_request,
    booking_technician,
    notification,
    quote::{self, QuoteStatus},
    user::UserRole,
};

use crate::errors::ServiceError;

/// Selection for [`Store::list_bookings`]; unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, b: &booking::Model) -> bool {
        self.customer_id.map_or(true, |c| b.customer_id == c) && self.status.map_or(true, |s| b.status == s)
    }
}

/// Repository abstraction for lifecycle persistence.
///
/// Writes that must not be split are exposed as single methods
/// (`confirm_booking`, `resolve_change_request`, `approve_quote`).
/// Conditional writes take the state the caller read and fail with
/// [`ServiceError::Conflict`] when the stored record moved on.
#[async_trait]
pub trait Store: Send + Sync {
    // user directory (read-only)
    async fn user_role(&self, user_id: Uuid) -> Result<Option<UserRole>, ServiceError>;
    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<Uuid>, ServiceError>;

    // bookings
    async fn get_booking(&self, id: Uuid) -> Result<Option<booking::Model>, ServiceError>;
    async fn create_booking(&self, booking: booking::Model) -> Result<booking::Model, ServiceError>;
    /// Store `booking` when the persisted version equals `expected_version`; the stored copy gets `expected_version + 1`.
    async fn update_booking(&self, booking: booking::Model, expected_version: i32) -> Result<booking::Model, ServiceError>;
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<booking::Model>, ServiceError>;
    /// Versioned booking update plus technician assignment, all or nothing.
    async fn confirm_booking(
        &self,
        booking: booking::Model,
        expected_version: i32,
        technicians: Vec<booking_technician::Model>,
    ) -> Result<(booking::Model, Vec<booking_technician::Model>), ServiceError>;
    async fn list_technicians(&self, booking_id: Uuid) -> Result<Vec<booking_technician::Model>, ServiceError>;

    // change requests
    async fn get_change_request(&self, id: Uuid) -> Result<Option<change_request::Model>, ServiceError>;
    /// Conflict when the booking already has a PENDING request.
    async fn create_change_request(&self, request: change_request::Model) -> Result<change_request::Model, ServiceError>;
    /// Store a resolved request (the stored one must still be PENDING) and optionally the rescheduled booking.
    async fn resolve_change_request(
        &self,
        request: change_request::Model,
        reschedule: Option<(booking::Model, i32)>,
    ) -> Result<(change_request::Model, Option<booking::Model>), ServiceError>;
    async fn list_change_requests(&self, booking_id: Uuid) -> Result<Vec<change_request::Model>, ServiceError>;

    // quotes
    async fn get_quote(&self, id: Uuid) -> Result<Option<quote::Model>, ServiceError>;
    /// Conflict when the booking already has a non-REJECTED quote.
    async fn create_quote(&self, quote: quote::Model) -> Result<quote::Model, ServiceError>;
    async fn update_quote(&self, quote: quote::Model, expected_status: QuoteStatus) -> Result<quote::Model, ServiceError>;
    /// Store the APPROVED quote and insert its billing atomically; Conflict unless the stored quote is PENDING.
    async fn approve_quote(
        &self,
        quote: quote::Model,
        billing: billing::Model,
    ) -> Result<(quote::Model, billing::Model), ServiceError>;
    async fn list_quotes(&self, booking_id: Uuid) -> Result<Vec<quote::Model>, ServiceError>;

    // billings
    async fn get_billing(&self, id: Uuid) -> Result<Option<billing::Model>, ServiceError>;
    async fn find_billing_by_quote(&self, quote_id: Uuid) -> Result<Option<billing::Model>, ServiceError>;
    async fn update_billing(&self, billing: billing::Model, expected_status: BillingStatus) -> Result<billing::Model, ServiceError>;
    async fn list_billings(&self, booking_id: Uuid) -> Result<Vec<billing::Model>, ServiceError>;

    // notifications
    async fn create_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError>;
    async fn get_notification(&self, id: Uuid) -> Result<Option<notification::Model>, ServiceError>;
    async fn update_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError>;
    /// Newest first.
    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<notification::Model>, ServiceError>;
}
