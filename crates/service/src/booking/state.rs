//! Transition tables. Anything not listed here is an invalid transition.

use models::{
    billing::BillingStatus,
    booking::BookingStatus,
    booking_change_request::ChangeRequestStatus,
    quote::QuoteStatus,
};

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Confirm,
    Reject,
    Edit,
    RequestChange,
    ResolveChange,
    IssueQuote,
    SettleQuote,
    Complete,
    Cancel,
}

impl BookingEvent {
    pub const ALL: [BookingEvent; 9] = [
        BookingEvent::Confirm,
        BookingEvent::Reject,
        BookingEvent::Edit,
        BookingEvent::RequestChange,
        BookingEvent::ResolveChange,
        BookingEvent::IssueQuote,
        BookingEvent::SettleQuote,
        BookingEvent::Complete,
        BookingEvent::Cancel,
    ];

    pub fn action(&self) -> &'static str {
        match self {
            BookingEvent::Confirm => "confirm",
            BookingEvent::Reject => "reject",
            BookingEvent::Edit => "edit",
            BookingEvent::RequestChange => "request change for",
            BookingEvent::ResolveChange => "resolve change for",
            BookingEvent::IssueQuote => "issue quote for",
            BookingEvent::SettleQuote => "settle quote for",
            BookingEvent::Complete => "complete",
            BookingEvent::Cancel => "cancel",
        }
    }
}

pub fn next_status(from: BookingStatus, event: BookingEvent) -> Option<BookingStatus> {
    use BookingEvent as E;
    use BookingStatus as S;
    match (from, event) {
        (S::Pending, E::Confirm) => Some(S::Confirmed),
        (S::Pending, E::Reject) => Some(S::Rejected),
        (S::Pending, E::Edit) => Some(S::Pending),
        (S::Confirmed, E::RequestChange | E::ResolveChange | E::IssueQuote | E::SettleQuote) => Some(S::Confirmed),
        (S::Confirmed, E::Complete) => Some(S::Completed),
        (S::Pending | S::Confirmed, E::Cancel) => Some(S::Cancelled),
        _ => None,
    }
}

pub fn ensure_booking(from: BookingStatus, event: BookingEvent) -> Result<BookingStatus, ServiceError> {
    next_status(from, event).ok_or_else(|| ServiceError::invalid_transition("booking", from, event.action()))
}

/// Accepting twice is a conflict; accepting a rejected quote is not a transition at all.
pub fn ensure_quote_acceptable(status: QuoteStatus) -> Result<(), ServiceError> {
    match status {
        QuoteStatus::Pending => Ok(()),
        QuoteStatus::Approved => Err(ServiceError::Conflict("quote already accepted".into())),
        QuoteStatus::Rejected => Err(ServiceError::invalid_transition("quote", status, "accept")),
    }
}

pub fn ensure_quote_rejectable(status: QuoteStatus) -> Result<(), ServiceError> {
    match status {
        QuoteStatus::Pending => Ok(()),
        _ => Err(ServiceError::invalid_transition("quote", status, "reject")),
    }
}

pub fn ensure_change_pending(status: ChangeRequestStatus, action: &'static str) -> Result<(), ServiceError> {
    match status {
        ChangeRequestStatus::Pending => Ok(()),
        _ => Err(ServiceError::invalid_transition("change request", status, action)),
    }
}

pub fn ensure_billing_unpaid(status: BillingStatus) -> Result<(), ServiceError> {
    match status {
        BillingStatus::Unpaid => Ok(()),
        BillingStatus::Paid => Err(ServiceError::invalid_transition("billing", status, "mark paid")),
    }
}
