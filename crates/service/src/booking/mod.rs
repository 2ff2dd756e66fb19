//! Booking lifecycle engine: creation, confirmation, change requests,
//! quoting, billing and closure of a vehicle-service booking.

pub mod domain;
pub mod locks;
pub mod service;
pub mod state;

pub use domain::{
    AcceptedQuote, Actor, BookingAggregate, CancelBookingInput, ConfirmBookingInput, CreateBookingInput,
    EditBookingInput, IssueQuoteInput, RejectBookingInput, RequestChangeInput,
};
pub use service::{BookingConfig, BookingService};
