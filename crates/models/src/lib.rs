//! Persistent entities of the booking lifecycle.
//!
//! Each module holds one sea-orm entity plus the field validations shared by
//! every store implementation.

pub mod errors;
pub mod db;
pub mod user;
pub mod booking;
pub mod booking_technician;
pub mod booking_change_request;
pub mod quote;
pub mod billing;
pub mod notification;

#[cfg(test)]
mod tests;
