//! Booking lifecycle service layer.
//! - `store`: persistence boundary (`Store` trait, in-memory and sea-orm implementations).
//! - `notifications`: per-user notification records.
//! - `booking`: the lifecycle engine and its transition rules.
//! - Reuses entity definitions and field validation from the `models` crate.

pub mod errors;
pub mod retry;
pub mod store;
pub mod notifications;
pub mod booking;
#[cfg(test)]
pub mod test_support;
