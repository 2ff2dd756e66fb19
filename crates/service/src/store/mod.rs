//! Store adapter: persistence boundary of the booking lifecycle.
//!
//! The engine only talks to [`Store`]; `memory` backs tests and single-node
//! runs, `seaorm` backs Postgres.

pub mod repository;
pub mod memory;
pub mod seaorm;

pub use repository::{BookingFilter, Store};
