//! Notification events: per-user records with read tracking.

pub mod emitter;

pub use emitter::{FailedNotification, NotificationEmitter};
