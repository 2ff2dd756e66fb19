use std::sync::Arc;

use service::booking::{BookingConfig, BookingService};
use service::notifications::NotificationEmitter;
use service::store::Store;

/// Shared handler state; the store behind it is picked at startup.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService<dyn Store>>,
    pub notifications: Arc<NotificationEmitter<dyn Store>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cfg: BookingConfig) -> Self {
        let notifications = Arc::new(NotificationEmitter::new(store.clone(), cfg.retry.clone()));
        let bookings = Arc::new(BookingService::new(store, notifications.clone(), cfg));
        Self { bookings, notifications }
    }
}
