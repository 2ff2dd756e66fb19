//! In-memory [`Store`] for tests, doc examples and single-node runs.
//!
//! Every method works under one mutex, so compound writes are trivially
//! atomic. Failure injection hooks let tests exercise the retry and
//! notification-isolation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use models::{
    billing::{self, BillingStatus},
    booking,
    booking_change_request::{self as change_request, ChangeRequestStatus},
    booking_technician,
    notification,
    quote::{self, QuoteStatus},
    user::UserRole,
};

use super::repository::{BookingFilter, Store};
use crate::errors::ServiceError;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserRole>,
    bookings: HashMap<Uuid, booking::Model>,
    technicians: Vec<booking_technician::Model>,
    change_requests: Vec<change_request::Model>,
    quotes: Vec<quote::Model>,
    billings: Vec<billing::Model>,
    // insertion order, newest last
    notifications: Vec<notification::Model>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    transient_failures: AtomicU32,
    notifications_down: AtomicBool,
    directory_down: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Register a directory entry.
    pub fn add_user(&self, id: Uuid, role: UserRole) {
        if let Ok(mut st) = self.state.lock() {
            st.users.insert(id, role);
        }
    }

    /// Make the next `n` store calls fail with a transient error.
    pub fn fail_next(&self, n: u32) { self.transient_failures.store(n, Ordering::SeqCst); }

    /// Make notification inserts fail with a non-transient storage error.
    pub fn set_notifications_down(&self, down: bool) { self.notifications_down.store(down, Ordering::SeqCst); }

    /// Make role listings time out until switched back.
    pub fn set_directory_down(&self, down: bool) { self.directory_down.store(down, Ordering::SeqCst); }

    fn state(&self) -> Result<MutexGuard<'_, State>, ServiceError> {
        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ServiceError::Transient("simulated store timeout".into()));
        }
        self.state.lock().map_err(|_| ServiceError::Db("in-memory store poisoned".into()))
    }
}

fn apply_booking(st: &mut State, mut next: booking::Model, expected_version: i32) -> Result<booking::Model, ServiceError> {
    let current = st.bookings.get(&next.id).ok_or_else(|| ServiceError::not_found("booking"))?;
    if current.version != expected_version {
        return Err(ServiceError::Conflict(format!(
            "booking {} was modified concurrently (version {} != {})",
            next.id, current.version, expected_version
        )));
    }
    next.version = expected_version + 1;
    st.bookings.insert(next.id, next.clone());
    Ok(next)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn user_role(&self, user_id: Uuid) -> Result<Option<UserRole>, ServiceError> {
        Ok(self.state()?.users.get(&user_id).copied())
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<Uuid>, ServiceError> {
        if self.directory_down.load(Ordering::SeqCst) {
            return Err(ServiceError::Transient("user directory timed out".into()));
        }
        let st = self.state()?;
        let mut ids: Vec<Uuid> = st.users.iter().filter(|(_, r)| **r == role).map(|(id, _)| *id).collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<booking::Model>, ServiceError> {
        Ok(self.state()?.bookings.get(&id).cloned())
    }

    async fn create_booking(&self, booking: booking::Model) -> Result<booking::Model, ServiceError> {
        let mut st = self.state()?;
        if st.bookings.contains_key(&booking.id) {
            return Err(ServiceError::Conflict(format!("booking {} already exists", booking.id)));
        }
        st.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking(&self, booking: booking::Model, expected_version: i32) -> Result<booking::Model, ServiceError> {
        let mut st = self.state()?;
        apply_booking(&mut st, booking, expected_version)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<booking::Model>, ServiceError> {
        let st = self.state()?;
        let mut out: Vec<booking::Model> = st
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .filter(|b| {
                filter.technician_id.map_or(true, |t| {
                    st.technicians.iter().any(|a| a.booking_id == b.id && a.technician_id == t)
                })
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.created_at.cmp(&b.created_at)));
        Ok(out)
    }

    async fn confirm_booking(
        &self,
        booking: booking::Model,
        expected_version: i32,
        technicians: Vec<booking_technician::Model>,
    ) -> Result<(booking::Model, Vec<booking_technician::Model>), ServiceError> {
        let mut st = self.state()?;
        let updated = apply_booking(&mut st, booking, expected_version)?;
        for t in &technicians {
            let exists = st
                .technicians
                .iter()
                .any(|a| a.booking_id == t.booking_id && a.technician_id == t.technician_id);
            if !exists {
                st.technicians.push(t.clone());
            }
        }
        Ok((updated, technicians))
    }

    async fn list_technicians(&self, booking_id: Uuid) -> Result<Vec<booking_technician::Model>, ServiceError> {
        let st = self.state()?;
        Ok(st.technicians.iter().filter(|a| a.booking_id == booking_id).cloned().collect())
    }

    async fn get_change_request(&self, id: Uuid) -> Result<Option<change_request::Model>, ServiceError> {
        Ok(self.state()?.change_requests.iter().find(|c| c.id == id).cloned())
    }

    async fn create_change_request(&self, request: change_request::Model) -> Result<change_request::Model, ServiceError> {
        let mut st = self.state()?;
        let in_flight = st
            .change_requests
            .iter()
            .any(|c| c.booking_id == request.booking_id && c.status == ChangeRequestStatus::Pending);
        if in_flight {
            return Err(ServiceError::Conflict(format!(
                "booking {} already has a pending change request",
                request.booking_id
            )));
        }
        st.change_requests.push(request.clone());
        Ok(request)
    }

    async fn resolve_change_request(
        &self,
        request: change_request::Model,
        reschedule: Option<(booking::Model, i32)>,
    ) -> Result<(change_request::Model, Option<booking::Model>), ServiceError> {
        let mut st = self.state()?;
        let idx = st
            .change_requests
            .iter()
            .position(|c| c.id == request.id)
            .ok_or_else(|| ServiceError::not_found("change request"))?;
        if st.change_requests[idx].status != ChangeRequestStatus::Pending {
            return Err(ServiceError::Conflict(format!("change request {} already resolved", request.id)));
        }
        // check the booking version before touching anything
        if let Some((b, expected)) = &reschedule {
            let current = st.bookings.get(&b.id).ok_or_else(|| ServiceError::not_found("booking"))?;
            if current.version != *expected {
                return Err(ServiceError::Conflict(format!("booking {} was modified concurrently", b.id)));
            }
        }
        let booking = match reschedule {
            Some((b, expected)) => Some(apply_booking(&mut st, b, expected)?),
            None => None,
        };
        st.change_requests[idx] = request.clone();
        Ok((request, booking))
    }

    async fn list_change_requests(&self, booking_id: Uuid) -> Result<Vec<change_request::Model>, ServiceError> {
        let st = self.state()?;
        Ok(st.change_requests.iter().filter(|c| c.booking_id == booking_id).cloned().collect())
    }

    async fn get_quote(&self, id: Uuid) -> Result<Option<quote::Model>, ServiceError> {
        Ok(self.state()?.quotes.iter().find(|q| q.id == id).cloned())
    }

    async fn create_quote(&self, quote: quote::Model) -> Result<quote::Model, ServiceError> {
        let mut st = self.state()?;
        if st.quotes.iter().any(|q| q.booking_id == quote.booking_id && q.status.is_open()) {
            return Err(ServiceError::Conflict(format!("booking {} already has an open quote", quote.booking_id)));
        }
        st.quotes.push(quote.clone());
        Ok(quote)
    }

    async fn update_quote(&self, quote: quote::Model, expected_status: QuoteStatus) -> Result<quote::Model, ServiceError> {
        let mut st = self.state()?;
        let slot = st
            .quotes
            .iter_mut()
            .find(|q| q.id == quote.id)
            .ok_or_else(|| ServiceError::not_found("quote"))?;
        if slot.status != expected_status {
            return Err(ServiceError::Conflict(format!("quote {} is {} not {}", quote.id, slot.status, expected_status)));
        }
        *slot = quote.clone();
        Ok(quote)
    }

    async fn approve_quote(
        &self,
        quote: quote::Model,
        billing: billing::Model,
    ) -> Result<(quote::Model, billing::Model), ServiceError> {
        let mut st = self.state()?;
        let idx = st
            .quotes
            .iter()
            .position(|q| q.id == quote.id)
            .ok_or_else(|| ServiceError::not_found("quote"))?;
        if st.quotes[idx].status != QuoteStatus::Pending {
            return Err(ServiceError::Conflict(format!("quote {} already {}", quote.id, st.quotes[idx].status)));
        }
        if st.billings.iter().any(|b| b.quote_id == quote.id) {
            return Err(ServiceError::Conflict(format!("quote {} already billed", quote.id)));
        }
        st.quotes[idx] = quote.clone();
        st.billings.push(billing.clone());
        Ok((quote, billing))
    }

    async fn list_quotes(&self, booking_id: Uuid) -> Result<Vec<quote::Model>, ServiceError> {
        let st = self.state()?;
        Ok(st.quotes.iter().filter(|q| q.booking_id == booking_id).cloned().collect())
    }

    async fn get_billing(&self, id: Uuid) -> Result<Option<billing::Model>, ServiceError> {
        Ok(self.state()?.billings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_billing_by_quote(&self, quote_id: Uuid) -> Result<Option<billing::Model>, ServiceError> {
        Ok(self.state()?.billings.iter().find(|b| b.quote_id == quote_id).cloned())
    }

    async fn update_billing(&self, billing: billing::Model, expected_status: BillingStatus) -> Result<billing::Model, ServiceError> {
        let mut st = self.state()?;
        let slot = st
            .billings
            .iter_mut()
            .find(|b| b.id == billing.id)
            .ok_or_else(|| ServiceError::not_found("billing"))?;
        if slot.status != expected_status {
            return Err(ServiceError::Conflict(format!("billing {} is {} not {}", billing.id, slot.status, expected_status)));
        }
        *slot = billing.clone();
        Ok(billing)
    }

    async fn list_billings(&self, booking_id: Uuid) -> Result<Vec<billing::Model>, ServiceError> {
        let st = self.state()?;
        Ok(st.billings.iter().filter(|b| b.booking_id == booking_id).cloned().collect())
    }

    async fn create_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError> {
        if self.notifications_down.load(Ordering::SeqCst) {
            return Err(ServiceError::Db("notification table unavailable".into()));
        }
        let mut st = self.state()?;
        st.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn get_notification(&self, id: Uuid) -> Result<Option<notification::Model>, ServiceError> {
        Ok(self.state()?.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn update_notification(&self, notification: notification::Model) -> Result<notification::Model, ServiceError> {
        let mut st = self.state()?;
        let slot = st
            .notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
            .ok_or_else(|| ServiceError::not_found("notification"))?;
        *slot = notification.clone();
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<notification::Model>, ServiceError> {
        let st = self.state()?;
        Ok(st.notifications.iter().rev().filter(|n| n.user_id == user_id).cloned().collect())
    }
}
