use std::sync::Arc;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{
    billing::{self, BillingStatus},
    booking::{self, BookingStatus},
    booking_change_request::{self as change_request, ChangeRequestStatus},
    booking_technician,
    quote::{self, QuoteStatus},
    user::UserRole,
};

use super::domain::{
    AcceptedQuote, Actor, BookingAggregate, CancelBookingInput, ConfirmBookingInput, CreateBookingInput,
    EditBookingInput, IssueQuoteInput, RejectBookingInput, RequestChangeInput,
};
use super::locks::BookingLocks;
use super::state::{self, BookingEvent};
use crate::errors::ServiceError;
use crate::notifications::NotificationEmitter;
use crate::retry::RetryPolicy;
use crate::store::{BookingFilter, Store};

/// Booking engine configuration
#[derive(Clone, Debug, Default)]
pub struct BookingConfig {
    /// Completion waits for a PAID billing.
    pub require_paid_billing: bool,
    pub retry: RetryPolicy,
}

impl BookingConfig {
    pub fn from_app(cfg: &configs::AppConfig) -> Self {
        Self {
            require_paid_billing: cfg.lifecycle.require_paid_billing,
            retry: RetryPolicy::from_config(&cfg.retry),
        }
    }
}

fn now() -> DateTimeWithTimeZone { Utc::now().fixed_offset() }

fn require_role(actor: &Actor, allowed: &[UserRole], action: &str) -> Result<(), ServiceError> {
    if allowed.contains(&actor.role) {
        return Ok(());
    }
    Err(ServiceError::Unauthorized(format!("{} may not {}", actor.role, action)))
}

fn require_owner(actor: &Actor, b: &booking::Model) -> Result<(), ServiceError> {
    if b.customer_id != actor.user_id {
        return Err(ServiceError::Unauthorized(format!("booking {} belongs to another customer", b.id)));
    }
    Ok(())
}

/// Booking lifecycle engine. Owns the state machine; every mutation runs
/// under the booking's lock and goes through a versioned store write.
/// Notifications go out after the lock is released.
pub struct BookingService<S: Store + ?Sized> {
    store: Arc<S>,
    notifier: Arc<NotificationEmitter<S>>,
    locks: BookingLocks,
    cfg: BookingConfig,
}

impl<S: Store + ?Sized> BookingService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<NotificationEmitter<S>>, cfg: BookingConfig) -> Self {
        Self { store, notifier, locks: BookingLocks::new(), cfg }
    }

    pub fn notifier(&self) -> &Arc<NotificationEmitter<S>> { &self.notifier }

    /// Look the caller up in the user directory.
    pub async fn resolve_actor(&self, user_id: Uuid) -> Result<Actor, ServiceError> {
        let store = &self.store;
        let role = self.cfg.retry.run("user_role", move || store.user_role(user_id)).await?;
        role.map(|role| Actor::new(user_id, role))
            .ok_or_else(|| ServiceError::Unauthorized(format!("unknown user {user_id}")))
    }

    async fn load_booking(&self, id: Uuid) -> Result<booking::Model, ServiceError> {
        let store = &self.store;
        self.cfg
            .retry
            .run("get_booking", move || store.get_booking(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("booking"))
    }

    async fn technician_ids(&self, booking_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let store = &self.store;
        let techs = self.cfg.retry.run("list_technicians", move || store.list_technicians(booking_id)).await?;
        Ok(techs.into_iter().map(|t| t.technician_id).collect())
    }

    async fn admin_ids(&self) -> Result<Vec<Uuid>, ServiceError> {
        let store = &self.store;
        self.cfg.retry.run("list_admins", move || store.list_users_by_role(UserRole::Admin)).await
    }

    async fn save_booking(&self, b: booking::Model, expected_version: i32) -> Result<booking::Model, ServiceError> {
        let store = &self.store;
        self.cfg
            .retry
            .run("update_booking", move || store.update_booking(b.clone(), expected_version))
            .await
    }

    /// Technicians may only act on bookings they are assigned to.
    fn require_assigned(actor: &Actor, technicians: &[Uuid]) -> Result<(), ServiceError> {
        if actor.is_technician() && !technicians.contains(&actor.user_id) {
            return Err(ServiceError::Unauthorized("technician not assigned to booking".into()));
        }
        Ok(())
    }

    /// Create a PENDING booking for the calling customer.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::booking::{BookingService, BookingConfig, Actor, CreateBookingInput};
    /// use service::notifications::NotificationEmitter;
    /// use service::retry::RetryPolicy;
    /// use service::store::memory::InMemoryStore;
    /// use models::{booking::{BookingStatus, ServicePreferences}, user::UserRole};
    /// let store = Arc::new(InMemoryStore::new());
    /// let notifier = Arc::new(NotificationEmitter::new(store.clone(), RetryPolicy::none()));
    /// let svc = BookingService::new(store, notifier, BookingConfig::default());
    /// let customer = Actor::new(uuid::Uuid::new_v4(), UserRole::Customer);
    /// let input = CreateBookingInput {
    ///     car_id: uuid::Uuid::new_v4(),
    ///     service_id: Some(uuid::Uuid::new_v4()),
    ///     pack_id: None,
    ///     scheduled_at: chrono::Utc::now().fixed_offset(),
    ///     customer_notes: None,
    ///     service_preferences: ServicePreferences::default(),
    /// };
    /// let b = tokio_test::block_on(svc.create(&customer, input)).unwrap();
    /// assert_eq!(b.status, BookingStatus::Pending);
    /// assert_eq!(b.version, 1);
    /// ```
    #[instrument(skip(self, input), fields(actor = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, input: CreateBookingInput) -> Result<booking::Model, ServiceError> {
        input.validate()?;
        require_role(actor, &[UserRole::Customer], "create bookings")?;
        let ts = now();
        let record = booking::Model {
            id: Uuid::new_v4(),
            customer_id: actor.user_id,
            car_id: input.car_id,
            service_id: input.service_id,
            pack_id: input.pack_id,
            scheduled_at: input.scheduled_at,
            status: BookingStatus::Pending,
            customer_notes: input.customer_notes,
            service_preferences: input.service_preferences,
            version: 1,
            created_at: ts,
            updated_at: ts,
        };
        let store = &self.store;
        let created = self
            .cfg
            .retry
            .run("create_booking", move || store.create_booking(record.clone()))
            .await?;
        info!(booking_id = %created.id, customer_id = %created.customer_id, "booking_created");
        Ok(created)
    }

    /// Booking plus technicians, change requests, quotes and billings.
    #[instrument(skip(self), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<BookingAggregate, ServiceError> {
        let booking = self.load_booking(id).await?;
        let store = &self.store;
        let technicians = self.cfg.retry.run("list_technicians", move || store.list_technicians(id)).await?;
        let visible = match actor.role {
            UserRole::Admin => true,
            UserRole::Customer => booking.customer_id == actor.user_id,
            UserRole::Technician => technicians.iter().any(|t| t.technician_id == actor.user_id),
        };
        if !visible {
            return Err(ServiceError::Unauthorized(format!("booking {id} not visible to caller")));
        }
        let change_requests = self.cfg.retry.run("list_change_requests", move || store.list_change_requests(id)).await?;
        let quotes = self.cfg.retry.run("list_quotes", move || store.list_quotes(id)).await?;
        let billings = self.cfg.retry.run("list_billings", move || store.list_billings(id)).await?;
        Ok(BookingAggregate { booking, technicians, change_requests, quotes, billings })
    }

    /// Customers see their own bookings, technicians their assignments, admins everything.
    pub async fn list(&self, actor: &Actor, status: Option<BookingStatus>) -> Result<Vec<booking::Model>, ServiceError> {
        let mut filter = BookingFilter { status, ..Default::default() };
        match actor.role {
            UserRole::Customer => filter.customer_id = Some(actor.user_id),
            UserRole::Technician => filter.technician_id = Some(actor.user_id),
            UserRole::Admin => {}
        }
        let store = &self.store;
        let filter = &filter;
        self.cfg.retry.run("list_bookings", move || store.list_bookings(filter)).await
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn edit(&self, actor: &Actor, id: Uuid, input: EditBookingInput) -> Result<booking::Model, ServiceError> {
        input.validate()?;
        require_role(actor, &[UserRole::Customer], "edit bookings")?;
        let _guard = self.locks.acquire(id).await;
        let mut b = self.load_booking(id).await?;
        require_owner(actor, &b)?;
        state::ensure_booking(b.status, BookingEvent::Edit)?;
        // 空白备注即清除
        if let Some(notes) = input.customer_notes {
            b.customer_notes = Some(notes).filter(|n| !n.trim().is_empty());
        }
        if let Some(prefs) = input.service_preferences {
            b.service_preferences = prefs;
        }
        b.updated_at = now();
        let version = b.version;
        let saved = self.save_booking(b, version).await?;
        info!(version = saved.version, "booking_edited");
        Ok(saved)
    }

    /// Admin confirms a PENDING booking and assigns technicians; the first one is primary.
    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id, technicians = input.technician_ids.len()))]
    pub async fn confirm(&self, actor: &Actor, id: Uuid, input: ConfirmBookingInput) -> Result<BookingAggregate, ServiceError> {
        input.validate()?;
        require_role(actor, &[UserRole::Admin], "confirm bookings")?;
        for tech in &input.technician_ids {
            let store = &self.store;
            let tech = *tech;
            let role = self.cfg.retry.run("user_role", move || store.user_role(tech)).await?;
            if role != Some(UserRole::Technician) {
                return Err(ServiceError::Validation(format!("user {tech} is not a technician")));
            }
        }

        let guard = self.locks.acquire(id).await;
        let mut b = self.load_booking(id).await?;
        b.status = state::ensure_booking(b.status, BookingEvent::Confirm)?;
        if let Some(at) = input.scheduled_at {
            b.scheduled_at = at;
        }
        let ts = now();
        b.updated_at = ts;
        let assignments: Vec<booking_technician::Model> = input
            .technician_ids
            .iter()
            .enumerate()
            .map(|(i, tech)| booking_technician::Model {
                booking_id: id,
                technician_id: *tech,
                is_primary: i == 0,
                assigned_at: ts,
            })
            .collect();
        let version = b.version;
        let store = &self.store;
        let (booking, technicians) = self
            .cfg
            .retry
            .run("confirm_booking", move || store.confirm_booking(b.clone(), version, assignments.clone()))
            .await?;
        drop(guard);
        info!(version = booking.version, "booking_confirmed");

        let when = booking.scheduled_at.to_rfc3339();
        self.notifier
            .notify_all(
                actor.user_id,
                vec![booking.customer_id],
                "Booking confirmed",
                &format!("Your booking {} is confirmed for {}", booking.id, when),
            )
            .await;
        self.notifier
            .notify_all(
                actor.user_id,
                input.technician_ids.clone(),
                "New assignment",
                &format!("You are assigned to booking {} on {}", booking.id, when),
            )
            .await;
        Ok(BookingAggregate { booking, technicians, change_requests: vec![], quotes: vec![], billings: vec![] })
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn reject(&self, actor: &Actor, id: Uuid, input: RejectBookingInput) -> Result<booking::Model, ServiceError> {
        input.validate()?;
        require_role(actor, &[UserRole::Admin], "reject bookings")?;
        let guard = self.locks.acquire(id).await;
        let mut b = self.load_booking(id).await?;
        b.status = state::ensure_booking(b.status, BookingEvent::Reject)?;
        b.updated_at = now();
        let version = b.version;
        let saved = self.save_booking(b, version).await?;
        drop(guard);
        self.locks.forget(id);
        info!(reason = %input.reason, "booking_rejected");

        self.notifier
            .notify_all(
                actor.user_id,
                vec![saved.customer_id],
                "Booking rejected",
                &format!("Your booking {} was rejected: {}", saved.id, input.reason.trim()),
            )
            .await;
        Ok(saved)
    }

    /// Owning customer or admin cancels a PENDING or CONFIRMED booking.
    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn cancel(&self, actor: &Actor, id: Uuid, input: CancelBookingInput) -> Result<booking::Model, ServiceError> {
        require_role(actor, &[UserRole::Customer, UserRole::Admin], "cancel bookings")?;
        let guard = self.locks.acquire(id).await;
        let mut b = self.load_booking(id).await?;
        if actor.is_customer() {
            require_owner(actor, &b)?;
        }
        b.status = state::ensure_booking(b.status, BookingEvent::Cancel)?;
        // Recipients resolve before the write; nothing after it may fail.
        let mut recipients = if actor.is_customer() { self.admin_ids().await? } else { vec![b.customer_id] };
        recipients.extend(self.technician_ids(id).await?);
        b.updated_at = now();
        let version = b.version;
        let saved = self.save_booking(b, version).await?;
        drop(guard);
        self.locks.forget(id);
        info!(by = %actor.role, "booking_cancelled");

        let reason = input.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let message = match reason {
            Some(r) => format!("Booking {} was cancelled by the {}: {}", saved.id, actor.role, r),
            None => format!("Booking {} was cancelled by the {}", saved.id, actor.role),
        };
        self.notifier.notify_all(actor.user_id, recipients, "Booking cancelled", &message).await;
        Ok(saved)
    }

    /// Admin or an assigned technician completes a CONFIRMED booking.
    #[instrument(skip(self), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn complete(&self, actor: &Actor, id: Uuid) -> Result<booking::Model, ServiceError> {
        require_role(actor, &[UserRole::Admin, UserRole::Technician], "complete bookings")?;
        let guard = self.locks.acquire(id).await;
        let mut b = self.load_booking(id).await?;
        let technicians = self.technician_ids(id).await?;
        Self::require_assigned(actor, &technicians)?;
        b.status = state::ensure_booking(b.status, BookingEvent::Complete)?;
        if self.cfg.require_paid_billing {
            let store = &self.store;
            let billings = self.cfg.retry.run("list_billings", move || store.list_billings(id)).await?;
            if !billings.iter().any(|bl| bl.status == BillingStatus::Paid) {
                let from = if billings.is_empty() { "NONE" } else { BillingStatus::Unpaid.as_str() };
                return Err(ServiceError::invalid_transition("billing", from, "complete booking with"));
            }
        }
        b.updated_at = now();
        let version = b.version;
        let saved = self.save_booking(b, version).await?;
        drop(guard);
        self.locks.forget(id);
        info!("booking_completed");

        self.notifier
            .notify_all(
                actor.user_id,
                vec![saved.customer_id],
                "Booking completed",
                &format!("Service for booking {} is complete", saved.id),
            )
            .await;
        Ok(saved)
    }

    /// Customer asks to move a CONFIRMED booking; one PENDING request at a time.
    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id))]
    pub async fn request_change(
        &self,
        actor: &Actor,
        id: Uuid,
        input: RequestChangeInput,
    ) -> Result<change_request::Model, ServiceError> {
        let ts = now();
        input.validate(ts)?;
        require_role(actor, &[UserRole::Customer], "request changes")?;
        let guard = self.locks.acquire(id).await;
        let b = self.load_booking(id).await?;
        require_owner(actor, &b)?;
        state::ensure_booking(b.status, BookingEvent::RequestChange)?;
        let mut recipients = self.admin_ids().await?;
        recipients.extend(self.technician_ids(id).await?);
        let request = change_request::Model {
            id: Uuid::new_v4(),
            booking_id: id,
            requested_at: input.requested_at,
            status: ChangeRequestStatus::Pending,
            created_at: ts,
            resolved_at: None,
        };
        let store = &self.store;
        let created = self
            .cfg
            .retry
            .run("create_change_request", move || store.create_change_request(request.clone()))
            .await?;
        drop(guard);
        info!(change_request_id = %created.id, "change_requested");

        self.notifier
            .notify_all(
                actor.user_id,
                recipients,
                "Change requested",
                &format!("Booking {} asks to move to {}", id, created.requested_at.to_rfc3339()),
            )
            .await;
        Ok(created)
    }

    async fn load_change_request(&self, id: Uuid) -> Result<change_request::Model, ServiceError> {
        let store = &self.store;
        self.cfg
            .retry
            .run("get_change_request", move || store.get_change_request(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("change request"))
    }

    /// Admin approves a PENDING change request; the booking moves to the requested time.
    #[instrument(skip(self), fields(actor = %actor.user_id, change_request_id = %id))]
    pub async fn approve_change(&self, actor: &Actor, id: Uuid) -> Result<change_request::Model, ServiceError> {
        require_role(actor, &[UserRole::Admin], "approve changes")?;
        let booking_id = self.load_change_request(id).await?.booking_id;
        let guard = self.locks.acquire(booking_id).await;
        let mut request = self.load_change_request(id).await?;
        let mut b = self.load_booking(booking_id).await?;
        state::ensure_booking(b.status, BookingEvent::ResolveChange)?;
        state::ensure_change_pending(request.status, "approve")?;
        let technicians = self.technician_ids(booking_id).await?;
        let ts = now();
        request.status = ChangeRequestStatus::Approved;
        request.resolved_at = Some(ts);
        b.scheduled_at = request.requested_at;
        b.updated_at = ts;
        let version = b.version;
        let store = &self.store;
        let (resolved, booking) = self
            .cfg
            .retry
            .run("resolve_change_request", move || {
                store.resolve_change_request(request.clone(), Some((b.clone(), version)))
            })
            .await?;
        drop(guard);
        info!(booking_id = %booking_id, "change_approved");

        let customer_id = booking.as_ref().map(|b| b.customer_id);
        let when = resolved.requested_at.to_rfc3339();
        if let Some(customer_id) = customer_id {
            self.notifier
                .notify_all(
                    actor.user_id,
                    vec![customer_id],
                    "Change approved",
                    &format!("Booking {booking_id} is moved to {when}"),
                )
                .await;
        }
        self.notifier
            .notify_all(
                actor.user_id,
                technicians,
                "Booking rescheduled",
                &format!("Booking {booking_id} is moved to {when}"),
            )
            .await;
        Ok(resolved)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id, change_request_id = %id))]
    pub async fn deny_change(&self, actor: &Actor, id: Uuid) -> Result<change_request::Model, ServiceError> {
        require_role(actor, &[UserRole::Admin], "deny changes")?;
        let booking_id = self.load_change_request(id).await?.booking_id;
        let guard = self.locks.acquire(booking_id).await;
        let mut request = self.load_change_request(id).await?;
        let b = self.load_booking(booking_id).await?;
        state::ensure_booking(b.status, BookingEvent::ResolveChange)?;
        state::ensure_change_pending(request.status, "deny")?;
        request.status = ChangeRequestStatus::Denied;
        request.resolved_at = Some(now());
        let store = &self.store;
        let (resolved, _) = self
            .cfg
            .retry
            .run("resolve_change_request", move || store.resolve_change_request(request.clone(), None))
            .await?;
        drop(guard);
        info!(booking_id = %booking_id, "change_denied");

        self.notifier
            .notify_all(
                actor.user_id,
                vec![b.customer_id],
                "Change denied",
                &format!("Booking {booking_id} keeps its schedule {}", b.scheduled_at.to_rfc3339()),
            )
            .await;
        Ok(resolved)
    }

    /// Admin or an assigned technician prices a CONFIRMED booking.
    #[instrument(skip(self, input), fields(actor = %actor.user_id, booking_id = %id, amount = input.amount))]
    pub async fn issue_quote(&self, actor: &Actor, id: Uuid, input: IssueQuoteInput) -> Result<quote::Model, ServiceError> {
        input.validate()?;
        require_role(actor, &[UserRole::Admin, UserRole::Technician], "issue quotes")?;
        let guard = self.locks.acquire(id).await;
        let b = self.load_booking(id).await?;
        let technicians = self.technician_ids(id).await?;
        Self::require_assigned(actor, &technicians)?;
        state::ensure_booking(b.status, BookingEvent::IssueQuote)?;
        let store = &self.store;
        let existing = self.cfg.retry.run("list_quotes", move || store.list_quotes(id)).await?;
        if existing.iter().any(|q| q.status.is_open()) {
            return Err(ServiceError::Conflict(format!("booking {id} already has an open quote")));
        }
        let ts = now();
        let record = quote::Model {
            id: Uuid::new_v4(),
            booking_id: id,
            amount: input.amount,
            status: QuoteStatus::Pending,
            created_at: ts,
            updated_at: ts,
        };
        let created = self.cfg.retry.run("create_quote", move || store.create_quote(record.clone())).await?;
        drop(guard);
        info!(quote_id = %created.id, "quote_issued");

        self.notifier
            .notify_all(
                actor.user_id,
                vec![b.customer_id],
                "Quote ready",
                &format!("A quote of {} is ready for booking {}", created.amount, id),
            )
            .await;
        Ok(created)
    }

    async fn load_quote(&self, id: Uuid) -> Result<quote::Model, ServiceError> {
        let store = &self.store;
        self.cfg
            .retry
            .run("get_quote", move || store.get_quote(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("quote"))
    }

    /// Owning customer accepts a PENDING quote; the UNPAID billing is created in the same write.
    #[instrument(skip(self), fields(actor = %actor.user_id, quote_id = %id))]
    pub async fn accept_quote(&self, actor: &Actor, id: Uuid) -> Result<AcceptedQuote, ServiceError> {
        require_role(actor, &[UserRole::Customer], "accept quotes")?;
        let booking_id = self.load_quote(id).await?.booking_id;
        let guard = self.locks.acquire(booking_id).await;
        let mut q = self.load_quote(id).await?;
        let b = self.load_booking(booking_id).await?;
        require_owner(actor, &b)?;
        // 重复接受一律视为冲突，无论预约当前处于什么状态
        state::ensure_quote_acceptable(q.status)?;
        let store = &self.store;
        if self.cfg.retry.run("find_billing_by_quote", move || store.find_billing_by_quote(id)).await?.is_some() {
            return Err(ServiceError::Conflict(format!("quote {id} already billed")));
        }
        state::ensure_booking(b.status, BookingEvent::SettleQuote)?;
        let mut recipients = self.admin_ids().await?;
        recipients.extend(self.technician_ids(booking_id).await?);
        let ts = now();
        q.status = QuoteStatus::Approved;
        q.updated_at = ts;
        let bill = billing::Model {
            id: Uuid::new_v4(),
            quote_id: q.id,
            booking_id,
            amount: q.amount,
            status: BillingStatus::Unpaid,
            created_at: ts,
            paid_at: None,
        };
        let (quote, billing) = self
            .cfg
            .retry
            .run("approve_quote", move || store.approve_quote(q.clone(), bill.clone()))
            .await?;
        drop(guard);
        info!(booking_id = %booking_id, billing_id = %billing.id, amount = billing.amount, "quote_accepted");

        self.notifier
            .notify_all(
                actor.user_id,
                recipients,
                "Quote accepted",
                &format!("Quote {} for booking {} was accepted", quote.id, booking_id),
            )
            .await;
        Ok(AcceptedQuote { quote, billing })
    }

    #[instrument(skip(self), fields(actor = %actor.user_id, quote_id = %id))]
    pub async fn reject_quote(&self, actor: &Actor, id: Uuid) -> Result<quote::Model, ServiceError> {
        require_role(actor, &[UserRole::Customer], "reject quotes")?;
        let booking_id = self.load_quote(id).await?.booking_id;
        let guard = self.locks.acquire(booking_id).await;
        let mut q = self.load_quote(id).await?;
        let b = self.load_booking(booking_id).await?;
        require_owner(actor, &b)?;
        state::ensure_booking(b.status, BookingEvent::SettleQuote)?;
        state::ensure_quote_rejectable(q.status)?;
        let mut recipients = self.admin_ids().await?;
        recipients.extend(self.technician_ids(booking_id).await?);
        q.status = QuoteStatus::Rejected;
        q.updated_at = now();
        let store = &self.store;
        let quote = self
            .cfg
            .retry
            .run("update_quote", move || store.update_quote(q.clone(), QuoteStatus::Pending))
            .await?;
        drop(guard);
        info!(booking_id = %booking_id, "quote_rejected");

        self.notifier
            .notify_all(
                actor.user_id,
                recipients,
                "Quote rejected",
                &format!("Quote {} for booking {} was rejected", quote.id, booking_id),
            )
            .await;
        Ok(quote)
    }

    /// Admin records the external payment of an UNPAID billing.
    #[instrument(skip(self), fields(actor = %actor.user_id, billing_id = %id))]
    pub async fn mark_billing_paid(&self, actor: &Actor, id: Uuid) -> Result<billing::Model, ServiceError> {
        require_role(actor, &[UserRole::Admin], "record payments")?;
        let store = &self.store;
        let load = move || store.get_billing(id);
        let booking_id = self
            .cfg
            .retry
            .run("get_billing", load)
            .await?
            .ok_or_else(|| ServiceError::not_found("billing"))?
            .booking_id;
        let guard = self.locks.acquire(booking_id).await;
        let mut bill = self
            .cfg
            .retry
            .run("get_billing", load)
            .await?
            .ok_or_else(|| ServiceError::not_found("billing"))?;
        state::ensure_billing_unpaid(bill.status)?;
        let customer_id = self.load_booking(booking_id).await?.customer_id;
        bill.status = BillingStatus::Paid;
        bill.paid_at = Some(now());
        let paid = self
            .cfg
            .retry
            .run("update_billing", move || store.update_billing(bill.clone(), BillingStatus::Unpaid))
            .await?;
        drop(guard);
        info!(booking_id = %booking_id, amount = paid.amount, "billing_paid");

        self.notifier
            .notify_all(
                actor.user_id,
                vec![customer_id],
                "Payment received",
                &format!("Payment of {} for booking {} was received", paid.amount, booking_id),
            )
            .await;
        Ok(paid)
    }
}
