#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use uuid::Uuid;

use models::{
    booking::{self, ServicePreferences},
    notification,
    user::UserRole,
};

use crate::booking::{Actor, BookingConfig, BookingService, ConfirmBookingInput, CreateBookingInput};
use crate::notifications::NotificationEmitter;
use crate::retry::RetryPolicy;
use crate::store::memory::InMemoryStore;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Migrated Postgres connection, or `None` when tests should skip.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match models::db::connect().await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {e}");
                        false
                    }
                },
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {e}");
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }
    // Fresh connection for the current test's runtime
    models::db::connect().await.ok()
}

/// Engine over an in-memory store with a small user directory.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub svc: Arc<BookingService<InMemoryStore>>,
    pub customer: Actor,
    pub other_customer: Actor,
    pub admin: Actor,
    pub tech: Actor,
    pub tech2: Actor,
}

impl Fixture {
    pub fn new() -> Self { Self::with_config(BookingConfig { retry: RetryPolicy::none(), ..Default::default() }) }

    pub fn with_config(cfg: BookingConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let actor = |role| {
            let a = Actor::new(Uuid::new_v4(), role);
            store.add_user(a.user_id, role);
            a
        };
        let customer = actor(UserRole::Customer);
        let other_customer = actor(UserRole::Customer);
        let admin = actor(UserRole::Admin);
        let tech = actor(UserRole::Technician);
        let tech2 = actor(UserRole::Technician);
        let notifier = Arc::new(NotificationEmitter::new(store.clone(), cfg.retry.clone()));
        let svc = Arc::new(BookingService::new(store.clone(), notifier, cfg));
        Self { store, svc, customer, other_customer, admin, tech, tech2 }
    }

    pub fn create_input() -> CreateBookingInput {
        CreateBookingInput {
            car_id: Uuid::new_v4(),
            service_id: Some(Uuid::new_v4()),
            pack_id: None,
            scheduled_at: (Utc::now() + chrono::Duration::days(3)).fixed_offset(),
            customer_notes: Some("brakes squeal".into()),
            service_preferences: ServicePreferences::default(),
        }
    }

    pub async fn pending(&self) -> booking::Model {
        self.svc.create(&self.customer, Self::create_input()).await.expect("create booking")
    }

    /// PENDING booking confirmed by the admin with `tech` assigned.
    pub async fn confirmed(&self) -> booking::Model {
        let b = self.pending().await;
        let input = ConfirmBookingInput { technician_ids: vec![self.tech.user_id], multi_assign: false, scheduled_at: None };
        self.svc.confirm(&self.admin, b.id, input).await.expect("confirm booking").booking
    }

    pub async fn inbox(&self, actor: &Actor) -> Vec<notification::Model> {
        self.svc.notifier().list_for(actor.user_id).await.expect("list notifications")
    }

    pub async fn titles(&self, actor: &Actor) -> Vec<String> {
        self.inbox(actor).await.into_iter().map(|n| n.title).collect()
    }
}

/// Short backoff for retry tests.
pub fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(2))
}
