use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use models::{booking::ServicePreferences, user::UserRole};
use service::booking::{Actor, BookingConfig, BookingService, ConfirmBookingInput, CreateBookingInput, IssueQuoteInput};
use service::notifications::NotificationEmitter;
use service::retry::RetryPolicy;
use service::store::memory::InMemoryStore;

fn bench_quote_flow(c: &mut Criterion) {
    let store = Arc::new(InMemoryStore::new());
    let customer = Actor::new(uuid::Uuid::new_v4(), UserRole::Customer);
    let admin = Actor::new(uuid::Uuid::new_v4(), UserRole::Admin);
    let tech = Actor::new(uuid::Uuid::new_v4(), UserRole::Technician);
    for a in [customer, admin, tech] {
        store.add_user(a.user_id, a.role);
    }
    let notifier = Arc::new(NotificationEmitter::new(store.clone(), RetryPolicy::none()));
    let svc = BookingService::new(store, notifier, BookingConfig::default());
    let rt = tokio::runtime::Runtime::new().unwrap();

    // create -> confirm -> quote -> accept, all against the in-memory store
    c.bench_function("booking_quote_accept_flow", |b| {
        b.iter(|| {
            rt.block_on(async {
                let input = CreateBookingInput {
                    car_id: uuid::Uuid::new_v4(),
                    service_id: None,
                    pack_id: Some(uuid::Uuid::new_v4()),
                    scheduled_at: chrono::Utc::now().fixed_offset(),
                    customer_notes: None,
                    service_preferences: ServicePreferences::default(),
                };
                let booking = svc.create(&customer, input).await.unwrap();
                let confirm = ConfirmBookingInput { technician_ids: vec![tech.user_id], multi_assign: false, scheduled_at: None };
                svc.confirm(&admin, booking.id, confirm).await.unwrap();
                let quote = svc.issue_quote(&tech, booking.id, IssueQuoteInput { amount: 1500 }).await.unwrap();
                svc.accept_quote(&customer, quote.id).await.unwrap();
            })
        });
    });
}

criterion_group!(benches, bench_quote_flow);
criterion_main!(benches);
