//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_app_user;
mod m20250101_000002_create_booking;
mod m20250101_000003_create_booking_technician;
mod m20250101_000004_create_booking_change_request;
mod m20250101_000005_create_quote;
mod m20250101_000006_create_billing;
mod m20250101_000007_create_notification;
mod m20250101_000008_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_app_user::Migration),
            Box::new(m20250101_000002_create_booking::Migration),
            Box::new(m20250101_000003_create_booking_technician::Migration),
            Box::new(m20250101_000004_create_booking_change_request::Migration),
            Box::new(m20250101_000005_create_quote::Migration),
            Box::new(m20250101_000006_create_billing::Migration),
            Box::new(m20250101_000007_create_notification::Migration),
            // Indexes should always be applied last
            Box::new(m20250101_000008_add_indexes::Migration),
        ]
    }
}
