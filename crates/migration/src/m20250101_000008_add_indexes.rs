use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Booking: lookups by customer
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_customer")
                    .table(Booking::Table)
                    .col(Booking::CustomerId)
                    .to_owned(),
            )
            .await?;

        // BookingTechnician: lookups by technician
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_technician_tech")
                    .table(BookingTechnician::Table)
                    .col(BookingTechnician::TechnicianId)
                    .to_owned(),
            )
            .await?;

        // Notification: inbox listing, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_created")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Partial unique indexes: sea-query has no WHERE clause for indexes
        let conn = manager.get_connection();
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uniq_change_request_pending \
             ON booking_change_request (booking_id) WHERE status = 'PENDING'",
        )
        .await?;
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS uniq_quote_open \
             ON quote (booking_id) WHERE status <> 'REJECTED'",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP INDEX IF EXISTS uniq_quote_open").await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS uniq_change_request_pending").await?;
        manager
            .drop_index(Index::drop().name("idx_notification_user_created").table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_technician_tech").table(BookingTechnician::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_customer").table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Booking { Table, CustomerId }

#[derive(DeriveIden)]
enum BookingTechnician { Table, TechnicianId }

#[derive(DeriveIden)]
enum Notification { Table, UserId, CreatedAt }
