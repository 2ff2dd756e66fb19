//! Create `booking_change_request` table.
//!
//! The one-pending-per-booking rule is a partial unique index, see `add_indexes`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingChangeRequest::Table)
                    .if_not_exists()
                    .col(uuid(BookingChangeRequest::Id).primary_key())
                    .col(uuid(BookingChangeRequest::BookingId).not_null())
                    .col(timestamp_with_time_zone(BookingChangeRequest::RequestedAt).not_null())
                    .col(string_len(BookingChangeRequest::Status, 16).not_null())
                    .col(timestamp_with_time_zone(BookingChangeRequest::CreatedAt).not_null())
                    .col(
                        ColumnDef::new(BookingChangeRequest::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_change_request_booking")
                            .from(BookingChangeRequest::Table, BookingChangeRequest::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(BookingChangeRequest::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BookingChangeRequest { Table, Id, BookingId, RequestedAt, Status, CreatedAt, ResolvedAt }

#[derive(DeriveIden)]
enum Booking { Table, Id }
