//! Create `booking` table, the aggregate root of the lifecycle.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid(Booking::CarId).not_null())
                    .col(ColumnDef::new(Booking::ServiceId).uuid().null())
                    .col(ColumnDef::new(Booking::PackId).uuid().null())
                    .col(timestamp_with_time_zone(Booking::ScheduledAt).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(ColumnDef::new(Booking::CustomerNotes).text().null())
                    .col(json_binary(Booking::ServicePreferences).not_null())
                    .col(integer(Booking::Version).not_null().default(1))
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    // exactly one of service_id / pack_id
                    .check(Expr::cust("(service_id IS NULL) <> (pack_id IS NULL)"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Booking::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Booking {
    Table,
    Id,
    CustomerId,
    CarId,
    ServiceId,
    PackId,
    ScheduledAt,
    Status,
    CustomerNotes,
    ServicePreferences,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppUser { Table, Id }
