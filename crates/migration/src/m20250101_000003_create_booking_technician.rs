//! Create `booking_technician` assignment table (composite key).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingTechnician::Table)
                    .if_not_exists()
                    .col(uuid(BookingTechnician::BookingId).not_null())
                    .col(uuid(BookingTechnician::TechnicianId).not_null())
                    .col(boolean(BookingTechnician::IsPrimary).not_null())
                    .col(timestamp_with_time_zone(BookingTechnician::AssignedAt).not_null())
                    .primary_key(
                        Index::create()
                            .col(BookingTechnician::BookingId)
                            .col(BookingTechnician::TechnicianId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_technician_booking")
                            .from(BookingTechnician::Table, BookingTechnician::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_technician_user")
                            .from(BookingTechnician::Table, BookingTechnician::TechnicianId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(BookingTechnician::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum BookingTechnician { Table, BookingId, TechnicianId, IsPrimary, AssignedAt }

#[derive(DeriveIden)]
enum Booking { Table, Id }

#[derive(DeriveIden)]
enum AppUser { Table, Id }
