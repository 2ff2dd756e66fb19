//! Create `billing` table; one row per approved quote.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Billing::Table)
                    .if_not_exists()
                    .col(uuid(Billing::Id).primary_key())
                    .col(uuid(Billing::QuoteId).unique_key().not_null())
                    .col(uuid(Billing::BookingId).not_null())
                    .col(big_integer(Billing::Amount).not_null())
                    .col(string_len(Billing::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Billing::CreatedAt).not_null())
                    .col(ColumnDef::new(Billing::PaidAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_quote")
                            .from(Billing::Table, Billing::QuoteId)
                            .to(Quote::Table, Quote::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_billing_booking")
                            .from(Billing::Table, Billing::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Billing::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Billing { Table, Id, QuoteId, BookingId, Amount, Status, CreatedAt, PaidAt }

#[derive(DeriveIden)]
enum Quote { Table, Id }

#[derive(DeriveIden)]
enum Booking { Table, Id }
