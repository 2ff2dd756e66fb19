//! Create `quote` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quote::Table)
                    .if_not_exists()
                    .col(uuid(Quote::Id).primary_key())
                    .col(uuid(Quote::BookingId).not_null())
                    .col(big_integer(Quote::Amount).not_null())
                    .col(string_len(Quote::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Quote::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Quote::UpdatedAt).not_null())
                    .check(Expr::cust("amount > 0"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quote_booking")
                            .from(Quote::Table, Quote::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Quote::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Quote { Table, Id, BookingId, Amount, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Booking { Table, Id }
