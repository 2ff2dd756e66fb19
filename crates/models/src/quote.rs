use std::fmt;

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{booking, errors::ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Approved => "APPROVED",
            QuoteStatus::Rejected => "REJECTED",
        }
    }

    /// Open quotes block issuing another one for the same booking.
    pub fn is_open(&self) -> bool { !matches!(self, QuoteStatus::Rejected) }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Minor currency units.
    pub amount: i64,
    pub status: QuoteStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Booking }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Booking => Entity::belongs_to(booking::Entity)
                .from(Column::BookingId)
                .to(booking::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_active(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            booking_id: Set(self.booking_id),
            amount: Set(self.amount),
            status: Set(self.status),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}

pub fn validate_amount(amount: i64) -> Result<(), ModelError> {
    if amount <= 0 {
        return Err(ModelError::Validation("amount must be positive".into()));
    }
    Ok(())
}
