use std::fmt;

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Unpaid => "UNPAID",
            BillingStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub quote_id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub status: BillingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub paid_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Quote }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Quote => Entity::belongs_to(quote::Entity)
                .from(Column::QuoteId)
                .to(quote::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_active(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            quote_id: Set(self.quote_id),
            booking_id: Set(self.booking_id),
            amount: Set(self.amount),
            status: Set(self.status),
            created_at: Set(self.created_at),
            paid_at: Set(self.paid_at),
        }
    }
}
