use std::fmt;

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "DENIED")]
    Denied,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "PENDING",
            ChangeRequestStatus::Approved => "APPROVED",
            ChangeRequestStatus::Denied => "DENIED",
        }
    }
}

impl fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking_change_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Proposed new schedule.
    pub requested_at: DateTimeWithTimeZone,
    pub status: ChangeRequestStatus,
    pub created_at: DateTimeWithTimeZone,
    pub resolved_at: Option<DateTimeWithTimeZone>,
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
            requested_at: Set(self.requested_at),
            status: Set(self.status),
            created_at: Set(self.created_at),
            resolved_at: Set(self.resolved_at),
        }
    }
}
