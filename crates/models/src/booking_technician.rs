use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::booking;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking_technician")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub booking_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub technician_id: Uuid,
    pub is_primary: bool,
    pub assigned_at: DateTimeWithTimeZone,
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
            booking_id: Set(self.booking_id),
            technician_id: Set(self.technician_id),
            is_primary: Set(self.is_primary),
            assigned_at: Set(self.assigned_at),
        }
    }
}
