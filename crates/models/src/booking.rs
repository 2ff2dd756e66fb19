use std::fmt;

use sea_orm::{entity::prelude::*, FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Customer hints for the workshop, stored as one JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ServicePreferences {
    #[serde(default)]
    pub preferred_technician_id: Option<Uuid>,
    #[serde(default)]
    pub need_extra_filter: bool,
    #[serde(default)]
    pub notes_for_tech: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub service_id: Option<Uuid>,
    pub pack_id: Option<Uuid>,
    pub scheduled_at: DateTimeWithTimeZone,
    pub status: BookingStatus,
    pub customer_notes: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub service_preferences: ServicePreferences,
    /// Optimistic concurrency counter, bumped by every successful update.
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Active model with every column marked as set.
    pub fn to_active(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            customer_id: Set(self.customer_id),
            car_id: Set(self.car_id),
            service_id: Set(self.service_id),
            pack_id: Set(self.pack_id),
            scheduled_at: Set(self.scheduled_at),
            status: Set(self.status),
            customer_notes: Set(self.customer_notes.clone()),
            service_preferences: Set(self.service_preferences.clone()),
            version: Set(self.version),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}

/// A booking targets exactly one of a single service or a pack.
pub fn validate_target(service_id: Option<Uuid>, pack_id: Option<Uuid>) -> Result<(), ModelError> {
    match (service_id, pack_id) {
        (Some(_), Some(_)) => Err(ModelError::Validation("service_id and pack_id are mutually exclusive".into())),
        (None, None) => Err(ModelError::Validation("one of service_id or pack_id is required".into())),
        _ => Ok(()),
    }
}

pub fn validate_notes(notes: Option<&str>) -> Result<(), ModelError> {
    if let Some(n) = notes {
        if n.chars().count() > 2000 {
            return Err(ModelError::Validation("customer_notes too long (<=2000)".into()));
        }
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<(), ModelError> {
    if reason.trim().is_empty() {
        return Err(ModelError::Validation("reason required".into()));
    }
    Ok(())
}
