use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_active(&self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            user_id: Set(self.user_id),
            title: Set(self.title.clone()),
            message: Set(self.message.clone()),
            read: Set(self.read),
            created_at: Set(self.created_at),
        }
    }
}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title required".into()));
    }
    if title.chars().count() > 128 {
        return Err(ModelError::Validation("title too long (<=128)".into()));
    }
    Ok(())
}
