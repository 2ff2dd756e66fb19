use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{
    billing,
    booking::{self, validate_notes, validate_reason, validate_target, ServicePreferences},
    booking_change_request as change_request,
    booking_technician,
    quote::{self, validate_amount},
    user::UserRole,
};

use crate::errors::ServiceError;

/// Authenticated caller with the role resolved from the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self { Self { user_id, role } }
    pub fn is_admin(&self) -> bool { self.role == UserRole::Admin }
    pub fn is_customer(&self) -> bool { self.role == UserRole::Customer }
    pub fn is_technician(&self) -> bool { self.role == UserRole::Technician }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingInput {
    pub car_id: Uuid,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub pack_id: Option<Uuid>,
    pub scheduled_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub customer_notes: Option<String>,
    #[serde(default)]
    pub service_preferences: ServicePreferences,
}

impl CreateBookingInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_target(self.service_id, self.pack_id)?;
        validate_notes(self.customer_notes.as_deref())?;
        validate_notes(self.service_preferences.notes_for_tech.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditBookingInput {
    #[serde(default)]
    pub customer_notes: Option<String>,
    #[serde(default)]
    pub service_preferences: Option<ServicePreferences>,
}

impl EditBookingInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.customer_notes.is_none() && self.service_preferences.is_none() {
            return Err(ServiceError::Validation("nothing to edit".into()));
        }
        validate_notes(self.customer_notes.as_deref())?;
        if let Some(p) = &self.service_preferences {
            validate_notes(p.notes_for_tech.as_deref())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmBookingInput {
    pub technician_ids: Vec<Uuid>,
    #[serde(default)]
    pub multi_assign: bool,
    /// Overrides the requested schedule.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<FixedOffset>>,
}

impl ConfirmBookingInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.technician_ids.is_empty() {
            return Err(ServiceError::Validation("at least one technician required".into()));
        }
        if self.technician_ids.len() > 1 && !self.multi_assign {
            return Err(ServiceError::Validation("multiple technicians require multi_assign".into()));
        }
        let mut ids = self.technician_ids.clone();
        ids.sort();
        ids.dedup();
        if ids.len() != self.technician_ids.len() {
            return Err(ServiceError::Validation("duplicate technician id".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectBookingInput {
    pub reason: String,
}

impl RejectBookingInput {
    pub fn validate(&self) -> Result<(), ServiceError> { Ok(validate_reason(&self.reason)?) }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelBookingInput {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestChangeInput {
    pub requested_at: DateTime<FixedOffset>,
}

impl RequestChangeInput {
    pub fn validate(&self, now: DateTime<FixedOffset>) -> Result<(), ServiceError> {
        if self.requested_at <= now {
            return Err(ServiceError::Validation("requested_at must be in the future".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueQuoteInput {
    /// Minor currency units.
    pub amount: i64,
}

impl IssueQuoteInput {
    pub fn validate(&self) -> Result<(), ServiceError> { Ok(validate_amount(self.amount)?) }
}

/// A booking with everything hanging off it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingAggregate {
    pub booking: booking::Model,
    pub technicians: Vec<booking_technician::Model>,
    pub change_requests: Vec<change_request::Model>,
    pub quotes: Vec<quote::Model>,
    pub billings: Vec<billing::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptedQuote {
    pub quote: quote::Model,
    pub billing: billing::Model,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn create(service_id: Option<Uuid>, pack_id: Option<Uuid>) -> CreateBookingInput {
        CreateBookingInput {
            car_id: Uuid::new_v4(),
            service_id,
            pack_id,
            scheduled_at: Utc::now().fixed_offset(),
            customer_notes: None,
            service_preferences: ServicePreferences::default(),
        }
    }

    #[test]
    fn create_requires_exactly_one_target() {
        assert!(create(Some(Uuid::new_v4()), None).validate().is_ok());
        assert!(create(None, Some(Uuid::new_v4())).validate().is_ok());
        assert_eq!(create(None, None).validate().unwrap_err().kind(), "validation");
        assert_eq!(create(Some(Uuid::new_v4()), Some(Uuid::new_v4())).validate().unwrap_err().kind(), "validation");
    }

    #[test]
    fn confirm_needs_multi_assign_for_teams() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let solo = ConfirmBookingInput { technician_ids: vec![a], multi_assign: false, scheduled_at: None };
        assert!(solo.validate().is_ok());
        let team = ConfirmBookingInput { technician_ids: vec![a, b], multi_assign: false, scheduled_at: None };
        assert!(team.validate().is_err());
        let team = ConfirmBookingInput { multi_assign: true, ..team };
        assert!(team.validate().is_ok());
        let dup = ConfirmBookingInput { technician_ids: vec![a, a], multi_assign: true, scheduled_at: None };
        assert!(dup.validate().is_err());
        let none = ConfirmBookingInput { technician_ids: vec![], multi_assign: true, scheduled_at: None };
        assert!(none.validate().is_err());
    }

    #[test]
    fn change_must_be_in_the_future() {
        let now = Utc::now().fixed_offset();
        assert!(RequestChangeInput { requested_at: now + Duration::hours(1) }.validate(now).is_ok());
        assert!(RequestChangeInput { requested_at: now }.validate(now).is_err());
    }

    #[test]
    fn edit_needs_a_field() {
        assert!(EditBookingInput::default().validate().is_err());
        let e = EditBookingInput { customer_notes: Some("x".repeat(2001)), service_preferences: None };
        assert!(e.validate().is_err());
    }

    #[test]
    fn create_input_deserializes_with_defaults() {
        let raw = r#"{"car_id":"6f1c2b1e-0000-4000-8000-000000000001","pack_id":"6f1c2b1e-0000-4000-8000-000000000002","scheduled_at":"2030-01-01T09:00:00+00:00"}"#;
        let input: CreateBookingInput = serde_json::from_str(raw).unwrap();
        assert!(input.service_id.is_none());
        assert!(!input.service_preferences.need_extra_filter);
        assert!(input.validate().is_ok());
    }
}
