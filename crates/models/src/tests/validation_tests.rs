use uuid::Uuid;

use crate::booking::{self, BookingStatus, ServicePreferences};
use crate::errors::ModelError;
use crate::user::UserRole;
use crate::{notification, quote};

#[test]
fn booking_target_requires_exactly_one_of_service_or_pack() {
    let id = Uuid::new_v4();
    assert!(booking::validate_target(Some(id), None).is_ok());
    assert!(booking::validate_target(None, Some(id)).is_ok());
    assert!(matches!(booking::validate_target(Some(id), Some(id)), Err(ModelError::Validation(_))));
    assert!(matches!(booking::validate_target(None, None), Err(ModelError::Validation(_))));
}

#[test]
fn blank_reason_is_rejected() {
    assert!(booking::validate_reason("no slots").is_ok());
    assert!(booking::validate_reason("   ").is_err());
}

#[test]
fn notes_length_is_bounded() {
    assert!(booking::validate_notes(None).is_ok());
    assert!(booking::validate_notes(Some("brakes squeak")).is_ok());
    let long = "x".repeat(2001);
    assert!(booking::validate_notes(Some(&long)).is_err());
}

#[test]
fn quote_amount_must_be_positive() {
    assert!(quote::validate_amount(1500).is_ok());
    assert!(quote::validate_amount(0).is_err());
    assert!(quote::validate_amount(-10).is_err());
}

#[test]
fn notification_title_rules() {
    assert!(notification::validate_title("Booking confirmed").is_ok());
    assert!(notification::validate_title("").is_err());
    assert!(notification::validate_title(&"t".repeat(129)).is_err());
}

#[test]
fn terminal_statuses() {
    assert!(!BookingStatus::Pending.is_terminal());
    assert!(!BookingStatus::Confirmed.is_terminal());
    assert!(BookingStatus::Rejected.is_terminal());
    assert!(BookingStatus::Completed.is_terminal());
    assert!(BookingStatus::Cancelled.is_terminal());
}

#[test]
fn statuses_serialize_as_upper_case_strings() {
    assert_eq!(serde_json::to_value(BookingStatus::Confirmed).unwrap(), "CONFIRMED");
    assert_eq!(serde_json::to_value(quote::QuoteStatus::Approved).unwrap(), "APPROVED");
    assert_eq!(BookingStatus::Cancelled.to_string(), "CANCELLED");
}

#[test]
fn service_preferences_fill_missing_fields() {
    let prefs: ServicePreferences = serde_json::from_str(r#"{"need_extra_filter": true}"#).unwrap();
    assert!(prefs.need_extra_filter);
    assert!(prefs.preferred_technician_id.is_none());
    assert!(prefs.notes_for_tech.is_none());
}

#[test]
fn user_role_parse_is_case_insensitive() {
    assert_eq!(UserRole::parse(" Admin "), Some(UserRole::Admin));
    assert_eq!(UserRole::parse("technician"), Some(UserRole::Technician));
    assert_eq!(UserRole::parse("mechanic"), None);
}
