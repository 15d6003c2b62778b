//! Field validators for the pickup form and customer lookups.
//!
//! Each validator returns the cleaned value or a [`FieldError`]. Callers that
//! check a whole form collect every failure into one [`ValidationError`].

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::config::{BusinessInfo, PickupSettings};
use crate::ui::time_parser::{parse_pickup_date, parse_pickup_time};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+971|00971|971|0)?(5[024568]\d{7})$").expect("valid phone regex")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L} '.\-]+$").expect("valid name regex"));

const NAME_LEN: (usize, usize) = (2, 100);
const ADDRESS_LEN: (usize, usize) = (10, 500);
const NOTES_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    PhoneNumber,
    Email,
    PickupAddress,
    PickupDate,
    PickupTime,
    ServiceType,
    Notes,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::PhoneNumber => "phone number",
            Self::Email => "email",
            Self::PickupAddress => "pickup address",
            Self::PickupDate => "pickup date",
            Self::PickupTime => "pickup time",
            Self::ServiceType => "service type",
            Self::Notes => "notes",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field that failed, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input: {}", summarize(.0))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// UAE mobile number in any common notation. Returns `+9715XXXXXXXX`.
pub fn validate_phone_number(input: &str) -> Result<String, FieldError> {
    let compact: String = input
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '.' | '(' | ')')))
        .collect();
    if compact.is_empty() {
        return Err(FieldError::new(Field::PhoneNumber, "phone number is required"));
    }
    PHONE_RE
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("+971{}", m.as_str()))
        .ok_or_else(|| {
            FieldError::new(
                Field::PhoneNumber,
                "enter a valid UAE mobile number, e.g. +971 50 123 4567",
            )
        })
}

/// `+971501234567` as `+971 50 123 4567`. Other input is returned unchanged.
pub fn format_phone_for_display(phone: &str) -> String {
    match validate_phone_number(phone) {
        Ok(canonical) => {
            let local = &canonical[4..];
            format!("+971 {} {} {}", &local[..2], &local[2..5], &local[5..])
        }
        Err(_) => phone.to_string(),
    }
}

pub fn validate_email(input: &str) -> Result<String, FieldError> {
    let email = input.trim();
    if EMAIL_RE.is_match(email) {
        Ok(email.to_lowercase())
    } else {
        Err(FieldError::new(Field::Email, "enter a valid email address"))
    }
}

pub fn validate_full_name(input: &str) -> Result<String, FieldError> {
    let name = input.trim();
    let len = name.chars().count();
    if len < NAME_LEN.0 || len > NAME_LEN.1 {
        return Err(FieldError::new(
            Field::FullName,
            format!("name must be {} to {} characters", NAME_LEN.0, NAME_LEN.1),
        ));
    }
    if !NAME_RE.is_match(name) {
        return Err(FieldError::new(
            Field::FullName,
            "name may only contain letters, spaces, apostrophes, hyphens and periods",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_address(input: &str) -> Result<String, FieldError> {
    let address = input.trim();
    let len = address.chars().count();
    if len < ADDRESS_LEN.0 {
        return Err(FieldError::new(
            Field::PickupAddress,
            format!("address must be at least {} characters", ADDRESS_LEN.0),
        ));
    }
    if len > ADDRESS_LEN.1 {
        return Err(FieldError::new(
            Field::PickupAddress,
            format!("address must be at most {} characters", ADDRESS_LEN.1),
        ));
    }
    Ok(address.to_string())
}

/// Blank notes become `None`.
pub fn validate_notes(input: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(notes) = input.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > NOTES_MAX {
        return Err(FieldError::new(
            Field::Notes,
            format!("notes must be at most {NOTES_MAX} characters"),
        ));
    }
    Ok(Some(notes.to_string()))
}

pub fn validate_pickup_date(
    input: &str,
    today: NaiveDate,
    settings: &PickupSettings,
) -> Result<NaiveDate, FieldError> {
    let date = parse_pickup_date(input, today).ok_or_else(|| {
        FieldError::new(
            Field::PickupDate,
            "use YYYY-MM-DD, DD/MM/YYYY, 'tomorrow' or '+3d'",
        )
    })?;
    let ahead = (date - today).num_days();
    if ahead < settings.min_lead_days {
        return Err(FieldError::new(
            Field::PickupDate,
            format!(
                "pickup must be at least {} day(s) from today",
                settings.min_lead_days
            ),
        ));
    }
    if ahead > settings.max_days_ahead {
        return Err(FieldError::new(
            Field::PickupDate,
            format!(
                "pickup can be booked at most {} days ahead",
                settings.max_days_ahead
            ),
        ));
    }
    Ok(date)
}

pub fn validate_pickup_time(input: &str, settings: &PickupSettings) -> Result<NaiveTime, FieldError> {
    let time = parse_pickup_time(input)
        .ok_or_else(|| FieldError::new(Field::PickupTime, "use HH:MM or h:MM AM/PM"))?;
    match (settings.opening(), settings.closing()) {
        (Some(open), Some(close)) if time >= open && time < close => Ok(time),
        _ => Err(FieldError::new(
            Field::PickupTime,
            format!(
                "pickup time must be between {} and {}",
                settings.opening_time, settings.closing_time
            ),
        )),
    }
}

/// Returns the configured spelling of the service.
pub fn validate_service(input: &str, business: &BusinessInfo) -> Result<String, FieldError> {
    business
        .find_service(input)
        .map(str::to_string)
        .ok_or_else(|| {
            FieldError::new(
                Field::ServiceType,
                format!("unknown service '{}'; run `champion services`", input.trim()),
            )
        })
}
