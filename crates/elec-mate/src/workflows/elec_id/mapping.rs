use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::domain::{ElecIdProfile, Employee};
use super::status::StatusThresholds;
use super::view::ElecIdProfileView;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("profile row is not an object")]
    NotAnObject,
    #[error("profile row is missing '{0}'")]
    MissingField(&'static str),
    #[error("profile row field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Converts a backend profile row into the display model.
pub fn map_profile_row(
    row: &Value,
    employee: Option<&Employee>,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> Result<ElecIdProfileView, MappingError> {
    let profile = profile_from_row(row)?;
    Ok(ElecIdProfileView::build(&profile, employee, now, thresholds))
}

/// Reads a backend row field by field. Required columns must be present and non-blank.
pub fn profile_from_row(row: &Value) -> Result<ElecIdProfile, MappingError> {
    let row = row.as_object().ok_or(MappingError::NotAnObject)?;

    let id = required_str(row, "id")?;
    let id = Uuid::parse_str(id).map_err(|err| MappingError::InvalidField {
        field: "id",
        reason: err.to_string(),
    })?;

    Ok(ElecIdProfile {
        id,
        employee_id: required_str(row, "employee_id")?.to_string(),
        elec_id_number: required_str(row, "elec_id_number")?.to_string(),
        ecs_card_type: optional_str(row, "ecs_card_type")?,
        ecs_card_number: optional_str(row, "ecs_card_number")?,
        ecs_expiry_date: optional_str(row, "ecs_expiry_date")?,
        is_verified: optional(row, "is_verified")?.unwrap_or(false),
        verified_at: optional(row, "verified_at")?,
        verified_by: optional_str(row, "verified_by")?,
        skills: optional(row, "skills")?.unwrap_or_default(),
        training: optional(row, "training")?.unwrap_or_default(),
        certifications: optional(row, "certifications")?.unwrap_or_default(),
        qualifications: optional(row, "qualifications")?.unwrap_or_default(),
        work_history: optional(row, "work_history")?.unwrap_or_default(),
    })
}

fn required_str<'a>(row: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, MappingError> {
    match row.get(field) {
        None | Some(Value::Null) => Err(MappingError::MissingField(field)),
        Some(Value::String(value)) if value.trim().is_empty() => {
            Err(MappingError::MissingField(field))
        }
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(other) => Err(MappingError::InvalidField {
            field,
            reason: format!("expected a string, found {other}"),
        }),
    }
}

fn optional_str(row: &Map<String, Value>, field: &'static str) -> Result<Option<String>, MappingError> {
    let value: Option<String> = optional(row, field)?;
    Ok(value.filter(|value| !value.trim().is_empty()))
}

fn optional<T: DeserializeOwned>(
    row: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, MappingError> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| MappingError::InvalidField {
                field,
                reason: err.to_string(),
            }),
    }
}
