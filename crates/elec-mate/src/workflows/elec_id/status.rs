use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Day counts at which credentials start warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusThresholds {
    /// Training and certifications.
    pub cert_warning_days: i64,
    /// ECS cards.
    pub ecs_expiring_days: i64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            cert_warning_days: 30,
            ecs_expiring_days: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialStatus {
    Active,
    Warning,
    Expired,
}

impl CredentialStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CredentialStatus::Active => "Active",
            CredentialStatus::Warning => "Warning",
            CredentialStatus::Expired => "Expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcsStatus {
    Valid,
    Expiring,
    Expired,
}

impl EcsStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EcsStatus::Valid => "Valid",
            EcsStatus::Expiring => "Expiring",
            EcsStatus::Expired => "Expired",
        }
    }
}

/// Parses `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Whole days from `now` until `expiry`, rounded up. Negative once the expiry has passed by a
/// full day.
pub fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (expiry - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Days until a raw expiry string; `None` for missing or unparseable values.
pub fn days_until_raw(expiry: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    expiry
        .and_then(parse_expiry)
        .map(|expiry| days_until(expiry, now))
}

/// Status of a certification or training record.
pub fn cert_status(
    expiry: Option<&str>,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> CredentialStatus {
    match days_until_raw(expiry, now) {
        None => CredentialStatus::Active,
        Some(days) if days < 0 => CredentialStatus::Expired,
        Some(days) if days <= thresholds.cert_warning_days => CredentialStatus::Warning,
        Some(_) => CredentialStatus::Active,
    }
}

/// Status of an ECS card.
pub fn ecs_status(expiry: Option<&str>, now: DateTime<Utc>, thresholds: &StatusThresholds) -> EcsStatus {
    match days_until_raw(expiry, now) {
        None => EcsStatus::Valid,
        Some(days) if days < 0 => EcsStatus::Expired,
        Some(days) if days <= thresholds.ecs_expiring_days => EcsStatus::Expiring,
        Some(_) => EcsStatus::Valid,
    }
}
