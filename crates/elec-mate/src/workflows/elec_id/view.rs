use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::domain::{
    Certification, ElecIdProfile, Employee, HeldQualification, ProfileEntry, Skill,
    TrainingRecord, WorkHistoryEntry,
};
use super::status::{
    cert_status, days_until_raw, ecs_status, CredentialStatus, EcsStatus, StatusThresholds,
};

/// Display model for a profile with every status derived at `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElecIdProfileView {
    pub id: Uuid,
    pub employee_id: String,
    pub employee_name: Option<String>,
    pub role: Option<String>,
    pub elec_id_number: String,
    pub ecs_card: EcsCardView,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub skills: Vec<ProfileEntry<Skill>>,
    pub training: Vec<StatusedEntry<TrainingRecord, CredentialStatus>>,
    pub certifications: Vec<StatusedEntry<Certification, CredentialStatus>>,
    pub qualifications: Vec<ProfileEntry<HeldQualification>>,
    pub work_history: Vec<ProfileEntry<WorkHistoryEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcsCardView {
    pub card_type: Option<String>,
    pub card_number: Option<String>,
    pub expiry_date: Option<String>,
    pub status: EcsStatus,
    pub days_until: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusedEntry<T, S> {
    #[serde(flatten)]
    pub entry: ProfileEntry<T>,
    pub status: S,
    pub days_until: Option<i64>,
}

impl ElecIdProfileView {
    pub fn build(
        profile: &ElecIdProfile,
        employee: Option<&Employee>,
        now: DateTime<Utc>,
        thresholds: &StatusThresholds,
    ) -> Self {
        let ecs_expiry = profile.ecs_expiry_date.as_deref();

        Self {
            id: profile.id,
            employee_id: profile.employee_id.clone(),
            employee_name: employee.map(|employee| employee.name.clone()),
            role: employee.map(|employee| employee.role.clone()),
            elec_id_number: profile.elec_id_number.clone(),
            ecs_card: EcsCardView {
                card_type: profile.ecs_card_type.clone(),
                card_number: profile.ecs_card_number.clone(),
                expiry_date: profile.ecs_expiry_date.clone(),
                status: ecs_status(ecs_expiry, now, thresholds),
                days_until: days_until_raw(ecs_expiry, now),
            },
            is_verified: profile.is_verified,
            verified_at: profile.verified_at,
            verified_by: profile.verified_by.clone(),
            skills: profile.skills.clone(),
            training: profile
                .training
                .iter()
                .map(|entry| with_cert_status(entry, entry.item.expiry_date.as_deref(), now, thresholds))
                .collect(),
            certifications: profile
                .certifications
                .iter()
                .map(|entry| with_cert_status(entry, entry.item.expiry_date.as_deref(), now, thresholds))
                .collect(),
            qualifications: profile.qualifications.clone(),
            work_history: profile.work_history.clone(),
        }
    }

    /// Certifications and training currently at `status`.
    pub fn credentials_with(&self, status: CredentialStatus) -> Vec<&str> {
        self.certifications
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.entry.item.name.as_str())
            .chain(
                self.training
                    .iter()
                    .filter(|entry| entry.status == status)
                    .map(|entry| entry.entry.item.name.as_str()),
            )
            .collect()
    }
}

fn with_cert_status<T: Clone>(
    entry: &ProfileEntry<T>,
    expiry: Option<&str>,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> StatusedEntry<T, CredentialStatus> {
    StatusedEntry {
        entry: entry.clone(),
        status: cert_status(expiry, now, thresholds),
        days_until: days_until_raw(expiry, now),
    }
}
