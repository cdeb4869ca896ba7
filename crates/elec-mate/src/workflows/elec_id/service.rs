use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{
    next_elec_id_number, Certification, ElecIdProfile, Employee, HeldQualification, ProfileEntry,
    ProfileItem, Skill, TrainingRecord, WorkHistoryEntry,
};
use super::repository::{ElecIdRepository, RepositoryError};
use super::roster::{parse_roster, RosterImportError};
use super::status::{days_until_raw, StatusThresholds};
use super::view::ElecIdProfileView;

/// Card details supplied when an Elec-ID is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewElecId {
    pub employee_id: String,
    #[serde(default)]
    pub ecs_card_type: Option<String>,
    #[serde(default)]
    pub ecs_card_number: Option<String>,
    #[serde(default)]
    pub ecs_expiry_date: Option<String>,
}

impl NewElecId {
    pub fn for_employee(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            ..Self::default()
        }
    }
}

/// Outcome of creating an Elec-ID for one employee inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkItemResult {
    Created {
        employee_id: String,
        elec_id_number: String,
    },
    Skipped {
        employee_id: String,
        elec_id_number: String,
    },
    Failed {
        employee_id: String,
        reason: String,
    },
}

impl BulkItemResult {
    pub fn employee_id(&self) -> &str {
        match self {
            BulkItemResult::Created { employee_id, .. }
            | BulkItemResult::Skipped { employee_id, .. }
            | BulkItemResult::Failed { employee_id, .. } => employee_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkCreationReport {
    pub results: Vec<BulkItemResult>,
}

impl BulkCreationReport {
    pub fn created(&self) -> usize {
        self.count(|result| matches!(result, BulkItemResult::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|result| matches!(result, BulkItemResult::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|result| matches!(result, BulkItemResult::Failed { .. }))
    }

    /// Employees to retry.
    pub fn failed_employee_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|result| matches!(result, BulkItemResult::Failed { .. }))
            .map(|result| result.employee_id().to_string())
            .collect()
    }

    fn count(&self, predicate: impl Fn(&BulkItemResult) -> bool) -> usize {
        self.results.iter().filter(|result| predicate(result)).count()
    }
}

/// A profile whose ECS card runs out within the requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringElecId {
    pub employee_id: String,
    pub elec_id_number: String,
    pub ecs_card_type: Option<String>,
    pub ecs_expiry_date: String,
    pub days_until: i64,
}

/// Issues, verifies and edits Elec-ID profiles.
pub struct ElecIdService<R> {
    repository: Arc<R>,
    thresholds: StatusThresholds,
}

impl<R> ElecIdService<R>
where
    R: ElecIdRepository + 'static,
{
    pub fn new(repository: Arc<R>, thresholds: StatusThresholds) -> Self {
        Self {
            repository,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &StatusThresholds {
        &self.thresholds
    }

    pub fn create_for_employee(
        &self,
        request: NewElecId,
        now: DateTime<Utc>,
    ) -> Result<ElecIdProfile, ElecIdServiceError> {
        let employee = self
            .repository
            .employee(&request.employee_id)?
            .ok_or_else(|| ElecIdServiceError::UnknownEmployee(request.employee_id.clone()))?;

        if let Some(existing) = self.repository.profile_for_employee(&employee.id)? {
            return Err(ElecIdServiceError::AlreadyExists {
                employee_id: employee.id,
                elec_id_number: existing.elec_id_number,
            });
        }

        let issued = self.repository.profiles()?;
        let number = next_elec_id_number(
            issued.iter().map(|profile| profile.elec_id_number.as_str()),
            now.year(),
        );

        let mut profile = ElecIdProfile::new(employee.id.clone(), number);
        profile.ecs_card_type = request.ecs_card_type;
        profile.ecs_card_number = request.ecs_card_number;
        profile.ecs_expiry_date = request.ecs_expiry_date;

        let stored = self.repository.insert_profile(profile)?;
        info!(
            employee_id = %stored.employee_id,
            elec_id_number = %stored.elec_id_number,
            "elec-id created"
        );
        Ok(stored)
    }

    /// Creates an Elec-ID for every employee that lacks one.
    pub fn create_for_all(&self, now: DateTime<Utc>) -> Result<BulkCreationReport, ElecIdServiceError> {
        let employee_ids: Vec<String> = self
            .repository
            .employees()?
            .into_iter()
            .map(|employee| employee.id)
            .collect();
        Ok(self.create_for_employees(&employee_ids, now))
    }

    /// Best-effort batch: every employee gets its own result and one failure never stops the rest.
    pub fn create_for_employees(&self, employee_ids: &[String], now: DateTime<Utc>) -> BulkCreationReport {
        let mut report = BulkCreationReport::default();

        for employee_id in employee_ids {
            let result = match self.create_for_employee(NewElecId::for_employee(employee_id.clone()), now) {
                Ok(profile) => BulkItemResult::Created {
                    employee_id: profile.employee_id,
                    elec_id_number: profile.elec_id_number,
                },
                Err(ElecIdServiceError::AlreadyExists {
                    employee_id,
                    elec_id_number,
                }) => BulkItemResult::Skipped {
                    employee_id,
                    elec_id_number,
                },
                Err(error) => {
                    warn!(%employee_id, %error, "elec-id creation failed");
                    BulkItemResult::Failed {
                        employee_id: employee_id.clone(),
                        reason: error.to_string(),
                    }
                }
            };
            report.results.push(result);
        }

        info!(
            created = report.created(),
            skipped = report.skipped(),
            failed = report.failed(),
            "bulk elec-id creation finished"
        );
        report
    }

    /// Marks the profile verified. Nothing changes when the write fails.
    pub fn verify(
        &self,
        employee_id: &str,
        verified_by: &str,
        now: DateTime<Utc>,
    ) -> Result<ElecIdProfile, ElecIdServiceError> {
        let verified_by = verified_by.trim();
        if verified_by.is_empty() {
            return Err(ElecIdServiceError::MissingVerifier);
        }

        let mut profile = self.profile(employee_id)?;
        profile.is_verified = true;
        profile.verified_at = Some(now);
        profile.verified_by = Some(verified_by.to_string());

        let stored = self.repository.update_profile(profile)?;
        info!(employee_id, verified_by, "elec-id verified");
        Ok(stored)
    }

    pub fn add_skill(&self, employee_id: &str, skill: Skill) -> Result<ProfileEntry<Skill>, ElecIdServiceError> {
        self.add_entry(employee_id, skill)
    }

    pub fn add_training(
        &self,
        employee_id: &str,
        training: TrainingRecord,
    ) -> Result<ProfileEntry<TrainingRecord>, ElecIdServiceError> {
        self.add_entry(employee_id, training)
    }

    pub fn add_certification(
        &self,
        employee_id: &str,
        certification: Certification,
    ) -> Result<ProfileEntry<Certification>, ElecIdServiceError> {
        self.add_entry(employee_id, certification)
    }

    pub fn add_qualification(
        &self,
        employee_id: &str,
        qualification: HeldQualification,
    ) -> Result<ProfileEntry<HeldQualification>, ElecIdServiceError> {
        self.add_entry(employee_id, qualification)
    }

    pub fn add_work_history(
        &self,
        employee_id: &str,
        entry: WorkHistoryEntry,
    ) -> Result<ProfileEntry<WorkHistoryEntry>, ElecIdServiceError> {
        self.add_entry(employee_id, entry)
    }

    pub fn add_entry<T: ProfileItem>(
        &self,
        employee_id: &str,
        item: T,
    ) -> Result<ProfileEntry<T>, ElecIdServiceError> {
        if item.title().trim().is_empty() {
            return Err(ElecIdServiceError::InvalidEntry(T::KIND));
        }

        let mut profile = self.profile(employee_id)?;
        let entry = ProfileEntry {
            id: Uuid::new_v4(),
            item,
        };
        T::entries_mut(&mut profile).push(entry.clone());
        self.repository.update_profile(profile)?;
        info!(employee_id, kind = T::KIND, entry_id = %entry.id, "elec-id entry added");
        Ok(entry)
    }

    pub fn remove_entry(&self, employee_id: &str, entry_id: Uuid) -> Result<(), ElecIdServiceError> {
        let mut profile = self.profile(employee_id)?;
        if !profile.remove_entry(entry_id) {
            return Err(ElecIdServiceError::EntryNotFound(entry_id));
        }
        self.repository.update_profile(profile)?;
        info!(employee_id, %entry_id, "elec-id entry removed");
        Ok(())
    }

    pub fn profile(&self, employee_id: &str) -> Result<ElecIdProfile, ElecIdServiceError> {
        self.repository
            .profile_for_employee(employee_id)?
            .ok_or_else(|| ElecIdServiceError::ProfileNotFound(employee_id.to_string()))
    }

    pub fn profile_view(
        &self,
        employee_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ElecIdProfileView, ElecIdServiceError> {
        let profile = self.profile(employee_id)?;
        let employee = self.repository.employee(employee_id)?;
        Ok(ElecIdProfileView::build(
            &profile,
            employee.as_ref(),
            now,
            &self.thresholds,
        ))
    }

    /// ECS cards expiring between today and `days` from now, soonest first.
    pub fn expiring_within(
        &self,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiringElecId>, ElecIdServiceError> {
        let mut expiring: Vec<ExpiringElecId> = self
            .repository
            .profiles()?
            .into_iter()
            .filter_map(|profile| {
                let days_until = days_until_raw(profile.ecs_expiry_date.as_deref(), now)?;
                if !(0..=days).contains(&days_until) {
                    return None;
                }
                Some(ExpiringElecId {
                    employee_id: profile.employee_id,
                    elec_id_number: profile.elec_id_number,
                    ecs_card_type: profile.ecs_card_type,
                    ecs_expiry_date: profile.ecs_expiry_date.unwrap_or_default(),
                    days_until,
                })
            })
            .collect();
        expiring.sort_by(|a, b| {
            a.days_until
                .cmp(&b.days_until)
                .then_with(|| a.elec_id_number.cmp(&b.elec_id_number))
        });
        Ok(expiring)
    }

    pub fn unverified(&self) -> Result<Vec<ElecIdProfile>, ElecIdServiceError> {
        let mut profiles: Vec<ElecIdProfile> = self
            .repository
            .profiles()?
            .into_iter()
            .filter(|profile| !profile.is_verified)
            .collect();
        profiles.sort_by(|a, b| a.elec_id_number.cmp(&b.elec_id_number));
        Ok(profiles)
    }

    pub fn employees_without_elec_id(&self) -> Result<Vec<Employee>, ElecIdServiceError> {
        let profiles = self.repository.profiles()?;
        Ok(self
            .repository
            .employees()?
            .into_iter()
            .filter(|employee| {
                !profiles
                    .iter()
                    .any(|profile| profile.employee_id == employee.id)
            })
            .collect())
    }

    /// Loads a roster into the employee list and returns how many rows were stored.
    pub fn import_roster<T: Read>(&self, reader: T) -> Result<usize, ElecIdServiceError> {
        let employees = parse_roster(reader)?;
        let count = employees.len();
        for employee in employees {
            self.repository.upsert_employee(employee)?;
        }
        info!(count, "roster imported");
        Ok(count)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ElecIdServiceError {
    #[error("unknown employee '{0}'")]
    UnknownEmployee(String),
    #[error("employee '{employee_id}' already holds {elec_id_number}")]
    AlreadyExists {
        employee_id: String,
        elec_id_number: String,
    },
    #[error("no elec-id profile for employee '{0}'")]
    ProfileNotFound(String),
    #[error("no profile entry with id {0}")]
    EntryNotFound(Uuid),
    #[error("{0} entries need a name")]
    InvalidEntry(&'static str),
    #[error("verification needs the name of the verifier")]
    MissingVerifier,
    #[error(transparent)]
    Roster(#[from] RosterImportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
