use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const NUMBER_PREFIX: &str = "ELEC";

/// Employee on the employer's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `ELEC-{year}-{sequence:05}`
pub fn elec_id_number(year: i32, sequence: u32) -> String {
    format!("{NUMBER_PREFIX}-{year}-{sequence:05}")
}

pub fn parse_elec_id_number(number: &str) -> Option<(i32, u32)> {
    let mut parts = number.trim().splitn(3, '-');
    if parts.next()? != NUMBER_PREFIX {
        return None;
    }
    let year = parts.next()?.parse().ok()?;
    let sequence = parts.next()?.parse().ok()?;
    Some((year, sequence))
}

/// Next free number for `year`, given every number already issued.
pub fn next_elec_id_number<'a>(issued: impl IntoIterator<Item = &'a str>, year: i32) -> String {
    let highest = issued
        .into_iter()
        .filter_map(parse_elec_id_number)
        .filter(|(issued_year, _)| *issued_year == year)
        .map(|(_, sequence)| sequence)
        .max()
        .unwrap_or(0);
    elec_id_number(year, highest + 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
    #[serde(default)]
    pub years_experience: Option<u8>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub completed_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub funded_by: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub cert_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldQualification {
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkHistoryEntry {
    pub employer: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub verified: bool,
}

/// A collection entry with its own identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub item: T,
}

/// Credential profile of one worker. Statuses are never stored; see [`super::view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElecIdProfile {
    pub id: Uuid,
    pub employee_id: String,
    pub elec_id_number: String,
    #[serde(default)]
    pub ecs_card_type: Option<String>,
    #[serde(default)]
    pub ecs_card_number: Option<String>,
    #[serde(default)]
    pub ecs_expiry_date: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub skills: Vec<ProfileEntry<Skill>>,
    #[serde(default)]
    pub training: Vec<ProfileEntry<TrainingRecord>>,
    #[serde(default)]
    pub certifications: Vec<ProfileEntry<Certification>>,
    #[serde(default)]
    pub qualifications: Vec<ProfileEntry<HeldQualification>>,
    #[serde(default)]
    pub work_history: Vec<ProfileEntry<WorkHistoryEntry>>,
}

impl ElecIdProfile {
    pub fn new(employee_id: impl Into<String>, elec_id_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            elec_id_number,
            ecs_card_type: None,
            ecs_card_number: None,
            ecs_expiry_date: None,
            is_verified: false,
            verified_at: None,
            verified_by: None,
            skills: Vec::new(),
            training: Vec::new(),
            certifications: Vec::new(),
            qualifications: Vec::new(),
            work_history: Vec::new(),
        }
    }

    /// Removes the entry with `entry_id` from whichever collection holds it.
    pub fn remove_entry(&mut self, entry_id: Uuid) -> bool {
        Skill::remove(self, entry_id)
            || TrainingRecord::remove(self, entry_id)
            || Certification::remove(self, entry_id)
            || HeldQualification::remove(self, entry_id)
            || WorkHistoryEntry::remove(self, entry_id)
    }
}

/// Items stored in one of the profile's collections.
pub trait ProfileItem: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;

    /// Display name; must not be blank.
    fn title(&self) -> &str;

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>>;

    fn remove(profile: &mut ElecIdProfile, entry_id: Uuid) -> bool {
        let entries = Self::entries_mut(profile);
        let before = entries.len();
        entries.retain(|entry| entry.id != entry_id);
        entries.len() != before
    }
}

impl ProfileItem for Skill {
    const KIND: &'static str = "skill";

    fn title(&self) -> &str {
        &self.name
    }

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>> {
        &mut profile.skills
    }
}

impl ProfileItem for TrainingRecord {
    const KIND: &'static str = "training";

    fn title(&self) -> &str {
        &self.name
    }

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>> {
        &mut profile.training
    }
}

impl ProfileItem for Certification {
    const KIND: &'static str = "certification";

    fn title(&self) -> &str {
        &self.name
    }

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>> {
        &mut profile.certifications
    }
}

impl ProfileItem for HeldQualification {
    const KIND: &'static str = "qualification";

    fn title(&self) -> &str {
        &self.name
    }

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>> {
        &mut profile.qualifications
    }
}

impl ProfileItem for WorkHistoryEntry {
    const KIND: &'static str = "work_history";

    fn title(&self) -> &str {
        &self.employer
    }

    fn entries_mut(profile: &mut ElecIdProfile) -> &mut Vec<ProfileEntry<Self>> {
        &mut profile.work_history
    }
}
