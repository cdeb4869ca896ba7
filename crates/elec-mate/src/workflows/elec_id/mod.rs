//! Elec-ID credential profiles: issuing numbers, bulk creation with per-employee results,
//! verification, and expiry status for ECS cards, certifications and training.

pub mod domain;
pub mod mapping;
pub mod repository;
mod roster;
pub mod router;
pub mod service;
pub mod status;
pub mod view;

#[cfg(test)]
mod tests;

pub use domain::{
    elec_id_number, next_elec_id_number, parse_elec_id_number, Certification, ElecIdProfile,
    Employee, HeldQualification, ProfileEntry, ProfileItem, Skill, SkillLevel, TrainingRecord,
    WorkHistoryEntry,
};
pub use mapping::{map_profile_row, profile_from_row, MappingError};
pub use repository::{ElecIdRepository, RepositoryError};
pub use roster::{parse_roster, RosterImportError};
pub use router::elec_id_router;
pub use service::{
    BulkCreationReport, BulkItemResult, ElecIdService, ElecIdServiceError, ExpiringElecId,
    NewElecId,
};
pub use status::{
    cert_status, days_until, days_until_raw, ecs_status, parse_expiry, CredentialStatus, EcsStatus,
    StatusThresholds,
};
pub use view::{EcsCardView, ElecIdProfileView, StatusedEntry};
