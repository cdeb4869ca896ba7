use super::domain::{ElecIdProfile, Employee};

/// Backend access for employees and their Elec-ID profiles. Writes are last-write-wins.
pub trait ElecIdRepository: Send + Sync {
    fn employees(&self) -> Result<Vec<Employee>, RepositoryError>;
    fn employee(&self, employee_id: &str) -> Result<Option<Employee>, RepositoryError>;
    fn upsert_employee(&self, employee: Employee) -> Result<(), RepositoryError>;

    fn profiles(&self) -> Result<Vec<ElecIdProfile>, RepositoryError>;
    fn profile_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<ElecIdProfile>, RepositoryError>;
    /// Fails with `Conflict` when the employee or the number already has a profile.
    fn insert_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, RepositoryError>;
    fn update_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
