use super::domain::{AssessmentCriterionRow, Qualification};

/// Read access to qualification headers and their criteria rows.
pub trait QualificationRepository: Send + Sync {
    fn fetch_qualification(&self, code: &str) -> Result<Option<Qualification>, RepositoryError>;
    fn fetch_criteria(&self, code: &str) -> Result<Vec<AssessmentCriterionRow>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
