use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{EvidenceCaptureData, EvidenceType};

/// Saved portfolio entry; `assessment_criteria_met` feeds qualification progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEvidenceRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub evidence_type: EvidenceType,
    pub file_url: Option<String>,
    pub assessment_criteria_met: Vec<String>,
    pub tags: Vec<String>,
    pub quality_score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl PortfolioEvidenceRecord {
    pub fn from_capture(user_id: &str, data: &EvidenceCaptureData, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: data.title.trim().to_string(),
            description: data.description.trim().to_string(),
            evidence_type: data.evidence_type,
            file_url: data.file_url.clone(),
            assessment_criteria_met: data.selected_ksbs.to_vec(),
            tags: data.selected_tags.to_vec(),
            quality_score: data
                .analysis
                .as_ref()
                .map(|analysis| analysis.quality_assessment.score.rounded()),
            created_at,
        }
    }
}

/// Persistence for saved evidence.
pub trait EvidenceRepository: Send + Sync {
    fn insert(&self, record: PortfolioEvidenceRecord)
        -> Result<PortfolioEvidenceRecord, RepositoryError>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<PortfolioEvidenceRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
