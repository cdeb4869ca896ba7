use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::analyzer::{AnalysisRequest, EvidenceAnalyzer};
use super::domain::Percent;
use super::repository::{EvidenceRepository, PortfolioEvidenceRecord, RepositoryError};
use super::selection::SelectionSet;
use super::upload::{storage_key, EvidenceStorage, EvidenceUpload, UploadError, UploadedEvidence};
use super::wizard::{EvidenceWizard, WizardError, WizardEvent, WizardSnapshot, WizardStep};
use crate::config::EvidenceConfig;

/// Drives the capture wizard against storage, the analyzer and the evidence repository.
pub struct EvidenceCaptureService<S, A, R> {
    storage: Arc<S>,
    analyzer: Arc<A>,
    repository: Arc<R>,
    max_upload_bytes: u64,
    auto_select: Percent,
}

impl<S, A, R> EvidenceCaptureService<S, A, R>
where
    S: EvidenceStorage + 'static,
    A: EvidenceAnalyzer + 'static,
    R: EvidenceRepository + 'static,
{
    pub fn new(storage: Arc<S>, analyzer: Arc<A>, repository: Arc<R>, config: &EvidenceConfig) -> Self {
        Self {
            storage,
            analyzer,
            repository,
            max_upload_bytes: config.max_upload_bytes,
            auto_select: config.auto_select_confidence,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn start(&self) -> EvidenceWizard {
        EvidenceWizard::new(self.auto_select)
    }

    /// Starts a wizard for written evidence, already past the capture step.
    pub fn start_text(&self) -> Result<EvidenceWizard, EvidenceServiceError> {
        let mut wizard = self.start();
        wizard.apply(WizardEvent::TextEntered)?;
        Ok(wizard)
    }

    pub fn resume(&self, snapshot: WizardSnapshot) -> Result<EvidenceWizard, WizardError> {
        EvidenceWizard::restore(snapshot, self.auto_select)
    }

    /// Validates and stores the file, then advances the wizard to `Details`. On any failure the
    /// wizard stays at `Capture` with the error recorded.
    pub async fn upload(
        &self,
        wizard: &mut EvidenceWizard,
        user_id: &str,
        upload: EvidenceUpload,
    ) -> Result<UploadedEvidence, EvidenceServiceError> {
        if wizard.step() != WizardStep::Capture {
            return Err(WizardError::InvalidTransition {
                from: wizard.step(),
                event: "file_uploaded",
            }
            .into());
        }

        match self.store(user_id, upload).await {
            Ok(uploaded) => {
                wizard.apply(WizardEvent::FileUploaded(uploaded.clone()))?;
                Ok(uploaded)
            }
            Err(error) => {
                warn!(user_id, %error, "evidence upload rejected");
                wizard.apply(WizardEvent::UploadFailed(error.to_string()))?;
                Err(error.into())
            }
        }
    }

    async fn store(
        &self,
        user_id: &str,
        upload: EvidenceUpload,
    ) -> Result<UploadedEvidence, UploadError> {
        let evidence_type = upload.validate(self.max_upload_bytes)?;
        let key = storage_key(user_id, &upload.file_name, &upload.content_type, Uuid::new_v4())?;

        let EvidenceUpload {
            file_name,
            content_type,
            bytes,
        } = upload;
        let file_url = self.storage.put(&key, bytes, &content_type).await?;

        Ok(UploadedEvidence {
            file_url,
            storage_key: key,
            file_name,
            evidence_type,
        })
    }

    /// Runs the analysis once. A failed analysis still moves the wizard to `Review`, just
    /// without suggestions. A blank title leaves the wizard at `Details`.
    pub async fn analyze(&self, wizard: &mut EvidenceWizard) -> Result<WizardStep, EvidenceServiceError> {
        let step = wizard.apply(WizardEvent::Analyze)?;
        if step != WizardStep::Analyze {
            return Ok(step);
        }

        let request = AnalysisRequest::from_capture(wizard.data());
        let result = match self.analyzer.analyze(&request).await {
            Ok(result) => Some(result),
            Err(error) => {
                warn!(%error, evidence_url = %request.evidence_url, "evidence analysis unavailable; continuing without suggestions");
                None
            }
        };

        Ok(wizard.apply(WizardEvent::AnalysisFinished(result))?)
    }

    /// Persists the reviewed evidence. The wizard is left untouched so a failed save can be
    /// retried by the caller.
    pub fn save(
        &self,
        wizard: &EvidenceWizard,
        user_id: &str,
    ) -> Result<PortfolioEvidenceRecord, EvidenceServiceError> {
        let data = wizard.ready_data()?;
        let record = PortfolioEvidenceRecord::from_capture(user_id, data, Utc::now());
        let stored = self.repository.insert(record)?;
        info!(
            user_id,
            evidence_id = %stored.id,
            criteria = stored.assessment_criteria_met.len(),
            "portfolio evidence saved"
        );
        Ok(stored)
    }

    pub fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PortfolioEvidenceRecord>, EvidenceServiceError> {
        Ok(self.repository.list_for_user(user_id)?)
    }

    /// Distinct criteria references evidenced across the user's saved records.
    pub fn completed_refs(&self, user_id: &str) -> Result<Vec<String>, EvidenceServiceError> {
        let records = self.repository.list_for_user(user_id)?;
        let completed: SelectionSet = records
            .into_iter()
            .flat_map(|record| record.assessment_criteria_met)
            .collect();
        Ok(completed.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvidenceServiceError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
