//! Portfolio evidence capture: upload, AI-assisted tagging against assessment criteria, and
//! reconciliation of the suggested criteria and tags before the evidence is saved.

pub mod analyzer;
pub mod domain;
pub mod repository;
pub mod router;
mod selection;
pub mod service;
pub mod upload;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use analyzer::{
    AnalysisError, AnalysisRequest, DisabledAnalyzer, EvidenceAnalyzer, HttpEvidenceAnalyzer,
};
pub use domain::{
    AIAnalysisResult, EvidenceCaptureData, EvidenceType, KsbSuggestion, Percent,
    PercentOutOfRange, QualityAssessment, TagSuggestion,
};
pub use repository::{EvidenceRepository, PortfolioEvidenceRecord, RepositoryError};
pub use router::evidence_router;
pub use selection::SelectionSet;
pub use service::{EvidenceCaptureService, EvidenceServiceError};
pub use upload::{
    EvidenceStorage, EvidenceUpload, StorageError, UploadError, UploadedEvidence,
};
pub use wizard::{transition, EvidenceWizard, WizardError, WizardEvent, WizardSnapshot, WizardStep};
