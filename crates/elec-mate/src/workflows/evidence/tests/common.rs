use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::config::EvidenceConfig;
use crate::workflows::evidence::{
    AIAnalysisResult, AnalysisError, AnalysisRequest, EvidenceAnalyzer, EvidenceCaptureService,
    EvidenceRepository, EvidenceStorage, EvidenceType, EvidenceUpload, KsbSuggestion, Percent,
    PortfolioEvidenceRecord, QualityAssessment, RepositoryError, StorageError, TagSuggestion,
    UploadedEvidence,
};

pub(super) const PUBLIC_BASE: &str = "https://files.elec-mate.test";

pub(super) fn percent(value: f64) -> Percent {
    Percent::new(value).expect("valid percent")
}

pub(super) fn evidence_config() -> EvidenceConfig {
    EvidenceConfig {
        public_base_url: PUBLIC_BASE.to_string(),
        max_upload_bytes: 10 * 1024 * 1024,
        auto_select_confidence: percent(80.0),
    }
}

pub(super) fn sample_analysis() -> AIAnalysisResult {
    AIAnalysisResult {
        ksb_suggestions: vec![
            KsbSuggestion {
                code: "1.1a".to_string(),
                category: "knowledge".to_string(),
                confidence: percent(92.0),
                description: "Identify safe isolation procedures".to_string(),
                reason: "Lock-off kit visible on the isolator".to_string(),
            },
            KsbSuggestion {
                code: "2.3a".to_string(),
                category: "skill".to_string(),
                confidence: percent(80.0),
                description: "Carry out continuity testing".to_string(),
                reason: "Test leads on the protective conductor".to_string(),
            },
            KsbSuggestion {
                code: "3.2b".to_string(),
                category: "behaviour".to_string(),
                confidence: percent(55.0),
                description: "Keep the work area tidy".to_string(),
                reason: "Partially visible".to_string(),
            },
        ],
        tag_suggestions: vec![
            TagSuggestion {
                tag: "isolation".to_string(),
                confidence: percent(88.0),
            },
            TagSuggestion {
                tag: "domestic".to_string(),
                confidence: percent(40.0),
            },
        ],
        quality_assessment: QualityAssessment {
            score: percent(76.0),
            feedback: "Clear photo of the board".to_string(),
            improvements: vec!["Add a short caption".to_string()],
        },
        detected_content: json!({ "objects": ["consumer unit", "lock-off kit"] }),
    }
}

pub(super) fn uploaded() -> UploadedEvidence {
    UploadedEvidence {
        file_url: format!("{PUBLIC_BASE}/apprentice-7/temp/0000.jpg"),
        storage_key: "apprentice-7/temp/0000.jpg".to_string(),
        file_name: "board.jpg".to_string(),
        evidence_type: EvidenceType::Image,
    }
}

pub(super) fn jpeg_upload(size: usize) -> EvidenceUpload {
    EvidenceUpload {
        file_name: "board.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xFF; size],
    }
}

#[derive(Clone, Default)]
pub(super) struct MemoryStorage {
    objects: Arc<Mutex<Vec<(String, usize, String)>>>,
}

impl MemoryStorage {
    pub(super) fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl EvidenceStorage for MemoryStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.objects.lock().expect("storage mutex poisoned").push((
            key.to_string(),
            bytes.len(),
            content_type.to_string(),
        ));
        Ok(format!("{PUBLIC_BASE}/{key}"))
    }
}

pub(super) struct OfflineStorage;

#[async_trait]
impl EvidenceStorage for OfflineStorage {
    async fn put(
        &self,
        _key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Err(StorageError::Unavailable("bucket unreachable".to_string()))
    }
}

/// Returns the canned result, or fails when constructed with `None`.
#[derive(Clone, Default)]
pub(super) struct FixedAnalyzer {
    result: Option<AIAnalysisResult>,
    calls: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl FixedAnalyzer {
    pub(super) fn returning(result: AIAnalysisResult) -> Self {
        Self {
            result: Some(result),
            calls: Arc::default(),
        }
    }

    pub(super) fn failing() -> Self {
        Self::default()
    }

    pub(super) fn calls(&self) -> Vec<AnalysisRequest> {
        self.calls.lock().expect("analyzer mutex poisoned").clone()
    }
}

#[async_trait]
impl EvidenceAnalyzer for FixedAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError> {
        self.calls
            .lock()
            .expect("analyzer mutex poisoned")
            .push(request.clone());
        self.result.clone().ok_or(AnalysisError::Status(503))
    }
}

#[derive(Clone, Default)]
pub(super) struct MemoryEvidenceRepository {
    records: Arc<Mutex<Vec<PortfolioEvidenceRecord>>>,
}

impl MemoryEvidenceRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl EvidenceRepository for MemoryEvidenceRepository {
    fn insert(
        &self,
        record: PortfolioEvidenceRecord,
    ) -> Result<PortfolioEvidenceRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PortfolioEvidenceRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl EvidenceRepository for UnavailableRepository {
    fn insert(
        &self,
        _record: PortfolioEvidenceRecord,
    ) -> Result<PortfolioEvidenceRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_user(
        &self,
        _user_id: &str,
    ) -> Result<Vec<PortfolioEvidenceRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService =
    EvidenceCaptureService<MemoryStorage, FixedAnalyzer, MemoryEvidenceRepository>;

pub(super) fn build_service(
    analyzer: FixedAnalyzer,
) -> (Arc<MemoryService>, MemoryStorage, MemoryEvidenceRepository) {
    let storage = MemoryStorage::default();
    let repository = MemoryEvidenceRepository::default();
    let service = EvidenceCaptureService::new(
        Arc::new(storage.clone()),
        Arc::new(analyzer),
        Arc::new(repository.clone()),
        &evidence_config(),
    );
    (Arc::new(service), storage, repository)
}
