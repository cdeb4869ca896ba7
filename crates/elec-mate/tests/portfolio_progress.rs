use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use elec_mate::config::EvidenceConfig;
use elec_mate::workflows::evidence::{
    AIAnalysisResult, AnalysisError, AnalysisRequest, EvidenceAnalyzer, EvidenceCaptureService,
    EvidenceRepository, EvidenceStorage, EvidenceUpload, KsbSuggestion, Percent,
    PortfolioEvidenceRecord, QualityAssessment, RepositoryError as EvidenceRepositoryError,
    StorageError, TagSuggestion, WizardEvent, WizardStep,
};
use elec_mate::workflows::qualification::{
    filter_units, parse_tree_csv, AssessmentCriterionRow, ProgressSummary, Qualification,
    QualificationRepository, QualificationTreeLoader, RepositoryError,
};

const TREE_CSV: &str = "\
unit_code,unit_title,lo_number,lo_text,ac_full_ref,ac_text
201,Health and safety in building services engineering,1,Know the health and safety legislation,1.1a,Identify the legislation relating to electrical work
201,Health and safety in building services engineering,1,Know the health and safety legislation,1.1b,Describe the duties of employers and employees
202,Principles of electrical science,2,Understand electrical circuits,2.3a,Calculate resistance in series and parallel circuits
202,Principles of electrical science,2,Understand electrical circuits,2.3b,Explain main protective bonding
";

struct CsvQualificationRepository {
    rows: Vec<AssessmentCriterionRow>,
}

impl CsvQualificationRepository {
    fn new() -> Self {
        let tree = parse_tree_csv(TREE_CSV.as_bytes()).expect("tree csv parses");
        Self {
            rows: tree.to_rows(),
        }
    }
}

impl QualificationRepository for CsvQualificationRepository {
    fn fetch_qualification(&self, code: &str) -> Result<Option<Qualification>, RepositoryError> {
        Ok((code == "5357").then(|| Qualification {
            code: "5357".to_string(),
            title: "Electrotechnical Qualification".to_string(),
            level: "3".to_string(),
            awarding_body: "City & Guilds".to_string(),
        }))
    }

    fn fetch_criteria(&self, code: &str) -> Result<Vec<AssessmentCriterionRow>, RepositoryError> {
        if code == "5357" {
            Ok(self.rows.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

#[derive(Default)]
struct BucketStorage {
    objects: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl EvidenceStorage for BucketStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), bytes.len());
        Ok(format!("https://files.test/{key}"))
    }
}

fn percent(value: f64) -> Percent {
    Percent::new(value).expect("valid percentage")
}

struct TaggingAnalyzer;

#[async_trait]
impl EvidenceAnalyzer for TaggingAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError> {
        assert!(request.evidence_url.starts_with("https://files.test/apprentice-1/temp/"));
        let ksb = |code: &str, confidence: f64| KsbSuggestion {
            code: code.to_string(),
            category: "knowledge".to_string(),
            confidence: percent(confidence),
            description: String::new(),
            reason: String::new(),
        };
        Ok(AIAnalysisResult {
            ksb_suggestions: vec![ksb("1.1a", 92.0), ksb("2.3a", 85.0), ksb("2.3b", 40.0)],
            tag_suggestions: vec![TagSuggestion {
                tag: "isolation".to_string(),
                confidence: percent(90.0),
            }],
            quality_assessment: QualityAssessment {
                score: percent(71.0),
                feedback: "Readable".to_string(),
                improvements: Vec::new(),
            },
            detected_content: serde_json::Value::Null,
        })
    }
}

#[derive(Default)]
struct PortfolioRepository {
    records: Mutex<Vec<PortfolioEvidenceRecord>>,
}

impl EvidenceRepository for PortfolioRepository {
    fn insert(
        &self,
        record: PortfolioEvidenceRecord,
    ) -> Result<PortfolioEvidenceRecord, EvidenceRepositoryError> {
        self.records
            .lock()
            .expect("portfolio mutex poisoned")
            .push(record.clone());
        Ok(record)
    }

    fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PortfolioEvidenceRecord>, EvidenceRepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("portfolio mutex poisoned")
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[test]
fn half_of_the_tree_evidenced_reports_fifty_percent() {
    let loader = QualificationTreeLoader::new(Arc::new(CsvQualificationRepository::new()));
    let view = loader.load(Some("5357")).expect("tree loads");
    assert_eq!(view.units.len(), 2);
    assert_eq!(view.total_acs, 4);

    let summary = ProgressSummary::for_units(&view.units, ["1.1a", "1.1b"]);
    assert_eq!(summary.percent, 50);
    assert_eq!(summary.label, "2 of 4 criteria evidenced");
    assert_eq!(summary.units[0].percent, 100);
    assert_eq!(summary.units[1].percent, 0);
}

#[test]
fn search_narrows_units_but_not_the_loaded_tree() {
    let loader = QualificationTreeLoader::new(Arc::new(CsvQualificationRepository::new()));
    let view = loader.load(Some("5357")).expect("tree loads");

    let matched = filter_units(&view.units, "BONDING");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].unit_code, "202");
    assert_eq!(matched[0].criteria_count(), 2);

    assert_eq!(filter_units(&view.units, "   ").len(), view.units.len());
    assert!(filter_units(&view.units, "photovoltaic").is_empty());
}

#[test]
fn no_selected_qualification_is_an_empty_tree() {
    let loader = QualificationTreeLoader::new(Arc::new(CsvQualificationRepository::new()));
    let view = loader.load(None).expect("empty view");
    assert!(view.qualification.is_none());
    assert_eq!(view.total_acs, 0);
    assert!(!view.is_loading);
}

#[tokio::test]
async fn captured_evidence_drives_qualification_progress() {
    let service = EvidenceCaptureService::new(
        Arc::new(BucketStorage::default()),
        Arc::new(TaggingAnalyzer),
        Arc::new(PortfolioRepository::default()),
        &EvidenceConfig::default(),
    );

    let mut wizard = service.start();
    service
        .upload(
            &mut wizard,
            "apprentice-1",
            EvidenceUpload {
                file_name: "isolation.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![1u8; 2048],
            },
        )
        .await
        .expect("upload accepted");
    assert_eq!(wizard.step(), WizardStep::Details);

    wizard
        .apply(WizardEvent::DetailsEdited {
            title: "Safe isolation of a lighting circuit".to_string(),
            description: String::new(),
        })
        .expect("details editable");
    let step = service.analyze(&mut wizard).await.expect("analysis runs");
    assert_eq!(step, WizardStep::Review);
    assert!(wizard.data().selected_ksbs.contains("1.1a"));
    assert!(wizard.data().selected_ksbs.contains("2.3a"));
    assert!(!wizard.data().selected_ksbs.contains("2.3b"));
    assert!(wizard.data().selected_tags.contains("isolation"));

    assert!(wizard.reject_ksb("2.3a").expect("review is editable"));
    assert!(wizard.accept_ksb("1.1b").expect("review is editable"));

    let record = service.save(&wizard, "apprentice-1").expect("evidence saved");
    assert_eq!(record.quality_score, Some(71));
    assert_eq!(record.tags, vec!["isolation".to_string()]);

    let loader = QualificationTreeLoader::new(Arc::new(CsvQualificationRepository::new()));
    let view = loader.load(Some("5357")).expect("tree loads");
    let completed = service.completed_refs("apprentice-1").expect("refs listed");
    let summary = ProgressSummary::for_units(&view.units, &completed);

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.percent, 50);
    assert_eq!(summary.label, "2 of 4 criteria evidenced");
    assert!(service
        .completed_refs("someone-else")
        .expect("refs listed")
        .is_empty());
}
