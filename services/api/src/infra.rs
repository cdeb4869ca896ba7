use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use elec_mate::config::AnalysisConfig;
use elec_mate::workflows::elec_id::{
    ElecIdProfile, ElecIdRepository, Employee, RepositoryError as ElecIdRepositoryError,
};
use elec_mate::workflows::evidence::{
    AIAnalysisResult, AnalysisError, AnalysisRequest, DisabledAnalyzer, EvidenceAnalyzer,
    EvidenceRepository, EvidenceStorage, HttpEvidenceAnalyzer, PortfolioEvidenceRecord,
    RepositoryError as EvidenceRepositoryError, StorageError,
};
use elec_mate::workflows::qualification::{
    parse_tree_csv, AssessmentCriterionRow, Qualification, QualificationRepository,
    RepositoryError as QualificationRepositoryError, TreeImportError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const SAMPLE_TREE_CSV: &str = "\
unit_code,unit_title,lo_number,lo_text,ac_full_ref,ac_text
201,Health and safety in building services engineering,1,Know the health and safety legislation,1.1a,Identify the legislation relating to electrical work
201,Health and safety in building services engineering,1,Know the health and safety legislation,1.1b,Describe the duties of employers and employees
202,Principles of electrical science,2,Understand electrical circuits,2.3a,Calculate resistance in series and parallel circuits
202,Principles of electrical science,2,Understand electrical circuits,2.3b,Explain main protective bonding
";

/// City & Guilds 5357 excerpt served by the in-memory qualification repository.
pub(crate) fn sample_qualification() -> Qualification {
    Qualification {
        code: "5357".to_string(),
        title: "Installation Electrician / Maintenance Electrician".to_string(),
        level: "3".to_string(),
        awarding_body: "City & Guilds".to_string(),
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryQualificationRepository {
    qualifications: Arc<Mutex<HashMap<String, (Qualification, Vec<AssessmentCriterionRow>)>>>,
}

impl InMemoryQualificationRepository {
    pub(crate) fn seeded() -> Result<Self, TreeImportError> {
        let repository = Self::default();
        let tree = parse_tree_csv(SAMPLE_TREE_CSV.as_bytes())?;
        repository.insert(sample_qualification(), tree.to_rows());
        Ok(repository)
    }

    pub(crate) fn insert(&self, qualification: Qualification, rows: Vec<AssessmentCriterionRow>) {
        let mut guard = self.qualifications.lock().expect("qualification mutex poisoned");
        guard.insert(qualification.code.clone(), (qualification, rows));
    }
}

impl QualificationRepository for InMemoryQualificationRepository {
    fn fetch_qualification(
        &self,
        code: &str,
    ) -> Result<Option<Qualification>, QualificationRepositoryError> {
        let guard = self.qualifications.lock().expect("qualification mutex poisoned");
        Ok(guard.get(code).map(|(qualification, _)| qualification.clone()))
    }

    fn fetch_criteria(
        &self,
        code: &str,
    ) -> Result<Vec<AssessmentCriterionRow>, QualificationRepositoryError> {
        let guard = self.qualifications.lock().expect("qualification mutex poisoned");
        Ok(guard
            .get(code)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

/// Keeps uploaded files in memory and hands out URLs under the configured public base.
#[derive(Clone)]
pub(crate) struct InMemoryEvidenceStorage {
    public_base_url: String,
    objects: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
}

impl InMemoryEvidenceStorage {
    pub(crate) fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.objects.lock().expect("storage mutex poisoned").len()
    }
}

#[async_trait]
impl EvidenceStorage for InMemoryEvidenceStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let mut guard = self.objects.lock().expect("storage mutex poisoned");
        if guard.contains_key(key) {
            return Err(StorageError::Rejected(format!("object '{key}' already exists")));
        }
        guard.insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(format!("{}/{key}", self.public_base_url))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvidenceRepository {
    records: Arc<Mutex<Vec<PortfolioEvidenceRecord>>>,
}

impl EvidenceRepository for InMemoryEvidenceRepository {
    fn insert(
        &self,
        record: PortfolioEvidenceRecord,
    ) -> Result<PortfolioEvidenceRecord, EvidenceRepositoryError> {
        let mut guard = self.records.lock().expect("evidence mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(EvidenceRepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PortfolioEvidenceRecord>, EvidenceRepositoryError> {
        let guard = self.records.lock().expect("evidence mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Analyzer picked at startup from `APP_ANALYSIS_ENDPOINT`.
pub(crate) enum ConfiguredAnalyzer {
    Http(HttpEvidenceAnalyzer),
    Disabled(DisabledAnalyzer),
}

impl ConfiguredAnalyzer {
    pub(crate) fn from_config(config: &AnalysisConfig) -> Self {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Self::Disabled(DisabledAnalyzer);
        };
        match HttpEvidenceAnalyzer::new(endpoint, config.timeout) {
            Ok(analyzer) => Self::Http(analyzer),
            Err(error) => {
                warn!(%error, endpoint, "analysis client could not be built; analysis disabled");
                Self::Disabled(DisabledAnalyzer)
            }
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

#[async_trait]
impl EvidenceAnalyzer for ConfiguredAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError> {
        match self {
            Self::Http(analyzer) => analyzer.analyze(request).await,
            Self::Disabled(analyzer) => analyzer.analyze(request).await,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryElecIdRepository {
    employees: Arc<Mutex<BTreeMap<String, Employee>>>,
    profiles: Arc<Mutex<BTreeMap<String, ElecIdProfile>>>,
}

impl ElecIdRepository for InMemoryElecIdRepository {
    fn employees(&self) -> Result<Vec<Employee>, ElecIdRepositoryError> {
        let guard = self.employees.lock().expect("employee mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn employee(&self, employee_id: &str) -> Result<Option<Employee>, ElecIdRepositoryError> {
        let guard = self.employees.lock().expect("employee mutex poisoned");
        Ok(guard.get(employee_id).cloned())
    }

    fn upsert_employee(&self, employee: Employee) -> Result<(), ElecIdRepositoryError> {
        let mut guard = self.employees.lock().expect("employee mutex poisoned");
        guard.insert(employee.id.clone(), employee);
        Ok(())
    }

    fn profiles(&self) -> Result<Vec<ElecIdProfile>, ElecIdRepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn profile_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<ElecIdProfile>, ElecIdRepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(employee_id).cloned())
    }

    fn insert_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, ElecIdRepositoryError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let number_taken = guard
            .values()
            .any(|existing| existing.elec_id_number == profile.elec_id_number);
        if guard.contains_key(&profile.employee_id) || number_taken {
            return Err(ElecIdRepositoryError::Conflict);
        }
        guard.insert(profile.employee_id.clone(), profile.clone());
        Ok(profile)
    }

    fn update_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, ElecIdRepositoryError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        match guard.get_mut(&profile.employee_id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(profile)
            }
            None => Err(ElecIdRepositoryError::NotFound),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Midnight UTC of `date`, or the current instant when no date is given.
pub(crate) fn instant_for(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}
