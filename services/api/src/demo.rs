use crate::infra::{
    instant_for, sample_qualification, ConfiguredAnalyzer, InMemoryElecIdRepository,
    InMemoryEvidenceRepository, InMemoryEvidenceStorage, InMemoryQualificationRepository,
};
use chrono::NaiveDate;
use clap::Args;
use elec_mate::config::{AnalysisConfig, EvidenceConfig};
use elec_mate::error::AppError;
use elec_mate::workflows::elec_id::{
    cert_status, days_until_raw, ecs_status, BulkCreationReport, BulkItemResult, ElecIdService,
    NewElecId, StatusThresholds,
};
use elec_mate::workflows::evidence::{
    EvidenceCaptureService, EvidenceServiceError, EvidenceUpload, EvidenceWizard, WizardEvent,
};
use elec_mate::workflows::qualification::{
    filter_units, parse_tree_csv, ProgressSummary, QualificationTreeLoader,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEMO_ROSTER_CSV: &str = "\
employee_id,name,role,email
emp-001,Sam Carter,Approved Electrician,sam@sparks.test
emp-002,Priya Shah,Apprentice,
emp-003,Tom Okafor,Electrical Supervisor,tom@sparks.test
";

#[derive(Args, Debug)]
pub(crate) struct ProgressArgs {
    /// Qualification export with unit_code,unit_title,lo_number,lo_text,ac_full_ref,ac_text columns
    #[arg(long)]
    pub(crate) tree: PathBuf,
    /// Evidenced criteria references, comma separated (e.g. 1.1a,1.1b)
    #[arg(long, value_delimiter = ',')]
    pub(crate) completed: Vec<String>,
    /// Only report units matching this search text
    #[arg(long)]
    pub(crate) filter: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CredentialStatusArgs {
    /// Expiry date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub(crate) expiry: String,
    /// Evaluation date (defaults to now)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days before expiry that a training record shows a warning
    #[arg(long)]
    pub(crate) warning_days: Option<i64>,
    /// Days before expiry that an ECS card shows as expiring
    #[arg(long)]
    pub(crate) ecs_days: Option<i64>,
}

#[derive(Args, Debug)]
pub(crate) struct BulkCreateArgs {
    /// Roster CSV with employee_id,name,role,email columns
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Issue date used for Elec-ID numbering (defaults to now)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Analysis endpoint to call; without one the review step has no suggestions.
    #[arg(long)]
    pub(crate) analysis_endpoint: Option<String>,
}

pub(crate) fn run_progress(args: ProgressArgs) -> Result<(), AppError> {
    let ProgressArgs {
        tree,
        completed,
        filter,
    } = args;

    let tree = parse_tree_csv(File::open(&tree)?)?;
    let total_acs = tree.total_acs();
    let mut units = tree.into_units();
    if let Some(query) = filter.as_deref() {
        units = filter_units(&units, query);
    }

    println!("Qualification progress");
    println!("- {} units | {} assessment criteria", units.len(), total_acs);
    render_progress(&ProgressSummary::for_units(&units, &completed));
    Ok(())
}

pub(crate) fn run_credential_status(args: CredentialStatusArgs) -> Result<(), AppError> {
    let CredentialStatusArgs {
        expiry,
        today,
        warning_days,
        ecs_days,
    } = args;

    let defaults = StatusThresholds::default();
    let thresholds = StatusThresholds {
        cert_warning_days: warning_days.unwrap_or(defaults.cert_warning_days),
        ecs_expiring_days: ecs_days.unwrap_or(defaults.ecs_expiring_days),
    };
    let now = instant_for(today);

    println!("Credential status for expiry {expiry}");
    match days_until_raw(Some(&expiry), now) {
        Some(days) => println!("- {days} days until expiry"),
        None => println!("- expiry could not be parsed; treated as no expiry"),
    }
    println!(
        "- training/certification: {}",
        cert_status(Some(&expiry), now, &thresholds).label()
    );
    println!(
        "- ECS card: {}",
        ecs_status(Some(&expiry), now, &thresholds).label()
    );
    Ok(())
}

pub(crate) fn run_bulk_create(args: BulkCreateArgs) -> Result<(), AppError> {
    let BulkCreateArgs { roster, today } = args;

    let service = ElecIdService::new(
        Arc::new(InMemoryElecIdRepository::default()),
        StatusThresholds::default(),
    );
    let imported = service.import_roster(File::open(&roster)?)?;
    let report = service.create_for_all(instant_for(today))?;

    println!("Elec-ID bulk creation ({imported} employees on roster)");
    render_bulk_report(&report);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        analysis_endpoint,
    } = args;
    let now = instant_for(today);

    println!("Elec-Mate demo");

    let loader = QualificationTreeLoader::new(Arc::new(InMemoryQualificationRepository::seeded()?));
    let qualification = sample_qualification();
    let view = loader.load(Some(&qualification.code))?;
    println!(
        "\nQualification {} ({}, level {}): {} units, {} criteria",
        qualification.code,
        qualification.awarding_body,
        qualification.level,
        view.units.len(),
        view.total_acs
    );

    let analyzer = ConfiguredAnalyzer::from_config(&AnalysisConfig {
        endpoint: analysis_endpoint,
        timeout: Duration::from_secs(10),
    });
    let analysis_enabled = analyzer.is_enabled();
    let evidence_config = EvidenceConfig::default();
    let storage = InMemoryEvidenceStorage::new(evidence_config.public_base_url.clone());
    let evidence = EvidenceCaptureService::new(
        Arc::new(storage.clone()),
        Arc::new(analyzer),
        Arc::new(InMemoryEvidenceRepository::default()),
        &evidence_config,
    );

    let user_id = "apprentice-demo";
    let mut wizard = evidence.start();
    let uploaded = evidence
        .upload(
            &mut wizard,
            user_id,
            EvidenceUpload {
                file_name: "consumer-unit.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
            },
        )
        .await?;
    println!("\nEvidence capture");
    println!("- uploaded {} ({} stored objects)", uploaded.file_url, storage.len());

    wizard
        .apply(WizardEvent::DetailsEdited {
            title: "Consumer unit isolation".to_string(),
            description: "Safe isolation and bonding check before a board change".to_string(),
        })
        .map_err(EvidenceServiceError::from)?;
    let step = evidence.analyze(&mut wizard).await?;
    render_review(&wizard, analysis_enabled);
    println!("- wizard now at the {} step", step.label());

    for code in ["1.1a", "2.3b"] {
        wizard
            .accept_ksb(code)
            .map_err(EvidenceServiceError::from)?;
    }
    let record = evidence.save(&wizard, user_id)?;
    println!(
        "- saved evidence {} covering {}",
        record.id,
        record.assessment_criteria_met.join(", ")
    );

    let completed = evidence.completed_refs(user_id)?;
    render_progress(&ProgressSummary::for_units(&view.units, &completed));

    let elec_id = ElecIdService::new(
        Arc::new(InMemoryElecIdRepository::default()),
        StatusThresholds::default(),
    );
    elec_id.import_roster(DEMO_ROSTER_CSV.as_bytes())?;
    let ecs_expiry = (now + chrono::Duration::days(45)).date_naive().to_string();
    elec_id.create_for_employee(
        NewElecId {
            ecs_card_type: Some("Gold Card".to_string()),
            ecs_card_number: Some("ECS-448812".to_string()),
            ecs_expiry_date: Some(ecs_expiry),
            ..NewElecId::for_employee("emp-001")
        },
        now,
    )?;

    println!("\nElec-ID bulk creation");
    render_bulk_report(&elec_id.create_for_all(now)?);

    let expiring = elec_id.expiring_within(elec_id.thresholds().ecs_expiring_days, now)?;
    println!("ECS cards expiring soon: {}", expiring.len());
    for card in &expiring {
        println!(
            "  - {} ({}) expires {} in {} days",
            card.elec_id_number,
            card.employee_id,
            card.ecs_expiry_date,
            card.days_until
        );
    }

    let view = elec_id.profile_view("emp-001", now)?;
    println!(
        "Profile {} for {}: ECS {}",
        view.elec_id_number,
        view.employee_name.as_deref().unwrap_or("unknown"),
        view.ecs_card.status.label()
    );

    Ok(())
}

fn render_review(wizard: &EvidenceWizard, analysis_enabled: bool) {
    match &wizard.data().analysis {
        Some(analysis) => {
            println!(
                "- {} criteria and {} tag suggestions (quality {}%)",
                analysis.ksb_suggestions.len(),
                analysis.tag_suggestions.len(),
                analysis.quality_assessment.score.rounded()
            );
            println!(
                "- auto-selected: {}",
                wizard.data().selected_ksbs.iter().collect::<Vec<_>>().join(", ")
            );
        }
        None if analysis_enabled => println!("- analysis failed; reviewing without suggestions"),
        None => println!("- no analysis endpoint configured; reviewing without suggestions"),
    }
}

fn render_progress(summary: &ProgressSummary) {
    println!("Progress: {}% ({})", summary.percent, summary.label);
    for unit in &summary.units {
        println!(
            "  - unit {}: {}/{} ({}%)",
            unit.unit_code, unit.completed, unit.total, unit.percent
        );
    }
}

fn render_bulk_report(report: &BulkCreationReport) {
    println!(
        "- {} created | {} skipped | {} failed",
        report.created(),
        report.skipped(),
        report.failed()
    );
    for result in &report.results {
        match result {
            BulkItemResult::Created {
                employee_id,
                elec_id_number,
            } => println!("  - {employee_id}: created {elec_id_number}"),
            BulkItemResult::Skipped {
                employee_id,
                elec_id_number,
            } => println!("  - {employee_id}: already holds {elec_id_number}"),
            BulkItemResult::Failed {
                employee_id,
                reason,
            } => println!("  - {employee_id}: failed ({reason})"),
        }
    }
}
