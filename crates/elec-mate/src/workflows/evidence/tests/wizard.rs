use super::common::*;

use crate::workflows::evidence::{
    transition, AIAnalysisResult, EvidenceCaptureData, EvidenceType, EvidenceWizard, WizardError,
    WizardEvent, WizardSnapshot, WizardStep,
};
use serde_json::json;

fn wizard_at_details(title: &str) -> EvidenceWizard {
    let mut wizard = EvidenceWizard::new(percent(80.0));
    wizard
        .apply(WizardEvent::FileUploaded(uploaded()))
        .expect("upload accepted at capture");
    wizard
        .apply(WizardEvent::DetailsEdited {
            title: title.to_string(),
            description: "Replaced a split-load board".to_string(),
        })
        .expect("details editable");
    wizard
}

#[test]
fn capture_cannot_jump_straight_to_review() {
    let error = transition(WizardStep::Capture, &WizardEvent::AnalysisFinished(None))
        .expect_err("capture to review is illegal");
    assert!(matches!(
        error,
        WizardError::InvalidTransition {
            from: WizardStep::Capture,
            event: "analysis_finished"
        }
    ));
    assert!(transition(WizardStep::Capture, &WizardEvent::Analyze).is_err());
    assert!(transition(WizardStep::Review, &WizardEvent::Analyze).is_err());
}

#[test]
fn legal_transitions_follow_the_capture_flow() {
    let cases = [
        (WizardStep::Capture, WizardEvent::FileUploaded(uploaded()), WizardStep::Details),
        (WizardStep::Capture, WizardEvent::TextEntered, WizardStep::Details),
        (WizardStep::Capture, WizardEvent::UploadFailed("too big".into()), WizardStep::Capture),
        (WizardStep::Details, WizardEvent::Analyze, WizardStep::Analyze),
        (WizardStep::Details, WizardEvent::BackToCapture, WizardStep::Capture),
        (WizardStep::Analyze, WizardEvent::AnalysisFinished(None), WizardStep::Review),
        (WizardStep::Review, WizardEvent::EditDetails, WizardStep::Details),
    ];
    for (from, event, expected) in cases {
        assert_eq!(transition(from, &event).expect("legal"), expected, "{from:?} + {event:?}");
    }
}

#[test]
fn upload_failure_keeps_capture_and_records_the_error() {
    let mut wizard = EvidenceWizard::new(percent(80.0));
    let step = wizard
        .apply(WizardEvent::UploadFailed("file is too large".to_string()))
        .expect("failure handled at capture");

    assert_eq!(step, WizardStep::Capture);
    assert_eq!(wizard.last_error(), Some("file is too large"));
    assert!(wizard.data().file_url.is_none());
}

#[test]
fn analyze_with_blank_title_is_a_no_op() {
    let mut wizard = wizard_at_details("   ");
    let step = wizard.apply(WizardEvent::Analyze).expect("guarded");
    assert_eq!(step, WizardStep::Details);
    assert_eq!(wizard.step(), WizardStep::Details);
}

#[test]
fn successful_analysis_auto_selects_confident_suggestions() {
    let mut wizard = wizard_at_details("Consumer unit change");
    assert_eq!(wizard.apply(WizardEvent::Analyze).unwrap(), WizardStep::Analyze);
    wizard
        .apply(WizardEvent::AnalysisFinished(Some(sample_analysis())))
        .expect("analysis merges");

    assert_eq!(wizard.step(), WizardStep::Review);
    assert_eq!(wizard.data().selected_ksbs.to_vec(), vec!["1.1a", "2.3a"]);
    assert_eq!(wizard.data().selected_tags.to_vec(), vec!["isolation"]);
    assert!(wizard.data().analysis.is_some());
}

#[test]
fn auto_selection_compares_unrounded_confidence() {
    let analysis: AIAnalysisResult = serde_json::from_value(json!({
        "ksb_suggestions": [
            {"code": "1.1a", "confidence": 79.5},
            {"code": "2.3a", "confidence": 80},
            {"code": "2.3b", "confidence": 80.0},
            {"code": "3.1a", "confidence": 79.99}
        ],
        "tag_suggestions": [
            {"tag": "isolation", "confidence": 79.6},
            {"tag": "testing", "confidence": 80.0}
        ],
        "quality_assessment": {"score": 79.5}
    }))
    .expect("analysis decodes");

    let mut wizard = wizard_at_details("Consumer unit change");
    wizard.apply(WizardEvent::Analyze).unwrap();
    wizard
        .apply(WizardEvent::AnalysisFinished(Some(analysis)))
        .expect("analysis merges");

    assert_eq!(wizard.data().selected_ksbs.to_vec(), vec!["2.3a", "2.3b"]);
    assert_eq!(wizard.data().selected_tags.to_vec(), vec!["testing"]);
    let stored = wizard.data().analysis.as_ref().expect("analysis kept");
    assert_eq!(stored.ksb_suggestions[0].confidence.value(), 79.5);
    assert_eq!(stored.quality_assessment.score.value(), 79.5);
}

#[test]
fn failed_analysis_still_reaches_review_without_suggestions() {
    let mut wizard = wizard_at_details("Consumer unit change");
    wizard.apply(WizardEvent::Analyze).unwrap();
    let step = wizard.apply(WizardEvent::AnalysisFinished(None)).unwrap();

    assert_eq!(step, WizardStep::Review);
    assert!(wizard.data().analysis.is_none());
    assert!(wizard.data().selected_ksbs.is_empty());
}

#[test]
fn selections_are_locked_outside_details_and_review() {
    let mut wizard = EvidenceWizard::new(percent(80.0));
    assert!(matches!(
        wizard.accept_ksb("1.1a"),
        Err(WizardError::NotEditable(WizardStep::Capture))
    ));
}

#[test]
fn complete_only_from_review() {
    let wizard = wizard_at_details("Consumer unit change");
    assert!(matches!(
        wizard.clone().complete(),
        Err(WizardError::NotReady(WizardStep::Details))
    ));

    let mut wizard = wizard;
    wizard.apply(WizardEvent::Analyze).unwrap();
    wizard.apply(WizardEvent::AnalysisFinished(None)).unwrap();
    let data = wizard.complete().expect("review completes");
    assert_eq!(data.title, "Consumer unit change");
    assert_eq!(data.evidence_type, EvidenceType::Image);
}

#[test]
fn back_to_capture_keeps_details_for_reupload() {
    let mut wizard = wizard_at_details("Consumer unit change");
    wizard.apply(WizardEvent::BackToCapture).unwrap();
    assert_eq!(wizard.step(), WizardStep::Capture);
    assert_eq!(wizard.data().title, "Consumer unit change");
    wizard.cancel();
}

#[test]
fn restore_rejects_inconsistent_snapshots() {
    let missing_file = WizardSnapshot {
        step: WizardStep::Details,
        data: EvidenceCaptureData::default(),
        last_error: None,
    };
    assert!(matches!(
        EvidenceWizard::restore(missing_file, percent(80.0)),
        Err(WizardError::InconsistentSnapshot(_))
    ));

    let in_flight = WizardSnapshot {
        step: WizardStep::Analyze,
        ..wizard_at_details("Board").snapshot()
    };
    assert!(EvidenceWizard::restore(in_flight, percent(80.0)).is_err());

    let untitled_review = WizardSnapshot {
        step: WizardStep::Review,
        ..wizard_at_details("").snapshot()
    };
    assert!(EvidenceWizard::restore(untitled_review, percent(80.0)).is_err());
}

#[test]
fn text_entry_moves_to_details_without_a_file() {
    let mut wizard = EvidenceWizard::new(percent(80.0));
    wizard
        .apply(WizardEvent::UploadFailed("file is too large".to_string()))
        .unwrap();

    let step = wizard.apply(WizardEvent::TextEntered).expect("text accepted at capture");

    assert_eq!(step, WizardStep::Details);
    assert_eq!(wizard.data().evidence_type, EvidenceType::Text);
    assert!(wizard.data().file_url.is_none());
    assert!(wizard.last_error().is_none());
    assert!(matches!(
        wizard.apply(WizardEvent::TextEntered),
        Err(WizardError::InvalidTransition {
            from: WizardStep::Details,
            event: "text_entered"
        })
    ));
}

#[test]
fn text_entry_after_back_to_capture_drops_the_file() {
    let mut wizard = wizard_at_details("Consumer unit change");
    wizard.apply(WizardEvent::BackToCapture).unwrap();
    wizard.apply(WizardEvent::TextEntered).unwrap();

    assert_eq!(wizard.data().evidence_type, EvidenceType::Text);
    assert!(wizard.data().file_url.is_none());
    assert!(wizard.data().storage_key.is_none());
    assert_eq!(wizard.data().title, "Consumer unit change");
}

#[test]
fn restore_allows_text_evidence_without_a_file() {
    let snapshot = WizardSnapshot {
        step: WizardStep::Details,
        data: EvidenceCaptureData {
            title: "Reflective account".to_string(),
            evidence_type: EvidenceType::Text,
            ..EvidenceCaptureData::default()
        },
        last_error: None,
    };
    let wizard = EvidenceWizard::restore(snapshot.clone(), percent(80.0)).expect("text restores");
    assert_eq!(wizard.snapshot(), snapshot);

    let mut entered = EvidenceWizard::new(percent(80.0));
    entered.apply(WizardEvent::TextEntered).unwrap();
    assert!(EvidenceWizard::restore(entered.snapshot(), percent(80.0)).is_ok());
}

#[test]
fn snapshot_survives_json() {
    let wizard = wizard_at_details("Consumer unit change");
    let json = serde_json::to_string(&wizard.snapshot()).expect("serialises");
    let back: WizardSnapshot = serde_json::from_str(&json).expect("deserialises");
    let restored = EvidenceWizard::restore(back, percent(80.0)).expect("restores");
    assert_eq!(restored.step(), WizardStep::Details);
    assert_eq!(restored.data(), wizard.data());
}
