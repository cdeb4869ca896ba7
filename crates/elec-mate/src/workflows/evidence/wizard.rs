use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AIAnalysisResult, EvidenceCaptureData, EvidenceType, Percent};
use super::upload::UploadedEvidence;

/// Steps of the capture wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Capture,
    Details,
    Analyze,
    Review,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::Capture => "capture",
            WizardStep::Details => "details",
            WizardStep::Analyze => "analyze",
            WizardStep::Review => "review",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    FileUploaded(UploadedEvidence),
    /// Written evidence with no file; moves to `Details` as text evidence.
    TextEntered,
    UploadFailed(String),
    DetailsEdited { title: String, description: String },
    Analyze,
    AnalysisFinished(Option<AIAnalysisResult>),
    BackToCapture,
    EditDetails,
}

impl WizardEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            WizardEvent::FileUploaded(_) => "file_uploaded",
            WizardEvent::TextEntered => "text_entered",
            WizardEvent::UploadFailed(_) => "upload_failed",
            WizardEvent::DetailsEdited { .. } => "details_edited",
            WizardEvent::Analyze => "analyze",
            WizardEvent::AnalysisFinished(_) => "analysis_finished",
            WizardEvent::BackToCapture => "back_to_capture",
            WizardEvent::EditDetails => "edit_details",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("cannot handle '{event}' while at the {} step", .from.label())]
    InvalidTransition {
        from: WizardStep,
        event: &'static str,
    },
    #[error("selections cannot be changed at the {} step", .0.label())]
    NotEditable(WizardStep),
    #[error("evidence can only be completed from the review step (currently at {})", .0.label())]
    NotReady(WizardStep),
    #[error("inconsistent wizard snapshot: {0}")]
    InconsistentSnapshot(&'static str),
}

/// Legal moves of the wizard. Anything not listed is rejected.
pub fn transition(from: WizardStep, event: &WizardEvent) -> Result<WizardStep, WizardError> {
    use WizardEvent as E;
    use WizardStep as S;

    let next = match (from, event) {
        (S::Capture, E::FileUploaded(_)) => S::Details,
        (S::Capture, E::TextEntered) => S::Details,
        (S::Capture, E::UploadFailed(_)) => S::Capture,
        (S::Details, E::DetailsEdited { .. }) => S::Details,
        (S::Details, E::Analyze) => S::Analyze,
        (S::Details, E::BackToCapture) => S::Capture,
        (S::Analyze, E::AnalysisFinished(_)) => S::Review,
        (S::Review, E::EditDetails) => S::Details,
        _ => {
            return Err(WizardError::InvalidTransition {
                from,
                event: event.name(),
            })
        }
    };
    Ok(next)
}

/// Serializable position of a wizard, for clients that hold the state between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub data: EvidenceCaptureData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Capture wizard owning its in-progress data. Completing or cancelling consumes it.
#[derive(Debug, Clone)]
pub struct EvidenceWizard {
    step: WizardStep,
    data: EvidenceCaptureData,
    last_error: Option<String>,
    auto_select: Percent,
}

impl EvidenceWizard {
    pub fn new(auto_select: Percent) -> Self {
        Self {
            step: WizardStep::Capture,
            data: EvidenceCaptureData::default(),
            last_error: None,
            auto_select,
        }
    }

    /// Rebuilds a wizard from a snapshot, refusing positions the wizard could not have reached.
    pub fn restore(snapshot: WizardSnapshot, auto_select: Percent) -> Result<Self, WizardError> {
        let WizardSnapshot {
            step,
            data,
            last_error,
        } = snapshot;

        if step != WizardStep::Capture
            && data.file_url.is_none()
            && data.evidence_type != EvidenceType::Text
        {
            return Err(WizardError::InconsistentSnapshot(
                "no uploaded file past the capture step",
            ));
        }
        if step == WizardStep::Analyze {
            return Err(WizardError::InconsistentSnapshot(
                "an in-flight analysis cannot be resumed",
            ));
        }
        if step == WizardStep::Review && !data.has_title() {
            return Err(WizardError::InconsistentSnapshot(
                "review step reached without a title",
            ));
        }

        Ok(Self {
            step,
            data,
            last_error,
            auto_select,
        })
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            step: self.step,
            data: self.data.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn data(&self) -> &EvidenceCaptureData {
        &self.data
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies an event and returns the resulting step.
    ///
    /// `Analyze` with a blank title is ignored and the wizard stays at `Details`.
    pub fn apply(&mut self, event: WizardEvent) -> Result<WizardStep, WizardError> {
        if matches!(event, WizardEvent::Analyze)
            && self.step == WizardStep::Details
            && !self.data.has_title()
        {
            debug!("analyze ignored: evidence title is blank");
            return Ok(self.step);
        }

        let next = transition(self.step, &event)?;

        match event {
            WizardEvent::FileUploaded(uploaded) => {
                self.data.file_url = Some(uploaded.file_url);
                self.data.storage_key = Some(uploaded.storage_key);
                self.data.file_name = Some(uploaded.file_name);
                self.data.evidence_type = uploaded.evidence_type;
                self.last_error = None;
            }
            WizardEvent::TextEntered => {
                self.data.file_url = None;
                self.data.storage_key = None;
                self.data.file_name = None;
                self.data.evidence_type = EvidenceType::Text;
                self.last_error = None;
            }
            WizardEvent::UploadFailed(reason) => {
                self.last_error = Some(reason);
            }
            WizardEvent::DetailsEdited { title, description } => {
                self.data.title = title;
                self.data.description = description;
            }
            WizardEvent::AnalysisFinished(Some(result)) => {
                self.data.merge_analysis(result, self.auto_select);
            }
            WizardEvent::AnalysisFinished(None) => {
                self.data.analysis = None;
            }
            WizardEvent::Analyze | WizardEvent::BackToCapture | WizardEvent::EditDetails => {}
        }

        self.step = next;
        Ok(next)
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Details | WizardStep::Review => Ok(()),
            other => Err(WizardError::NotEditable(other)),
        }
    }

    pub fn accept_ksb(&mut self, code: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.data.accept_ksb(code))
    }

    pub fn reject_ksb(&mut self, code: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.data.reject_ksb(code))
    }

    pub fn accept_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.data.accept_tag(tag))
    }

    pub fn reject_tag(&mut self, tag: &str) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.data.reject_tag(tag))
    }

    pub fn accept_all(&mut self) -> Result<bool, WizardError> {
        self.ensure_editable()?;
        Ok(self.data.accept_all())
    }

    /// Data ready to hand to the completion callback, without consuming the wizard.
    pub fn ready_data(&self) -> Result<&EvidenceCaptureData, WizardError> {
        match self.step {
            WizardStep::Review => Ok(&self.data),
            other => Err(WizardError::NotReady(other)),
        }
    }

    pub fn complete(self) -> Result<EvidenceCaptureData, WizardError> {
        self.ready_data()?;
        Ok(self.data)
    }

    /// Discards everything captured so far.
    pub fn cancel(self) {
        debug!(step = self.step.label(), "evidence capture cancelled");
    }
}
