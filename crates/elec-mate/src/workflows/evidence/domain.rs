use serde::{Deserialize, Serialize};

use super::selection::SelectionSet;

/// Kind of evidence captured; file uploads are classified from their MIME type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    Image,
    #[default]
    Document,
    Video,
    Text,
}

impl EvidenceType {
    pub const fn label(self) -> &'static str {
        match self {
            EvidenceType::Image => "image",
            EvidenceType::Document => "document",
            EvidenceType::Video => "video",
            EvidenceType::Text => "text",
        }
    }
}

/// A value in `0..=100`, kept exactly as received so threshold checks see the raw figure.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percent(f64);

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("percentage {0} is outside 0..=100")]
pub struct PercentOutOfRange(pub f64);

impl Percent {
    /// Default confidence at which suggestions are selected without user action.
    pub const AUTO_SELECT_DEFAULT: Percent = Percent(80.0);

    pub fn new(value: f64) -> Result<Self, PercentOutOfRange> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(PercentOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Nearest whole percentage, for display and summary fields.
    pub fn rounded(self) -> u8 {
        self.0.round() as u8
    }
}

impl TryFrom<f64> for Percent {
    type Error = PercentOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for f64 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KsbSuggestion {
    pub code: String,
    #[serde(default)]
    pub category: String,
    pub confidence: Percent,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub tag: String,
    pub confidence: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: Percent,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Suggestions returned by the remote analysis endpoint. Never modified after receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIAnalysisResult {
    #[serde(default)]
    pub ksb_suggestions: Vec<KsbSuggestion>,
    #[serde(default)]
    pub tag_suggestions: Vec<TagSuggestion>,
    pub quality_assessment: QualityAssessment,
    #[serde(default)]
    pub detected_content: serde_json::Value,
}

/// Everything the capture wizard accumulates for one piece of evidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCaptureData {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub selected_ksbs: SelectionSet,
    #[serde(default)]
    pub selected_tags: SelectionSet,
    #[serde(default)]
    pub analysis: Option<AIAnalysisResult>,
}

impl EvidenceCaptureData {
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn accept_ksb(&mut self, code: &str) -> bool {
        self.selected_ksbs.insert(code)
    }

    pub fn reject_ksb(&mut self, code: &str) -> bool {
        self.selected_ksbs.remove(code)
    }

    pub fn accept_tag(&mut self, tag: &str) -> bool {
        self.selected_tags.insert(tag)
    }

    pub fn reject_tag(&mut self, tag: &str) -> bool {
        self.selected_tags.remove(tag)
    }

    /// Replaces both selections with every suggestion from the analysis. Manual selections
    /// made beforehand are discarded, not merged. No-op without an analysis.
    pub fn accept_all(&mut self) -> bool {
        let Some(analysis) = &self.analysis else {
            return false;
        };

        self.selected_ksbs.replace_all(
            analysis
                .ksb_suggestions
                .iter()
                .map(|suggestion| suggestion.code.clone()),
        );
        self.selected_tags.replace_all(
            analysis
                .tag_suggestions
                .iter()
                .map(|suggestion| suggestion.tag.clone()),
        );
        true
    }

    /// Stores the analysis and adds suggestions at or above `threshold` to the selections.
    pub fn merge_analysis(&mut self, analysis: AIAnalysisResult, threshold: Percent) {
        self.selected_ksbs.extend(
            analysis
                .ksb_suggestions
                .iter()
                .filter(|suggestion| suggestion.confidence >= threshold)
                .map(|suggestion| suggestion.code.clone()),
        );
        self.selected_tags.extend(
            analysis
                .tag_suggestions
                .iter()
                .filter(|suggestion| suggestion.confidence >= threshold)
                .map(|suggestion| suggestion.tag.clone()),
        );
        self.analysis = Some(analysis);
    }
}
