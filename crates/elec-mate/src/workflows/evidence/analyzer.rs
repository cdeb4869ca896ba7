use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{AIAnalysisResult, EvidenceCaptureData, EvidenceType};

/// Payload sent to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub evidence_url: String,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub description: String,
}

impl AnalysisRequest {
    pub fn from_capture(data: &EvidenceCaptureData) -> Self {
        Self {
            evidence_url: data.file_url.clone().unwrap_or_default(),
            evidence_type: data.evidence_type,
            title: data.title.trim().to_string(),
            description: data.description.trim().to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no analysis endpoint configured")]
    NotConfigured,
    #[error("analysis request failed: {0}")]
    Transport(String),
    #[error("analysis endpoint returned status {0}")]
    Status(u16),
    #[error("analysis response could not be decoded: {0}")]
    Decode(String),
}

/// Remote evidence tagging. One call per analysis; callers do not retry.
#[async_trait]
pub trait EvidenceAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError>;
}

/// Stand-in used when no endpoint is configured; every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAnalyzer;

#[async_trait]
impl EvidenceAnalyzer for DisabledAnalyzer {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError> {
        Err(AnalysisError::NotConfigured)
    }
}

/// JSON-over-HTTP client for the analysis endpoint.
pub struct HttpEvidenceAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEvidenceAnalyzer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EvidenceAnalyzer for HttpEvidenceAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AIAnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AnalysisError::Transport(err.to_string()))?;
        decode_response(&body)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisEnvelope {
    Wrapped { analysis: AIAnalysisResult },
    Bare(AIAnalysisResult),
}

/// Accepts either the bare result or `{ "analysis": result }`.
pub(crate) fn decode_response(body: &[u8]) -> Result<AIAnalysisResult, AnalysisError> {
    let envelope: AnalysisEnvelope =
        serde_json::from_slice(body).map_err(|err| AnalysisError::Decode(err.to_string()))?;

    Ok(match envelope {
        AnalysisEnvelope::Wrapped { analysis } => analysis,
        AnalysisEnvelope::Bare(analysis) => analysis,
    })
}
