use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::EvidenceType;

/// Object storage for uploaded evidence files.
#[async_trait]
pub trait EvidenceStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL of the stored object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, StorageError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("storage rejected upload: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("file is empty")]
    Empty,
    #[error("unrecognised content type '{0}'")]
    InvalidContentType(String),
    #[error("invalid user id '{0}'")]
    InvalidUser(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct EvidenceUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EvidenceUpload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Checks size limits and classifies the file.
    pub fn validate(&self, max_bytes: u64) -> Result<EvidenceType, UploadError> {
        let size = self.size();
        if size > max_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: max_bytes,
            });
        }
        if size == 0 {
            return Err(UploadError::Empty);
        }
        sniff_evidence_type(&self.content_type)
    }
}

/// The stored file as recorded on the capture data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedEvidence {
    pub file_url: String,
    pub storage_key: String,
    pub file_name: String,
    pub evidence_type: EvidenceType,
}

/// `image/*` and `video/*` map to their own kinds; everything else is a document.
pub fn sniff_evidence_type(content_type: &str) -> Result<EvidenceType, UploadError> {
    let parsed: mime::Mime = content_type
        .trim()
        .parse()
        .map_err(|_| UploadError::InvalidContentType(content_type.to_string()))?;

    let kind = if parsed.type_() == mime::IMAGE {
        EvidenceType::Image
    } else if parsed.type_() == mime::VIDEO {
        EvidenceType::Video
    } else {
        EvidenceType::Document
    };
    Ok(kind)
}

/// `{user_id}/temp/{random_id}.{ext}`
pub fn storage_key(
    user_id: &str,
    file_name: &str,
    content_type: &str,
    random_id: Uuid,
) -> Result<String, UploadError> {
    let user_id = user_id.trim();
    if user_id.is_empty() || user_id.contains('/') || user_id.contains("..") {
        return Err(UploadError::InvalidUser(user_id.to_string()));
    }

    let extension = file_extension(file_name, content_type);
    Ok(format!("{user_id}/temp/{random_id}.{extension}"))
}

fn file_extension(file_name: &str, content_type: &str) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type.trim())
                .and_then(|extensions| extensions.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}
