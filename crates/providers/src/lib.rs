//! Remote destinations for finished images.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod github;
pub mod noop;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("missing credential: set {0}")]
    MissingCredential(String),
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("remote rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One file to place at `path` in the destination repository.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: String,
    pub message: String,
    pub branch: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub path: String,
    pub sha: Option<String>,
    pub html_url: Option<String>,
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError>;
}
