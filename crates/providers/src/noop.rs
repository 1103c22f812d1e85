use crate::{UploadError, UploadReceipt, UploadRequest, Uploader};
use tracing::info;

/// Logs the request instead of sending it.
#[derive(Debug, Default)]
pub struct NoopUploader;

#[async_trait::async_trait]
impl Uploader for NoopUploader {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt, UploadError> {
        info!(
            path = %request.path,
            branch = %request.branch,
            bytes = request.content.len(),
            "dry run, not uploading"
        );
        Ok(UploadReceipt {
            path: request.path.clone(),
            sha: None,
            html_url: None,
        })
    }
}
