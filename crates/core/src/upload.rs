//! Pushes a single image to the configured repository.

use anyhow::Context;
use providers::github::{GithubConfig, GithubUploader};
use providers::noop::NoopUploader;
use providers::{UploadError, UploadReceipt, UploadRequest, Uploader};
use std::sync::Arc;
use tracing::info;

use crate::config::UploadConfig;
use crate::models::SourceFile;

/// The token is read from the environment variable named by `token_env`.
pub fn build_uploader(cfg: &UploadConfig, dry_run: bool) -> anyhow::Result<Arc<dyn Uploader>> {
    if dry_run {
        return Ok(Arc::new(NoopUploader));
    }
    let repo = cfg
        .repo
        .clone()
        .context("upload.repo is not configured")?;
    let token = std::env::var(&cfg.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| UploadError::MissingCredential(cfg.token_env.clone()))?;
    Ok(Arc::new(GithubUploader::new(GithubConfig {
        api_base: cfg.api_base.clone(),
        repo,
        token,
    })))
}

pub fn request_for(file: &SourceFile, cfg: &UploadConfig) -> Result<UploadRequest, UploadError> {
    if !file.is_image() {
        return Err(UploadError::NotAnImage(file.name.clone()));
    }
    let prefix = cfg.path_prefix.trim_matches('/');
    let path = if prefix.is_empty() {
        file.name.clone()
    } else {
        format!("{prefix}/{}", file.name)
    };
    Ok(UploadRequest {
        path,
        message: format!("Add {}", file.name),
        branch: cfg.branch.clone(),
        content: file.bytes.clone(),
    })
}

pub async fn upload_file(
    uploader: &dyn Uploader,
    file: &SourceFile,
    cfg: &UploadConfig,
) -> Result<UploadReceipt, UploadError> {
    let request = request_for(file, cfg)?;
    info!(name = %file.name, path = %request.path, "uploading");
    uploader.upload(&request).await
}

/// Validates the file, then builds the uploader and sends it. A non-image is
/// rejected as `UploadError::NotAnImage` before any credential is looked up.
pub async fn upload_source(
    cfg: &UploadConfig,
    file: &SourceFile,
    dry_run: bool,
) -> anyhow::Result<UploadReceipt> {
    request_for(file, cfg)?;
    let uploader = build_uploader(cfg, dry_run)?;
    Ok(upload_file(uploader.as_ref(), file, cfg).await?)
}
