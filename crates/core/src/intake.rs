//! Turns filesystem paths into raw file handles for the record store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::IntakeConfig;
use crate::models::SourceFile;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("no such file or directory: {0:?}")]
    NotFound(PathBuf),
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Expands files and directories into a sorted list of file paths.
/// Fails on the first root that does not exist.
pub fn collect(roots: &[PathBuf], cfg: &IntakeConfig) -> Result<Vec<PathBuf>, IntakeError> {
    let excludes = build_globset(&cfg.exclude)?;
    if let Some(missing) = roots.iter().find(|root| !root.exists()) {
        return Err(IntakeError::NotFound(missing.clone()));
    }
    let mut files = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || should_descend(e.path(), cfg.include_hidden, &excludes)
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && !excludes.is_match(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Reads a file and its attributes. The MIME type is sniffed from content,
/// falling back to the extension.
pub async fn load(path: &Path) -> Result<SourceFile, IntakeError> {
    let io_err = |source: std::io::Error| IntakeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = tokio::fs::metadata(path).await.map_err(io_err)?;
    let data = tokio::fs::read(path).await.map_err(io_err)?;
    let last_modified = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let mime = infer::get(&data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| guess_mime(path).to_string());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    Ok(SourceFile {
        name,
        size: meta.len(),
        mime,
        last_modified,
        bytes: Bytes::from(data),
    })
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "txt" | "md" | "log" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, IntakeError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| IntakeError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| IntakeError::Pattern {
        pattern: patterns.join(","),
        source,
    })
}

fn should_descend(path: &Path, include_hidden: bool, excludes: &GlobSet) -> bool {
    if excludes.is_match(path) {
        return false;
    }
    include_hidden || !is_hidden(path)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
