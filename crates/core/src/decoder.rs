//! Reads intrinsic pixel dimensions from encoded image bytes.

use std::io::Cursor;

use image::io::Reader as ImageReader;
use thiserror::Error;

use crate::models::{Dimensions, SourceFile};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("corrupt image: {0}")]
    Corrupt(String),
    #[error("decode task failed: {0}")]
    Task(String),
}

#[async_trait::async_trait]
pub trait DimensionDecoder: Send + Sync {
    async fn dimensions(&self, file: &SourceFile) -> Result<Dimensions, DecodeError>;
}

/// Header-only decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

#[async_trait::async_trait]
impl DimensionDecoder for ImageDecoder {
    async fn dimensions(&self, file: &SourceFile) -> Result<Dimensions, DecodeError> {
        let bytes = file.bytes.clone();
        tokio::task::spawn_blocking(move || read_dimensions(&bytes))
            .await
            .map_err(|e| DecodeError::Task(e.to_string()))?
    }
}

pub fn read_dimensions(data: &[u8]) -> Result<Dimensions, DecodeError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::UnknownFormat);
    }
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
    Ok(Dimensions::new(width, height))
}
