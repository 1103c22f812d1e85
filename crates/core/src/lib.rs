//! Core library: image intake, dimension decoding, tag derivation, record store.

pub mod config;
pub mod decoder;
pub mod format;
pub mod intake;
pub mod models;
pub mod preview;
pub mod store;
pub mod tags;
pub mod upload;

pub use models::{Dimensions, ImageMetadata, ImageRecord, RecordId, SourceFile, TagSet};
pub use store::{BatchReport, ImageRecordStore};
