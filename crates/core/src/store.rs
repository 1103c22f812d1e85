//! In-memory, ordered collection of image records.
//!
//! A batch goes through three steps: `begin_batch` filters the input and
//! reserves ids, `PendingBatch::resolve` decodes every file concurrently
//! without touching the store, and `commit` appends whatever decoded. Ids
//! removed while still pending are tombstoned and their records discarded on
//! commit, so a removal is never undone by a late decode.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::TagRules;
use crate::decoder::{DimensionDecoder, ImageDecoder};
use crate::format::{human_date, human_size};
use crate::models::{ImageMetadata, ImageRecord, RecordId, SourceFile};
use crate::preview::PreviewRegistry;
use crate::tags::derive_tags;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DecodeFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub added: Vec<RecordId>,
    /// Names of files rejected by the `image/` filter.
    pub skipped: Vec<String>,
    pub failed: Vec<DecodeFailure>,
    /// Decoded records whose id was removed before commit.
    pub discarded: Vec<RecordId>,
}

#[derive(Default)]
struct Reservations {
    pending: HashSet<RecordId>,
    tombstones: HashSet<RecordId>,
}

type SharedReservations = Arc<Mutex<Reservations>>;

fn lock(shared: &Mutex<Reservations>) -> MutexGuard<'_, Reservations> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ids reserved by one batch. Dropping it, committed or not, frees them.
struct Reservation {
    ids: Vec<RecordId>,
    shared: SharedReservations,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let mut res = lock(&self.shared);
        for id in &self.ids {
            res.pending.remove(id);
            res.tombstones.remove(id);
        }
    }
}

pub struct ImageRecordStore {
    records: Vec<ImageRecord>,
    next_id: u64,
    reservations: SharedReservations,
    previews: PreviewRegistry,
    rules: TagRules,
    decoder: Arc<dyn DimensionDecoder>,
}

impl Default for ImageRecordStore {
    fn default() -> Self {
        Self::new(TagRules::default())
    }
}

impl ImageRecordStore {
    pub fn new(rules: TagRules) -> Self {
        Self {
            records: Vec::new(),
            next_id: 0,
            reservations: SharedReservations::default(),
            previews: PreviewRegistry::new(),
            rules,
            decoder: Arc::new(ImageDecoder),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn DimensionDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_pending(&self, id: RecordId) -> bool {
        lock(&self.reservations).pending.contains(&id)
    }

    pub async fn add_batch<I>(&mut self, files: I) -> BatchReport
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let batch = self.begin_batch(files);
        let resolved = batch.resolve().await;
        self.commit(resolved)
    }

    /// Filters to `image/*` and reserves an id for every accepted file.
    pub fn begin_batch<I>(&mut self, files: I) -> PendingBatch
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        let mut res = lock(&self.reservations);
        for file in files {
            if !file.is_image() {
                debug!(name = %file.name, mime = %file.mime, "not an image, skipping");
                skipped.push(file.name);
                continue;
            }
            self.next_id += 1;
            let id = RecordId::new(self.next_id);
            res.pending.insert(id);
            entries.push((id, file));
        }
        drop(res);
        let reservation = Reservation {
            ids: entries.iter().map(|(id, _)| *id).collect(),
            shared: Arc::clone(&self.reservations),
        };
        PendingBatch {
            entries,
            reservation,
            skipped,
            decoder: Arc::clone(&self.decoder),
            rules: self.rules.clone(),
            previews: self.previews.clone(),
        }
    }

    /// Appends every decoded record of the batch in one step.
    pub fn commit(&mut self, batch: ResolvedBatch) -> BatchReport {
        let ResolvedBatch {
            outcomes,
            skipped,
            reservation,
        } = batch;
        let tombstoned: HashSet<RecordId> = {
            let res = lock(&self.reservations);
            reservation
                .ids
                .iter()
                .filter(|id| res.tombstones.contains(id))
                .copied()
                .collect()
        };
        // Releases the batch's ids before the records become visible.
        drop(reservation);

        let mut report = BatchReport {
            skipped,
            ..BatchReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Decoded(record) => {
                    let id = record.id;
                    if tombstoned.contains(&id) {
                        debug!(%id, "record removed while decoding, discarding");
                        record.preview.release();
                        report.discarded.push(id);
                    } else {
                        self.records.push(record);
                        report.added.push(id);
                    }
                }
                Outcome::Failed(failure) => {
                    report.failed.push(failure);
                }
            }
        }
        info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            discarded = report.discarded.len(),
            "batch committed"
        );
        report
    }

    /// Removes a record and releases its preview. A pending id is tombstoned.
    /// Returns false when the id is unknown.
    pub fn remove(&mut self, id: RecordId) -> bool {
        if let Some(idx) = self.records.iter().position(|r| r.id == id) {
            let record = self.records.remove(idx);
            record.preview.release();
            debug!(%id, "record removed");
            return true;
        }
        let mut res = lock(&self.reservations);
        if res.pending.contains(&id) {
            return res.tombstones.insert(id);
        }
        false
    }

    pub fn add_tag(&mut self, id: RecordId, tag: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => record.tags.insert(tag),
            None => false,
        }
    }

    pub fn remove_tag(&mut self, id: RecordId, tag: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => record.tags.remove(tag),
            None => false,
        }
    }
}

enum Outcome {
    Decoded(ImageRecord),
    Failed(DecodeFailure),
}

/// Accepted files with reserved ids, not yet decoded.
pub struct PendingBatch {
    entries: Vec<(RecordId, SourceFile)>,
    reservation: Reservation,
    skipped: Vec<String>,
    decoder: Arc<dyn DimensionDecoder>,
    rules: TagRules,
    previews: PreviewRegistry,
}

pub struct ResolvedBatch {
    outcomes: Vec<Outcome>,
    skipped: Vec<String>,
    reservation: Reservation,
}

impl PendingBatch {
    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Decodes every file concurrently. One failure never affects the others.
    pub async fn resolve(self) -> ResolvedBatch {
        let PendingBatch {
            entries,
            reservation,
            skipped,
            decoder,
            rules,
            previews,
        } = self;

        let decodes = entries.into_iter().map(|(id, file)| {
            let decoder = Arc::clone(&decoder);
            let rules = &rules;
            let previews = &previews;
            async move {
                match decoder.dimensions(&file).await {
                    Ok(dims) => {
                        let tags = derive_tags(&file, dims, rules);
                        let metadata = ImageMetadata {
                            name: file.name.clone(),
                            size: human_size(file.size),
                            mime: file.mime.clone(),
                            dimensions: dims.to_string(),
                            last_modified: human_date(&file.last_modified),
                        };
                        let preview = previews.create(file.bytes.clone());
                        debug!(%id, name = %file.name, %dims, "decoded");
                        Outcome::Decoded(ImageRecord {
                            id,
                            source: file,
                            preview,
                            metadata,
                            tags,
                        })
                    }
                    Err(e) => {
                        warn!(name = %file.name, error = %e, "decode failed, dropping file");
                        Outcome::Failed(DecodeFailure {
                            name: file.name,
                            reason: e.to_string(),
                        })
                    }
                }
            }
        });

        ResolvedBatch {
            outcomes: join_all(decodes).await,
            skipped,
            reservation,
        }
    }
}
