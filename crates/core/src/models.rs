use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::preview::PreviewHandle;

/// Raw file handle as handed over by a file picker or drop target.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub last_modified: DateTime<Utc>,
    pub bytes: Bytes,
}

impl SourceFile {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Display snapshot computed once when the record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub name: String,
    pub size: String,
    pub mime: String,
    pub dimensions: String,
    pub last_modified: String,
}

/// Ordered, case-insensitive set of lowercase tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercases and appends `tag`. Returns false if it was empty or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    /// Removes an exact match.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.0.iter().position(|t| t == tag) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.0.iter().any(|t| *t == needle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.extend(iter);
        set
    }
}

impl<S: AsRef<str>> Extend<S> for TagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag.as_ref());
        }
    }
}

#[derive(Debug)]
pub struct ImageRecord {
    pub id: RecordId,
    pub source: SourceFile,
    pub preview: PreviewHandle,
    pub metadata: ImageMetadata,
    pub tags: TagSet,
}

/// Serializable projection of a record for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView<'a> {
    pub id: RecordId,
    pub preview: String,
    pub metadata: &'a ImageMetadata,
    pub tags: &'a TagSet,
}

impl ImageRecord {
    pub fn view(&self) -> RecordView<'_> {
        RecordView {
            id: self.id,
            preview: self.preview.url(),
            metadata: &self.metadata,
            tags: &self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_set_rejects_case_insensitive_duplicates() {
        let mut tags = TagSet::new();
        assert!(tags.insert("Beach"));
        assert!(!tags.insert("BEACH"));
        assert!(!tags.insert("  beach "));
        assert_eq!(tags.as_slice(), &["beach".to_string()]);
    }

    #[test]
    fn tag_set_keeps_insertion_order() {
        let tags: TagSet = ["sunset", "jpeg", "july"].into_iter().collect();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["sunset", "jpeg", "july"]);
    }

    #[test]
    fn tag_set_ignores_blank_tags() {
        let mut tags = TagSet::new();
        assert!(!tags.insert("   "));
        assert!(tags.is_empty());
    }

    #[test]
    fn remove_is_exact_match() {
        let mut tags: TagSet = ["beach"].into_iter().collect();
        assert!(!tags.remove("Beach"));
        assert!(tags.remove("beach"));
        assert!(!tags.remove("beach"));
    }

    #[test]
    fn dimensions_display_as_width_x_height() {
        assert_eq!(Dimensions::new(4000, 3000).to_string(), "4000x3000");
    }
}
