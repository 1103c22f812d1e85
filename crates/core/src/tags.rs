//! Derives descriptive tags from a file's attributes and decoded dimensions.

use chrono::{DateTime, Local, Utc};

use crate::config::TagRules;
use crate::format::megabytes;
use crate::models::{Dimensions, SourceFile, TagSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn of(bytes: u64, rules: &TagRules) -> Self {
        let mb = megabytes(bytes);
        if mb < rules.medium_file_mb {
            SizeClass::Small
        } else if mb < rules.large_file_mb {
            SizeClass::Medium
        } else {
            SizeClass::Large
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            SizeClass::Small => "small-file",
            SizeClass::Medium => "medium-file",
            SizeClass::Large => "large-file",
        }
    }
}

/// Union of filename, format, date, size and dimension tags, first occurrence wins.
pub fn derive_tags(file: &SourceFile, dims: Dimensions, rules: &TagRules) -> TagSet {
    let mut tags = TagSet::new();
    tags.extend(filename_tokens(&file.name, rules.min_token_len));
    tags.extend(format_tag(&file.mime));
    tags.extend(temporal_tags(&file.last_modified));
    tags.insert(SizeClass::of(file.size, rules).as_tag());
    tags.extend(dimension_tags(dims, rules));
    tags
}

pub fn filename_tokens(name: &str, min_len: usize) -> Vec<String> {
    let stem = match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    };
    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .filter(|token| token.chars().count() >= min_len)
        .map(str::to_lowercase)
        .collect()
}

pub fn format_tag(mime: &str) -> Option<String> {
    let (_, subtype) = mime.split_once('/')?;
    let subtype = subtype.split(';').next().unwrap_or_default().trim();
    if subtype.is_empty() {
        None
    } else {
        Some(subtype.to_lowercase())
    }
}

/// Full month name and four-digit year in the local calendar.
pub fn temporal_tags(instant: &DateTime<Utc>) -> [String; 2] {
    let local = instant.with_timezone(&Local);
    [
        local.format("%B").to_string().to_lowercase(),
        local.format("%Y").to_string(),
    ]
}

pub fn dimension_tags(dims: Dimensions, rules: &TagRules) -> Vec<&'static str> {
    let mut tags = Vec::with_capacity(2);
    if dims.width > dims.height {
        tags.push("landscape");
    } else if dims.height > dims.width {
        tags.push("portrait");
    }
    if dims.width >= rules.high_res_px || dims.height >= rules.high_res_px {
        tags.push("high-resolution");
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::TimeZone;

    const MB: u64 = 1_048_576;

    fn file(name: &str, size: u64, mime: &str) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            size,
            mime: mime.to_string(),
            // Mid-month so the local month is the same in every timezone.
            last_modified: Utc.with_ymd_and_hms(2023, 7, 15, 12, 0, 0).unwrap(),
            bytes: Bytes::new(),
        }
    }

    fn tags_of(file: &SourceFile, w: u32, h: u32) -> Vec<String> {
        derive_tags(file, Dimensions::new(w, h), &TagRules::default())
            .as_slice()
            .to_vec()
    }

    #[test]
    fn beach_sunset_example() {
        let f = file("Beach-Sunset_2023.jpg", (2.3 * MB as f64) as u64, "image/jpeg");
        let tags = tags_of(&f, 4000, 3000);
        assert_eq!(
            tags,
            vec![
                "beach",
                "sunset",
                "2023",
                "jpeg",
                "july",
                "medium-file",
                "landscape",
                "high-resolution"
            ]
        );
    }

    #[test]
    fn short_name_square_example() {
        let f = file("a.png", MB / 2, "image/png");
        assert_eq!(tags_of(&f, 500, 500), vec!["png", "july", "2023", "small-file"]);
    }

    #[test]
    fn short_tokens_never_survive() {
        let tokens = filename_tokens("my_ok-photo of  IT.final.jpeg", 3);
        assert_eq!(tokens, vec!["photo", "it.final"]);
        assert!(filename_tokens("ab-cd_ef.png", 3).is_empty());
    }

    #[test]
    fn token_length_counts_characters() {
        assert_eq!(filename_tokens("été.jpg", 3), vec!["été"]);
    }

    #[test]
    fn name_without_extension_is_tokenized_whole() {
        assert_eq!(filename_tokens("Mountain_Lake", 3), vec!["mountain", "lake"]);
    }

    #[test]
    fn format_tag_is_lowercased_subtype() {
        assert_eq!(format_tag("image/JPEG").as_deref(), Some("jpeg"));
        assert_eq!(format_tag("image/svg+xml").as_deref(), Some("svg+xml"));
        assert_eq!(format_tag("image/"), None);
        assert_eq!(format_tag("garbage"), None);
    }

    #[test]
    fn size_buckets_are_left_inclusive() {
        let rules = TagRules::default();
        assert_eq!(SizeClass::of(0, &rules), SizeClass::Small);
        assert_eq!(SizeClass::of(MB - 1, &rules), SizeClass::Small);
        assert_eq!(SizeClass::of(MB, &rules), SizeClass::Medium);
        assert_eq!(SizeClass::of(5 * MB - 1, &rules), SizeClass::Medium);
        assert_eq!(SizeClass::of(5 * MB, &rules), SizeClass::Large);
        assert_eq!(SizeClass::of(u64::MAX, &rules), SizeClass::Large);
    }

    #[test]
    fn exactly_one_size_tag_is_emitted() {
        for size in [0, MB, 3 * MB, 5 * MB, 40 * MB] {
            let tags = tags_of(&file("x.png", size, "image/png"), 10, 10);
            let count = tags.iter().filter(|t| t.ends_with("-file")).count();
            assert_eq!(count, 1, "size {size}: {tags:?}");
        }
    }

    #[test]
    fn orientation_follows_the_longer_side() {
        let rules = TagRules::default();
        assert_eq!(dimension_tags(Dimensions::new(800, 600), &rules), vec!["landscape"]);
        assert_eq!(dimension_tags(Dimensions::new(600, 800), &rules), vec!["portrait"]);
        assert!(dimension_tags(Dimensions::new(700, 700), &rules).is_empty());
    }

    #[test]
    fn high_resolution_is_independent_of_orientation() {
        let rules = TagRules::default();
        assert_eq!(
            dimension_tags(Dimensions::new(1000, 3000), &rules),
            vec!["portrait", "high-resolution"]
        );
        assert_eq!(
            dimension_tags(Dimensions::new(3000, 3000), &rules),
            vec!["high-resolution"]
        );
        assert_eq!(dimension_tags(Dimensions::new(2999, 2000), &rules), vec!["landscape"]);
    }

    #[test]
    fn derived_tags_have_no_case_insensitive_duplicates() {
        let f = file("PNG png Png-July_JULY.png", 10, "image/png");
        let tags = tags_of(&f, 1, 2);
        let mut lowered: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        lowered.sort();
        lowered.dedup();
        assert_eq!(lowered.len(), tags.len());
        assert_eq!(&tags[..2], &["png", "july"]);
    }

    #[test]
    fn custom_rules_shift_thresholds() {
        let rules = TagRules {
            min_token_len: 2,
            medium_file_mb: 0.25,
            large_file_mb: 0.5,
            high_res_px: 100,
        };
        let f = file("my-cat.gif", MB / 2, "image/gif");
        let tags = derive_tags(&f, Dimensions::new(120, 90), &rules);
        assert!(tags.contains("my"));
        assert!(tags.contains("large-file"));
        assert!(tags.contains("high-resolution"));
    }
}
