//! Display helpers for record metadata.

use chrono::{DateTime, Local, Utc};

pub const BYTES_PER_MB: f64 = 1_048_576.0;

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

pub fn human_date(instant: &DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sizes_pick_the_largest_fitting_unit() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(2_411_724), "2.30 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn megabytes_uses_binary_units() {
        assert_eq!(megabytes(1_048_576), 1.0);
        assert_eq!(megabytes(524_288), 0.5);
    }

    #[test]
    fn date_is_rendered_in_local_time() {
        let instant = Utc.with_ymd_and_hms(2023, 7, 15, 12, 0, 0).unwrap();
        let rendered = human_date(&instant);
        assert!(rendered.starts_with("2023-07-1"), "{rendered}");
        assert_eq!(rendered.len(), "2023-07-15 12:00:00".len());
    }
}
