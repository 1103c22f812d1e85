use std::io::{self, Write};
use tagger_core::store::BatchReport;
use tagger_core::ImageRecord;

pub fn write_records<W: Write>(out: &mut W, records: &[ImageRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "(no images)");
    }
    for record in records {
        let m = &record.metadata;
        writeln!(
            out,
            "#{} {}  {}  {}  {}  {}",
            record.id, m.name, m.mime, m.size, m.dimensions, m.last_modified
        )?;
        let tags: Vec<&str> = record.tags.iter().collect();
        writeln!(out, "    tags: {}", tags.join(", "))?;
    }
    Ok(())
}

pub fn write_records_json<W: Write>(out: &mut W, records: &[ImageRecord]) -> anyhow::Result<()> {
    let views: Vec<_> = records.iter().map(ImageRecord::view).collect();
    writeln!(out, "{}", serde_json::to_string_pretty(&views)?)?;
    Ok(())
}

pub fn write_report<W: Write>(out: &mut W, report: &BatchReport) -> io::Result<()> {
    writeln!(
        out,
        "added {}, skipped {}, failed {}",
        report.added.len(),
        report.skipped.len(),
        report.failed.len()
    )?;
    for failure in &report.failed {
        writeln!(out, "  could not decode {}: {}", failure.name, failure.reason)?;
    }
    Ok(())
}
