//! Summary spreadsheet export

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{DateRange, FilingRecord, Reconciliation};

const SUMMARY_HEADER: [&str; 7] = [
    "symbol",
    "company_name",
    "fy_from",
    "fy_to",
    "submission_date",
    "attachment_url",
    "file",
];

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    symbol: &'a str,
    company_name: &'a str,
    fy_from: &'a str,
    fy_to: &'a str,
    submission_date: &'a str,
    attachment_url: &'a str,
    file: String,
}

/// Default summary file name for a date range
pub fn summary_path(output_dir: &Path, range: &DateRange) -> PathBuf {
    output_dir.join(format!(
        "brsr_summary_{}_{}.csv",
        range.from_param(),
        range.to_param()
    ))
}

pub fn records_path(output_dir: &Path, range: &DateRange) -> PathBuf {
    output_dir.join(format!(
        "brsr_records_{}_{}.json",
        range.from_param(),
        range.to_param()
    ))
}

/// Save the raw listing so a run can be reconciled again later
pub fn write_records(path: &Path, records: &[FilingRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Cannot write records file: {}", path.display()))?;
    Ok(())
}

pub fn read_records(path: &Path) -> Result<Vec<FilingRecord>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read records file: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid records file: {}", path.display()))
}

/// Write one CSV row per reconciled record.
///
/// The header row is always written, even for an empty record set.
pub fn write_summary(path: &Path, reconciliation: &Reconciliation) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create summary file: {}", path.display()))?;
    writer.write_record(SUMMARY_HEADER)?;

    for reconciled in &reconciliation.records {
        let record = &reconciled.record;
        writer.serialize(SummaryRow {
            symbol: record.symbol.as_deref().unwrap_or_default(),
            company_name: record.company_name.as_deref().unwrap_or_default(),
            fy_from: record.fy_from.as_deref().unwrap_or_default(),
            fy_to: record.fy_to.as_deref().unwrap_or_default(),
            submission_date: record.submission_date.as_deref().unwrap_or_default(),
            attachment_url: record.attachment_file.as_deref().unwrap_or_default(),
            file: reconciled.resolved_destination.to_string(),
        })?;
    }
    writer.flush()?;

    info!(
        "Wrote summary of {} records to {}",
        reconciliation.records.len(),
        path.display()
    );
    Ok(())
}
