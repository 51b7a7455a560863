//! Merging download results back into the listing records

use std::path::Path;
use tracing::{debug, info};

use crate::downloader::item::{destination_for, plan_items};
use crate::downloader::ledger::FailureLedger;
use crate::models::{
    FilingRecord, ReconcileSummary, ReconciledRecord, Reconciliation, ResolvedDestination,
};

/// Resolve every record to its downloaded file or the "not available" marker.
///
/// A record resolves to its path unless the path cannot be derived or is in
/// the failure ledger. Record order and count are preserved.
pub fn reconcile(
    records: &[FilingRecord],
    output_dir: &Path,
    ledger: &FailureLedger,
) -> Reconciliation {
    let reconciled: Vec<ReconciledRecord> = records
        .iter()
        .map(|record| {
            let resolved_destination = match destination_for(output_dir, record) {
                Ok(path) if !ledger.contains(&path) => ResolvedDestination::Path(path),
                Ok(path) => {
                    debug!("{} marked not available", path.display());
                    ResolvedDestination::NotAvailable
                }
                Err(_) => ResolvedDestination::NotAvailable,
            };
            ReconciledRecord {
                record: record.clone(),
                resolved_destination,
            }
        })
        .collect();

    let failed = reconciled
        .iter()
        .filter(|r| !r.resolved_destination.is_available())
        .count();
    let summary = ReconcileSummary {
        total: reconciled.len(),
        failed,
        resolved: reconciled.len() - failed,
    };

    info!(
        "Reconciled {} records: {} resolved, {} not available",
        summary.total, summary.resolved, summary.failed
    );

    Reconciliation {
        records: reconciled,
        summary,
    }
}

/// Build a ledger from what is already on disk, for reconciling a past run
pub fn ledger_from_disk(records: &[FilingRecord], output_dir: &Path) -> FailureLedger {
    let ledger = FailureLedger::new();
    let plan = plan_items(records, output_dir);

    for item in &plan.items {
        if !item.destination_path.is_file() {
            ledger.record(&item.destination_path, &item.identity_key, "file not found");
        }
    }
    for rejection in &plan.rejected {
        if let Some(destination) = &rejection.destination {
            ledger.record(
                destination,
                rejection.identity_key.as_deref().unwrap_or_default(),
                rejection.error.to_string(),
            );
        }
    }

    ledger
}
