use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::errors::DispatchError;
use crate::models::{FetchOutcome, FilingRecord, Item, Reconciliation};
use crate::reconcile::reconcile;

pub mod dispatcher;
pub mod fetcher;
pub mod item;
pub mod ledger;

pub use dispatcher::{BatchDispatcher, RunState};
pub use fetcher::{fetch_item, Fetcher, HttpFetcher};
pub use item::{destination_for, plan_items, ItemPlan, Rejection};
pub use ledger::{FailureEntry, FailureLedger};

/// Everything a finished run produced
#[derive(Debug)]
pub struct DownloadReport {
    pub run_id: Uuid,
    /// Fetched items paired with their outcomes, in item order
    pub outcomes: Vec<(Item, FetchOutcome)>,
    pub rejected: Vec<Rejection>,
    pub groups: usize,
    pub failed_destinations: usize,
    pub reconciliation: Reconciliation,
}

/// Download the reports referenced by `records` into `output_dir`.
///
/// `output_dir` must already exist. Individual failures never abort the run;
/// they surface as "not available" rows in the returned reconciliation.
pub async fn download_all<F>(
    fetcher: Arc<F>,
    records: &[FilingRecord],
    output_dir: &Path,
    batch_size: NonZeroUsize,
) -> Result<DownloadReport, DispatchError>
where
    F: Fetcher + ?Sized + 'static,
{
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("download_run", run_id = %run_id);

    async move {
        let ledger = Arc::new(FailureLedger::new());
        let plan = plan_items(records, output_dir);

        for rejection in &plan.rejected {
            if let Some(destination) = &rejection.destination {
                ledger.record(
                    destination,
                    rejection.identity_key.as_deref().unwrap_or_default(),
                    rejection.error.to_string(),
                );
            }
        }
        if !plan.rejected.is_empty() {
            warn!("{} records could not be planned for download", plan.rejected.len());
        }

        let mut dispatcher = BatchDispatcher::new(fetcher, batch_size);
        let groups = dispatcher.group_count(plan.items.len());
        info!(
            "Downloading {} reports for {} records in {} groups of up to {}",
            plan.items.len(),
            records.len(),
            groups,
            dispatcher.batch_size()
        );

        let outcomes = dispatcher.dispatch(&plan.items, &ledger).await?;
        let reconciliation = reconcile(records, output_dir, &ledger);
        dispatcher.finish();

        Ok(DownloadReport {
            run_id,
            outcomes: plan.items.into_iter().zip(outcomes).collect(),
            rejected: plan.rejected,
            groups,
            failed_destinations: ledger.len(),
            reconciliation,
        })
    }
    .instrument(span)
    .await
}
