//! Fixed-size batch dispatch of item fetches

use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::downloader::fetcher::{fetch_item, Fetcher};
use crate::downloader::ledger::FailureLedger;
use crate::errors::DispatchError;
use crate::models::{FetchOutcome, Item};

/// Progress of one download run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Dispatching { group_index: usize },
    Reconciling,
    Done,
}

/// Runs item fetches in consecutive groups of at most `batch_size`.
///
/// Every fetch of a group completes before the next group is launched, so no
/// more than `batch_size` requests are ever in flight. Completion order inside
/// a group is unspecified.
pub struct BatchDispatcher<F: ?Sized> {
    fetcher: Arc<F>,
    batch_size: usize,
    state: RunState,
}

impl<F: Fetcher + ?Sized + 'static> BatchDispatcher<F> {
    pub fn new(fetcher: Arc<F>, batch_size: NonZeroUsize) -> Self {
        Self {
            fetcher,
            batch_size: batch_size.get(),
            state: RunState::Idle,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn group_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.batch_size)
    }

    /// Fetch every item, returning one outcome per item in item order.
    ///
    /// Failed fetches are recorded in `ledger`. Only a fetch task that panics
    /// or is cancelled aborts the run.
    pub async fn dispatch(
        &mut self,
        items: &[Item],
        ledger: &Arc<FailureLedger>,
    ) -> Result<Vec<FetchOutcome>, DispatchError> {
        let group_count = self.group_count(items.len());
        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; items.len()];

        for (group_index, group) in items.chunks(self.batch_size).enumerate() {
            self.state = RunState::Dispatching { group_index };
            let offset = group_index * self.batch_size;
            info!(
                "Starting group {}/{} ({} downloads)",
                group_index + 1,
                group_count,
                group.len()
            );

            let mut tasks = JoinSet::new();
            for (position, item) in group.iter().enumerate() {
                let fetcher = Arc::clone(&self.fetcher);
                let ledger = Arc::clone(ledger);
                let item = item.clone();
                let index = offset + position;

                tasks.spawn(async move {
                    let outcome = fetch_item(fetcher.as_ref(), &item, &ledger).await;
                    (index, outcome)
                });
            }

            let mut failed = 0;
            while let Some(result) = tasks.join_next().await {
                let (index, outcome) = result.map_err(|source| DispatchError::TaskFailed {
                    group: group_index,
                    source,
                })?;
                if !outcome.is_success() {
                    failed += 1;
                }
                outcomes[index] = Some(outcome);
            }

            info!(
                "Finished group {}/{}: {} ok, {} failed",
                group_index + 1,
                group_count,
                group.len() - failed,
                failed
            );
        }

        self.state = RunState::Reconciling;
        debug!("Dispatch complete: {} outcomes", items.len());

        // Every slot was filled by exactly one task of its group.
        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Mark the run finished once its results have been reconciled
    pub fn finish(&mut self) {
        self.state = RunState::Done;
    }
}
