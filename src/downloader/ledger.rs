//! Per-run record of downloads that did not produce a file

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub identity_key: String,
    pub reason: String,
}

/// Destinations that failed during a run.
///
/// Written concurrently by fetch tasks and read once after the last group has
/// finished. Create one per run and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct FailureLedger {
    entries: Mutex<BTreeMap<PathBuf, FailureEntry>>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed destination. Returns false if it was already recorded.
    pub fn record(&self, path: &Path, identity_key: &str, reason: impl Into<String>) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(path) {
            return false;
        }
        entries.insert(
            path.to_path_buf(),
            FailureEntry {
                identity_key: identity_key.to_string(),
                reason: reason.into(),
            },
        );
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Failed destinations in path order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(PathBuf, FailureEntry)> {
        self.lock()
            .iter()
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect()
    }

    pub fn failed_identity_keys(&self) -> BTreeSet<String> {
        self.lock()
            .values()
            .map(|entry| entry.identity_key.clone())
            .collect()
    }

    // A panicking writer cannot leave the map half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, FailureEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_is_idempotent() {
        let ledger = FailureLedger::new();
        assert!(ledger.record(Path::new("out/A_1_2.pdf"), "A", "HTTP 404"));
        assert!(!ledger.record(Path::new("out/A_1_2.pdf"), "A", "HTTP 500"));

        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(Path::new("out/A_1_2.pdf")));
        assert!(!ledger.contains(Path::new("out/B_1_2.pdf")));
        assert_eq!(ledger.entries()[0].1.reason, "HTTP 404");
    }

    #[test]
    fn test_clear_resets_ledger() {
        let ledger = FailureLedger::new();
        ledger.record(Path::new("x.pdf"), "X", "timeout");
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_are_not_lost() {
        let ledger = Arc::new(FailureLedger::new());
        let mut tasks = tokio::task::JoinSet::new();

        for i in 0..200 {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move {
                let path = PathBuf::from(format!("out/SYM{}_2023_2024.pdf", i));
                ledger.record(&path, &format!("SYM{}", i), "HTTP 503");
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(ledger.len(), 200);
        assert_eq!(ledger.failed_identity_keys().len(), 200);
    }
}
