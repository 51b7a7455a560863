//! Error types for planning, dispatching and listing

use std::path::PathBuf;
use thiserror::Error;

/// A record that cannot be turned into a download item
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("record has no symbol")]
    MissingIdentityKey,

    #[error("record for '{0}' has no attachment URL")]
    MissingResourceUrl(String),

    #[error("record for '{0}' has no financial year period")]
    MissingPeriod(String),

    #[error("destination {} claimed by both '{first}' and '{second}'", .path.display())]
    DuplicateDestination {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// Fatal fault in the batch dispatcher itself
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("fetch task failed in group {group}: {source}")]
    TaskFailed {
        group: usize,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Failure of the listing API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing API error (status {status_code}): {body}")]
    Status { status_code: u16, body: String },

    #[error("Failed to parse listing response: {0}")]
    Decode(#[from] serde_json::Error),
}
