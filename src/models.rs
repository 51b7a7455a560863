use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Date format used by the NSE listing API and by user input
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Placeholder written in place of a destination path for failed downloads
pub const NOT_AVAILABLE: &str = "not available";

/// One row of the listing API response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Company symbol, the identity key of the record
    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(rename = "companyName", default)]
    pub company_name: Option<String>,

    /// Start of the reporting financial year
    #[serde(rename = "fyFrom", default, deserialize_with = "de_opt_string")]
    pub fy_from: Option<String>,

    /// End of the reporting financial year
    #[serde(rename = "fyTo", default, deserialize_with = "de_opt_string")]
    pub fy_to: Option<String>,

    #[serde(rename = "submissionDate", default)]
    pub submission_date: Option<String>,

    /// URL of the report attachment
    #[serde(rename = "attachmentFile", default)]
    pub attachment_file: Option<String>,
}

// fyFrom/fyTo come back as numbers for some rows and strings for others
fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// One unit of work: a single file to be fetched and stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub identity_key: String,
    pub resource_url: String,
    pub destination_path: PathBuf,
}

/// Result of fetching a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    HttpError(u16),
    TransportError(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success)
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Success => write!(f, "ok"),
            FetchOutcome::HttpError(status) => write!(f, "HTTP {}", status),
            FetchOutcome::TransportError(message) => write!(f, "transport error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketIndex {
    Equities,
}

impl MarketIndex {
    pub const ALL: [MarketIndex; 1] = [MarketIndex::Equities];

    /// Value sent as the `index` query parameter
    pub fn as_str(&self) -> &str {
        match self {
            MarketIndex::Equities => "equities",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MarketIndex::Equities => "Equities",
        }
    }
}

/// Inclusive submission date range for the listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn from_param(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

/// Where a record's report ended up after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedDestination {
    Path(PathBuf),
    NotAvailable,
}

impl ResolvedDestination {
    pub fn is_available(&self) -> bool {
        matches!(self, ResolvedDestination::Path(_))
    }
}

impl fmt::Display for ResolvedDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedDestination::Path(path) => write!(f, "{}", path.display()),
            ResolvedDestination::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRecord {
    pub record: FilingRecord,
    pub resolved_destination: ResolvedDestination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub total: usize,
    pub failed: usize,
    pub resolved: usize,
}

/// Reconciled record set plus its summary counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub records: Vec<ReconciledRecord>,
    pub summary: ReconcileSummary,
}
