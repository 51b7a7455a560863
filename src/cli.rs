use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::date_range::parse_cli_date;
use crate::models::MarketIndex;

/// Summary file name used by `reconcile` when `--summary` is not given
pub const DEFAULT_SUMMARY_FILE: &str = "brsr_summary.csv";

#[derive(Parser)]
#[command(name = "nse-brsr")]
#[command(about = "Fast CLI tool for fetching and downloading NSE India Business Responsibility & Sustainability Reports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List reports for a date range and download them
    Download {
        /// Market index to list (equities)
        #[arg(short, long, default_value = "equities")]
        index: String,

        /// Start date (dd-mm-yyyy), defaults to one year ago
        #[arg(long, value_parser = parse_cli_date)]
        from_date: Option<NaiveDate>,

        /// End date (dd-mm-yyyy), defaults to today
        #[arg(long, value_parser = parse_cli_date)]
        to_date: Option<NaiveDate>,

        /// Output directory (overrides NSE_BRSR_OUTPUT_DIR)
        #[arg(short, long)]
        output: Option<String>,

        /// Number of concurrent downloads per group
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Prompt for the index and dates instead of using flags
        #[arg(long)]
        interactive: bool,
    },

    /// Rebuild the summary of a previous run from the files on disk
    Reconcile {
        /// Records JSON saved by a previous download
        #[arg(short, long)]
        input: String,

        /// Directory holding the downloaded reports
        #[arg(short, long, default_value = "./downloads")]
        output: String,

        /// Summary CSV path, defaults to brsr_summary.csv inside the output directory
        #[arg(long)]
        summary: Option<String>,
    },
}

impl Commands {
    pub fn parse_index(index: &str) -> Result<MarketIndex, anyhow::Error> {
        match index.trim().to_lowercase().as_str() {
            "" | "equities" => Ok(MarketIndex::Equities),
            other => Err(anyhow::anyhow!("Unsupported index: {}. Supported indices: equities", other)),
        }
    }

    /// Resolve the summary path of the `reconcile` command
    pub fn summary_path(output: &str, summary: Option<&str>) -> PathBuf {
        match summary {
            Some(summary) => PathBuf::from(summary),
            None => Path::new(output).join(DEFAULT_SUMMARY_FILE),
        }
    }
}
