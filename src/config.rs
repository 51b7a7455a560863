//! Centralized configuration management for nse-brsr

use anyhow::{Context, Result};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.nseindia.com";
pub const LISTING_ENDPOINT: &str = "/api/corporate-business-sustainability";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the reports and the summary CSV are written to
    pub output_dir: PathBuf,
    /// Number of downloads run concurrently per group
    pub batch_size: usize,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Homepage visited to collect session cookies
    pub base_url: String,
    /// Listing API endpoint
    pub api_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_url: format!("{}{}", DEFAULT_BASE_URL, LISTING_ENDPOINT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            batch_size: DEFAULT_BATCH_SIZE,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let output_dir = std::env::var("NSE_BRSR_OUTPUT_DIR")
            .unwrap_or_else(|_| "./downloads".to_string())
            .into();

        let base_url = std::env::var("NSE_BRSR_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_url = std::env::var("NSE_BRSR_API_URL")
            .unwrap_or_else(|_| format!("{}{}", base_url.trim_end_matches('/'), LISTING_ENDPOINT));

        let http = HttpConfig {
            timeout_seconds: parse_env_var("NSE_BRSR_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            user_agent: std::env::var("NSE_BRSR_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            base_url,
            api_url,
        };

        Ok(Config {
            output_dir,
            batch_size: parse_env_var("NSE_BRSR_BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE),
            http,
        })
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Get the download group size, rejecting zero
    pub fn group_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.batch_size).context("Batch size must be a positive integer")
    }

    /// Validate configuration and make sure the output directory exists
    pub fn validate(&self) -> Result<()> {
        self.group_size()?;

        if self.http.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("HTTP timeout must be a positive number of seconds"));
        }

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Cannot create output directory: {}", self.output_dir.display()))?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.http.api_url,
            "https://www.nseindia.com/api/corporate-business-sustainability"
        );
    }

    #[test]
    fn test_config_validation_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_dir: temp_dir.path().join("reports"),
            ..Config::default()
        };
        config.validate().unwrap();
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn test_config_validation_rejects_zero_batch_size() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_dir: temp_dir.path().to_path_buf(),
            batch_size: 0,
            ..Config::default()
        };
        assert!(config.group_size().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_size() {
        let config = Config { batch_size: 4, ..Config::default() };
        assert_eq!(config.group_size().unwrap().get(), 4);
    }

    #[test]
    fn test_config_validation_rejects_zero_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config {
            output_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        config.http.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_var_reports_bad_value() {
        std::env::set_var("NSE_BRSR_TEST_BAD_NUMBER", "ten");
        let result: Result<Option<usize>> = parse_env_var("NSE_BRSR_TEST_BAD_NUMBER");
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("NSE_BRSR_TEST_BAD_NUMBER"));

        let missing: Option<usize> = parse_env_var("NSE_BRSR_TEST_UNSET_VARIABLE").unwrap();
        assert!(missing.is_none());
    }
}
