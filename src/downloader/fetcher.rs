//! Fetching a single report to disk

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::downloader::ledger::FailureLedger;
use crate::models::{FetchOutcome, Item};
use crate::session::Session;

/// Transport used to retrieve one resource into one file
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve `url` into `destination`. Never fails; faults become outcomes.
    async fn fetch(&self, url: &str, destination: &Path) -> FetchOutcome;
}

/// Fetcher backed by the shared HTTP session
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    session: Session,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(session: Session, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> FetchOutcome {
        debug!("Requesting {}", url);

        let response = match self
            .session
            .client()
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchOutcome::HttpError(status.as_u16());
        }

        let content = match response.bytes().await {
            Ok(content) => content,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        match store(destination, &content).await {
            Ok(()) => FetchOutcome::Success,
            Err(e) => FetchOutcome::TransportError(format!(
                "failed to write {}: {}",
                destination.display(),
                e
            )),
        }
    }
}

/// Sibling path the body is written to before it is moved into place
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

// The destination only ever holds a complete body: write aside, then rename.
async fn store(destination: &Path, content: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(destination);
    let result = match tokio::fs::write(&partial, content).await {
        Ok(()) => tokio::fs::rename(&partial, destination).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            debug!("No partial file to clean up at {}: {}", partial.display(), e);
        }
    }
    result
}

/// Fetch one item, log the outcome and record failures in the ledger
pub async fn fetch_item<F>(fetcher: &F, item: &Item, ledger: &FailureLedger) -> FetchOutcome
where
    F: Fetcher + ?Sized,
{
    let outcome = fetcher.fetch(&item.resource_url, &item.destination_path).await;

    if outcome.is_success() {
        info!("✓ Downloaded {} ({})", item.destination_path.display(), item.identity_key);
    } else {
        warn!(
            "✗ Failed to download {} ({}): {}",
            item.destination_path.display(),
            item.identity_key,
            outcome
        );
        ledger.record(&item.destination_path, &item.identity_key, outcome.to_string());
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(Session::new(&Config::default()).unwrap(), timeout)
    }

    fn item(url: String, destination: &Path) -> Item {
        Item {
            identity_key: "INFY".to_string(),
            resource_url: url,
            destination_path: destination.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_success_writes_exact_bytes_and_overwrites() {
        let mock_server = MockServer::start().await;
        let body: &[u8] = b"%PDF-1.4 report body \x00\x01\x02";

        Mock::given(method("GET"))
            .and(path("/reports/INFY.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("INFY_2023_2024.pdf");
        std::fs::write(&destination, b"stale content from an earlier run, longer than the body").unwrap();

        let ledger = FailureLedger::new();
        let outcome = fetch_item(
            &http_fetcher(Duration::from_secs(5)),
            &item(format!("{}/reports/INFY.pdf", mock_server.uri()), &destination),
            &ledger,
        )
        .await;

        assert_eq!(outcome, FetchOutcome::Success);
        assert_eq!(std::fs::read(&destination).unwrap(), body);
        assert!(!partial_path(&destination).exists());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_destination_leaves_no_partial_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body".to_vec()))
            .mount(&mock_server)
            .await;

        // A directory squatting on the destination makes the final rename fail
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("WIPRO_2023_2024.pdf");
        std::fs::create_dir(&destination).unwrap();

        let ledger = FailureLedger::new();
        let outcome = fetch_item(
            &http_fetcher(Duration::from_secs(5)),
            &item(format!("{}/reports/WIPRO.pdf", mock_server.uri()), &destination),
            &ledger,
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
        assert!(destination.is_dir());
        assert!(!partial_path(&destination).exists());
        assert!(ledger.contains(&destination));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_partial_path_is_a_sibling() {
        assert_eq!(
            partial_path(Path::new("out/INFY_2023_2024.pdf")),
            Path::new("out/INFY_2023_2024.pdf.part")
        );
    }

    #[tokio::test]
    async fn test_non_200_writes_nothing_and_records_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reports/missing.pdf"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("TCS_2023_2024.pdf");

        let ledger = FailureLedger::new();
        let outcome = fetch_item(
            &http_fetcher(Duration::from_secs(5)),
            &item(format!("{}/reports/missing.pdf", mock_server.uri()), &destination),
            &ledger,
        )
        .await;

        assert_eq!(outcome, FetchOutcome::HttpError(404));
        assert!(!destination.exists());
        assert!(ledger.contains(&destination));
    }

    #[tokio::test]
    async fn test_non_200_success_class_is_still_a_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("X_1_2.pdf");
        let outcome = http_fetcher(Duration::from_secs(5))
            .fetch(&format!("{}/empty", mock_server.uri()), &destination)
            .await;

        assert_eq!(outcome, FetchOutcome::HttpError(204));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_slow_response_is_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("SLOW_1_2.pdf");
        let outcome = http_fetcher(Duration::from_millis(200))
            .fetch(&format!("{}/slow.pdf", mock_server.uri()), &destination)
            .await;

        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Bind then drop a listener so the port is known to be closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("DOWN_1_2.pdf");
        let ledger = FailureLedger::new();
        let outcome = fetch_item(
            &http_fetcher(Duration::from_secs(5)),
            &item(format!("http://127.0.0.1:{}/r.pdf", port), &destination),
            &ledger,
        )
        .await;

        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
        assert_eq!(ledger.len(), 1);
    }
}
