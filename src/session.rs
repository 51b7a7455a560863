//! HTTP session shared by the listing call and every report download

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Cookie-carrying client with the browser-like headers NSE expects.
///
/// Cloning is cheap; all clones share one connection pool and cookie jar.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Build the client without touching the network
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.http.base_url)
                .with_context(|| format!("Invalid base URL: {}", config.http.base_url))?,
        );

        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }

    /// Build the client and visit the homepage to collect session cookies
    pub async fn connect(config: &Config) -> Result<Self> {
        let session = Self::new(config)?;

        debug!("Bootstrapping session cookies from: {}", config.http.base_url);
        match session
            .client
            .get(&config.http.base_url)
            .timeout(config.http_timeout())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!("Session established with {}", config.http.base_url);
            }
            Ok(response) => {
                warn!(
                    "Session bootstrap returned HTTP {} from {}",
                    response.status(),
                    config.http.base_url
                );
            }
            Err(e) => {
                warn!("Session bootstrap failed for {}: {}", config.http.base_url, e);
            }
        }

        Ok(session)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
