//! NSE sustainability report listing client

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{DateRange, FilingRecord, MarketIndex};
use crate::session::Session;

const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingResponse {
    Wrapped { data: Vec<FilingRecord> },
    Bare(Vec<FilingRecord>),
}

impl ListingResponse {
    fn into_records(self) -> Vec<FilingRecord> {
        match self {
            ListingResponse::Wrapped { data } => data,
            ListingResponse::Bare(records) => records,
        }
    }
}

/// Fetch the report records submitted within `range`
pub async fn fetch_records(
    session: &Session,
    config: &Config,
    index: MarketIndex,
    range: &DateRange,
) -> Result<Vec<FilingRecord>, ApiError> {
    let from_date = range.from_param();
    let to_date = range.to_param();
    debug!(
        "Fetching listing from {} (index={}, from={}, to={})",
        config.http.api_url,
        index.as_str(),
        from_date,
        to_date
    );

    let response = session
        .client()
        .get(&config.http.api_url)
        .query(&[
            ("index", index.as_str()),
            ("from_date", from_date.as_str()),
            ("to_date", to_date.as_str()),
        ])
        .header("Accept", "application/json")
        .timeout(LISTING_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status_code: status.as_u16(),
            body,
        });
    }

    let records = serde_json::from_str::<ListingResponse>(&body)?.into_records();
    info!(
        "Found {} reports submitted between {} and {}",
        records.len(),
        from_date,
        to_date
    );
    Ok(records)
}
