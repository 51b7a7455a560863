//! Fetch NSE India Business Responsibility & Sustainability Reports for a date
//! range and download the referenced files in fixed-size concurrent batches.

pub mod api;
pub mod cli;
pub mod config;
pub mod date_range;
pub mod downloader;
pub mod errors;
pub mod export;
pub mod models;
pub mod reconcile;
pub mod session;
