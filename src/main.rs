use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use nse_brsr::cli::{Cli, Commands};
use nse_brsr::config::Config;
use nse_brsr::downloader::{self, HttpFetcher};
use nse_brsr::models::{DateRange, MarketIndex};
use nse_brsr::session::Session;
use nse_brsr::{api, date_range, export, reconcile};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "nse_brsr=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = tracing_appender::rolling::never(".", "nse-brsr.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            index,
            from_date,
            to_date,
            output,
            batch_size,
            timeout,
            interactive,
        } => {
            let mut config = Config::from_env()?;
            if let Some(output) = output {
                config.output_dir = output.into();
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if let Some(timeout) = timeout {
                config.http.timeout_seconds = timeout;
            }
            config.validate()?;

            let today = chrono::Local::now().date_naive();
            let (index, range) = if interactive {
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut output = std::io::stdout();
                let index = date_range::prompt_index(&mut input, &mut output)?;
                let (range, _) = date_range::prompt_range(&mut input, &mut output, today)?;
                (index, range)
            } else {
                let index = Commands::parse_index(&index)?;
                let (range, _) = date_range::resolve(from_date, to_date, today);
                (index, range)
            };

            if let Err(e) = run_download(&config, index, &range).await {
                error!("Download failed: {:#}", e);
                return Err(e);
            }
        }

        Commands::Reconcile { input, output, summary } => {
            let summary = Commands::summary_path(&output, summary.as_deref());
            let records = export::read_records(Path::new(&input))?;
            let ledger = reconcile::ledger_from_disk(&records, Path::new(&output));
            let reconciliation = reconcile::reconcile(&records, Path::new(&output), &ledger);
            export::write_summary(&summary, &reconciliation)?;

            let totals = reconciliation.summary;
            println!(
                "{} of {} reports available ({} not available)",
                totals.resolved, totals.total, totals.failed
            );
            println!("Summary written to {}", summary.display());
        }
    }

    Ok(())
}

async fn run_download(config: &Config, index: MarketIndex, range: &DateRange) -> Result<()> {
    info!(
        "Fetching {} sustainability reports from {} to {}",
        index.label(),
        range.from_param(),
        range.to_param()
    );

    let session = Session::connect(config).await?;
    let records = api::fetch_records(&session, config, index, range)
        .await
        .context("Failed to fetch report listing")?;

    let records_file: PathBuf = export::records_path(&config.output_dir, range);
    export::write_records(&records_file, &records)?;

    let batch_size = config.group_size()?;
    let fetcher = Arc::new(HttpFetcher::new(session, config.http_timeout()));
    let report = downloader::download_all(fetcher, &records, &config.output_dir, batch_size)
        .await
        .context("Download run aborted")?;

    let summary_file = export::summary_path(&config.output_dir, range);
    export::write_summary(&summary_file, &report.reconciliation)?;

    let totals = report.reconciliation.summary;
    info!("Successfully downloaded {} of {} reports", totals.resolved, totals.total);
    println!(
        "Downloaded {} of {} reports ({} not available)",
        totals.resolved, totals.total, totals.failed
    );
    println!("Summary written to {}", summary_file.display());

    Ok(())
}
