//! notify-feed CLI
//!
//! Thin wrapper around the feed engine: fetch one page, or tail the live
//! notification feed of the configured account.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use notification_feed::{
    normalize, Account, CliConfig, FeedController, HttpNotificationSource, PaginationFetcher,
    PollingStreamSource,
};

#[derive(Parser)]
#[command(name = "notify-feed")]
#[command(about = "Notification feed client for a federated microblogging instance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of notifications and print it
    Page {
        /// Fetch records strictly older than this id
        #[arg(long)]
        until_id: Option<String>,
        /// Page size
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Print raw JSON instead of one-line summaries
        #[arg(long)]
        json: bool,
    },
    /// Follow the notification feed live (initial load + polling stream)
    Tail {
        /// Poll interval in seconds
        #[arg(long, short, default_value = "15")]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load().context("loading notify-feed config")?;
    let account = config.account();

    match cli.command {
        Commands::Page { until_id, limit, json } => page(account, until_id, limit, json).await,
        Commands::Tail { interval } => tail(account, config, interval).await,
    }
}

async fn page(account: Account, until_id: Option<String>, limit: usize, json: bool) -> Result<()> {
    let fetcher = PaginationFetcher::new(Arc::new(HttpNotificationSource::new()), limit);
    let records = fetcher
        .fetch_older_than(&account, until_id.as_deref())
        .await
        .context("fetching notification page")?;
    debug!(count = records.len(), "fetched page");

    for raw in &records {
        let Some(item) = normalize(raw, &account.id) else {
            debug!(id = ?raw.id(), "skipping malformed record");
            continue;
        };
        if json {
            println!("{}", serde_json::to_string(&item)?);
        } else {
            println!("{}  {}  {}", item.created_at.to_rfc3339(), item.id, item.summary());
        }
    }
    Ok(())
}

async fn tail(account: Account, config: CliConfig, interval: u64) -> Result<()> {
    let mut feed_config = config.feed.clone();
    feed_config.poll_interval_secs = interval;

    let source = Arc::new(HttpNotificationSource::new());
    let fetcher = PaginationFetcher::new(source.clone(), feed_config.page_limit);
    let stream = Arc::new(PollingStreamSource::new(fetcher, feed_config.poll_interval()));

    let feed = FeedController::new(account, source, stream, feed_config);
    let mut list_rx = feed.subscribe_list();
    let mut conn_rx = feed.subscribe_connection();

    feed.initial_load().await.context("initial notification load")?;

    for item in list_rx.borrow_and_update().iter() {
        println!("{}  {}", item.created_at.to_rfc3339(), item.summary());
    }
    info!("tailing notifications; press Ctrl-C to stop");

    let mut seen = feed.snapshot().await.len();
    loop {
        tokio::select! {
            changed = list_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = list_rx.borrow_and_update().clone();
                // New entries arrive at the head.
                let fresh = snapshot.len().saturating_sub(seen);
                for item in snapshot.iter().take(fresh).rev() {
                    println!("{}  {}", item.created_at.to_rfc3339(), item.summary());
                }
                seen = snapshot.len();
            }
            changed = conn_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *conn_rx.borrow_and_update();
                info!(?state, "stream connection state changed");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    feed.shutdown();
    Ok(())
}
