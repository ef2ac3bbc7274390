use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use expiry_core::app::{App, AppBuilder, EXPIRATION_HOOK, SweepReport};
use expiry_core::config::Config;
use expiry_core::domain::{ContentItem, ItemType, MetaMap, PublicationStatus, StatusCounts};
use expiry_core::impls::InMemoryContentStore;
use expiry_core::ports::{Clock, ContentStore, FixedClock, SystemClock};

#[derive(Debug, Parser)]
#[command(name = "expiry", about = "Move expired content items back to draft")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one sweep over the items in a JSON file and print the result.
    Sweep {
        /// JSON array of items to load.
        #[arg(long)]
        items: PathBuf,

        /// Site-local "now" (`YYYY-MM-DD HH:MM[:SS]`); defaults to the system clock.
        #[arg(long)]
        now: Option<String>,
    },

    /// Schedule the recurring sweep and dispatch it until Ctrl-C.
    Serve {
        /// JSON array of items to load.
        #[arg(long)]
        items: PathBuf,
    },
}

/// One entry of the items file.
#[derive(Debug, Deserialize)]
struct ItemSeed {
    #[serde(default = "ItemType::post")]
    item_type: ItemType,
    #[serde(default)]
    title: String,
    status: PublicationStatus,
    #[serde(default)]
    meta: MetaMap,
}

#[derive(Debug, Serialize)]
struct SweepOutput {
    report: SweepReport,
    counts: StatusCounts,
    items: Vec<ContentItem>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,expiry_core=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Sweep { items, now } => sweep(config, &items, now.as_deref()).await,
        Command::Serve { items } => serve(config, &items).await,
    }
}

async fn sweep(config: Config, items: &Path, now: Option<&str>) -> Result<()> {
    let clock: Arc<dyn Clock> = match now {
        Some(raw) => Arc::new(FixedClock::new(parse_local_now(raw, &config)?)),
        None => Arc::new(SystemClock),
    };
    let (app, store) = build_app(config, clock, items).await?;

    let report = app.sweeper.sweep().await.context("sweep failed")?;
    let output = SweepOutput {
        report,
        counts: store.counts_by_status().await?,
        items: store.all().await,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn serve(config: Config, items: &Path) -> Result<()> {
    let (app, store) = build_app(config, Arc::new(SystemClock), items).await?;

    let outcome = app.activate().await.context("failed to schedule sweep")?;
    info!(hook = EXPIRATION_HOOK, ?outcome, "serve: sweep scheduled");

    let handle = app.spawn_dispatcher();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("serve: shutting down");
    if !handle.shutdown_and_join().await {
        anyhow::bail!("dispatch loop stopped abnormally");
    }

    let counts = store.counts_by_status().await?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

async fn build_app(
    config: Config,
    clock: Arc<dyn Clock>,
    items: &Path,
) -> Result<(App, Arc<InMemoryContentStore>)> {
    let seeds = load_seeds(items)?;
    let store = Arc::new(InMemoryContentStore::new(Arc::clone(&clock)));
    for seed in seeds {
        let item = store.create(seed.item_type, seed.title, seed.status).await;
        for (key, value) in seed.meta {
            store.update_meta(item.id, &key, value).await?;
        }
    }
    info!(items = store.len().await, path = %items.display(), "loaded items");

    let app = AppBuilder::new(config)
        .clock(clock)
        .store(store.clone())
        .expect_hooks(&[EXPIRATION_HOOK])
        .build()?;
    Ok((app, store))
}

fn load_seeds(path: &Path) -> Result<Vec<ItemSeed>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Interpret a site-local wall-clock time in the configured offset.
fn parse_local_now(raw: &str, config: &Config) -> Result<DateTime<Utc>> {
    let local = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw.trim(), layout).ok())
        .with_context(|| format!("--now must look like YYYY-MM-DD HH:MM[:SS], got {raw:?}"))?;
    let shifted = local - chrono::Duration::seconds(i64::from(config.utc_offset.local_minus_utc()));
    Ok(shifted.and_utc())
}
