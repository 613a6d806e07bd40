//! quotefeed — operational CLI for the tiered market-data feed.
//!
//! One-shot modes over the same coordinator the library exposes:
//! resolve a symbol and print a summary, warm a batch of symbols with
//! staggered prefetches, or pull recent headlines.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use tokio::time::sleep;
use tracing::{error, info};

use feed::{trailing_return, FallbackSource, FetchCoordinator, PrefetchScheduler};
use snapshot_client::HttpSnapshotStore;
use store::{FileStore, KvStore, TtlCache};
use yahoo_client::YahooClient;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Tiered market-data cache warmer and inspector.
#[derive(Parser)]
#[command(name = "quotefeed", about = "Tiered market-data cache warmer")]
struct Cli {
    /// Resolve one symbol and print a series summary.
    #[arg(long)]
    resolve: Option<String>,

    /// Comma-separated symbols to prefetch with staggered dispatch.
    #[arg(long)]
    warm: Option<String>,

    /// Fetch recent headlines for a symbol.
    #[arg(long)]
    news: Option<String>,

    /// Path to a config.toml (defaults to ./config.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn format_ts(ts_ms: i64) -> String {
    match Utc.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts_ms.to_string(),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quotefeed=info,feed=info,yahoo_client=info,snapshot_client=info,store=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    // Load configuration.
    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Cache dir: {}", cfg.data_dir);
    info!(
        "TTLs: quotes={}m news={}m, snapshot min_points={}",
        cfg.cache.quote_ttl_ms / 60_000,
        cfg.cache.news_ttl_ms / 60_000,
        cfg.snapshot.min_points,
    );

    // ── Wire the tier chain ──────────────────────────────────────────
    let kv = Arc::new(FileStore::new(&cfg.data_dir));
    let cache = TtlCache::new(kv as Arc<dyn KvStore>);
    let snapshot = Arc::new(HttpSnapshotStore::new(cfg.snapshot.base_url.clone()));
    let provider = Arc::new(YahooClient::new(cfg.provider.clone()));

    let coordinator = Arc::new(FetchCoordinator::new(
        snapshot,
        provider as Arc<dyn FallbackSource>,
        cache,
        cfg.clone(),
    ));

    // ── Resolve mode ─────────────────────────────────────────────────
    if let Some(symbol) = cli.resolve {
        let series = coordinator.resolve(&symbol).await;
        if series.is_empty() {
            info!("{}: no data from any tier", symbol);
            std::process::exit(2);
        }

        let first = &series[0];
        let last = &series[series.len() - 1];
        info!(
            "{}: {} points, {} → {}, last close {:.2}",
            symbol,
            series.len(),
            format_ts(first.ts),
            format_ts(last.ts),
            last.close,
        );
        for (label, period_ms) in [
            ("1w", 7 * DAY_MS),
            ("1m", 30 * DAY_MS),
            ("1y", 365 * DAY_MS),
        ] {
            match trailing_return(&series, period_ms) {
                Some(ret) => info!("  {} return: {:+.2}%", label, ret),
                None => info!("  {} return: n/a", label),
            }
        }
        return;
    }

    // ── Warm mode ────────────────────────────────────────────────────
    if let Some(raw) = cli.warm {
        let symbols: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            error!("--warm needs at least one symbol");
            std::process::exit(1);
        }

        let scheduler = PrefetchScheduler::new(Arc::clone(&coordinator), cfg.prefetch.clone());
        info!(
            "Warming {} symbols, {}ms stagger",
            symbols.len().min(cfg.prefetch.max_batch),
            cfg.prefetch.stagger_ms,
        );
        scheduler.schedule(&symbols);

        // Fire-and-forget by design; wait out the dispatch span plus
        // one provider timeout so the tasks can land before exit.
        let grace = scheduler.batch_span(symbols.len())
            + std::time::Duration::from_secs(cfg.provider.timeout_secs);
        sleep(grace).await;
        info!("Warm batch dispatched");
        return;
    }

    // ── News mode ────────────────────────────────────────────────────
    if let Some(symbol) = cli.news {
        let items = coordinator.resolve_news(&symbol).await;
        if items.is_empty() {
            info!("{}: no headlines", symbol);
            std::process::exit(2);
        }
        for item in &items {
            info!(
                "[{}] {} — {} ({})",
                format_ts(item.published_at),
                item.title,
                item.publisher,
                item.link,
            );
        }
        return;
    }

    error!("Nothing to do: pass --resolve, --warm, or --news (see --help)");
    std::process::exit(1);
}
