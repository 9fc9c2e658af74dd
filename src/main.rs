mod config;
mod dashboard;
mod extract;
mod model;
mod notifier;
mod portals;
mod reconcile;
mod scraper;
mod server;
mod stats;
mod storage;
mod utils;

use crate::config::{AppConfig, load_config};
use crate::portals::PortalScraper;
use crate::scraper::HttpFetcher;
use crate::storage::SqliteStore;
use std::path::Path;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config.json";
const DB_PATH: &str = "listings.db";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config = match load_config(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let fetcher = match HttpFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let store = match SqliteStore::new(DB_PATH) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let scrapers = portals::enabled_scrapers(&config.portals);
    if scrapers.is_empty() {
        error!("No known portals enabled in config");
        return;
    }

    // hosted platforms set PORT and expect something listening on it
    if let Ok(raw_port) = std::env::var("PORT") {
        match raw_port.parse::<u16>() {
            Ok(port) => {
                tokio::spawn(server::run(port));
            }
            Err(_) => warn!("Ignoring invalid PORT value: {}", raw_port),
        }
    }

    let run_once = std::env::args().any(|arg| arg == "--once");
    info!(
        "Starting monitor: portals {:?}, checking every {} min",
        config.portals, config.check_interval_minutes
    );

    loop {
        run_cycle(&config, &fetcher, &scrapers, &store).await;

        if run_once {
            break;
        }
        info!(
            "Waiting {} minutes until the next check...",
            config.check_interval_minutes
        );
        sleep(Duration::from_secs(config.check_interval_minutes * 60)).await;
    }
}

/// One full cycle: scrape every enabled portal sequentially, reconcile the
/// merged batch against the store, notify about what came out new and
/// regenerate the dashboard.
async fn run_cycle(
    config: &AppConfig,
    fetcher: &HttpFetcher,
    scrapers: &[Box<dyn PortalScraper>],
    store: &SqliteStore,
) {
    info!("Checking listings...");
    let candidates = portals::scrape_all(scrapers, fetcher, &config.criteria).await;
    info!("Collected {} candidates in total", candidates.len());

    let report = reconcile::reconcile(store, &config.criteria, &candidates);
    info!(
        "Reconciled: {} new, {} price changes, {} unchanged, {} rejected",
        report.new_listings.len(),
        report.price_changes.len(),
        report.unchanged,
        report.rejected
    );

    notifier::notify_new_listings(&config.notifications, store, &report.new_listings).await;
    notifier::notify_price_changes(&config.notifications, &report.price_changes).await;

    if let Err(e) = dashboard::generate(store, Path::new(dashboard::DASHBOARD_PATH)) {
        warn!("Dashboard generation failed: {}", e);
    }
}
