// Notification dispatch. Send failures are logged and swallowed: a failed
// delivery never rolls back what reconciliation already persisted.

pub mod email;
pub mod telegram;

use crate::config::NotificationsConfig;
use crate::model::{Listing, PriceChange};
use crate::storage::SqliteStore;
use chrono::Utc;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

/// At most this many Telegram messages go out per cycle.
const TELEGRAM_BATCH_LIMIT: usize = 5;
/// Spacing between consecutive Telegram messages.
const TELEGRAM_SPACING: Duration = Duration::from_secs(1);

/// Fans newly discovered listings out to every enabled channel and records
/// successful deliveries in the notifications table.
pub async fn notify_new_listings(
    config: &NotificationsConfig,
    store: &SqliteStore,
    listings: &[Listing],
) {
    if listings.is_empty() {
        return;
    }

    if config.email.enabled {
        match email::EmailNotifier::new(&config.email) {
            Ok(notifier) => match notifier.send_new_listings(listings).await {
                Ok(()) => {
                    info!("Email sent for {} new listings", listings.len());
                    record_deliveries(store, listings, "email");
                }
                Err(e) => warn!("Email notification failed: {}", e),
            },
            Err(e) => warn!("Email notifier setup failed: {}", e),
        }
    }

    if config.telegram.enabled {
        match telegram::TelegramNotifier::new(&config.telegram) {
            Ok(notifier) => {
                for listing in listings.iter().take(TELEGRAM_BATCH_LIMIT) {
                    match notifier.notify_listing(listing).await {
                        Ok(()) => record_deliveries(store, std::slice::from_ref(listing), "telegram"),
                        Err(e) => warn!("Telegram notification failed: {}", e),
                    }
                    sleep(TELEGRAM_SPACING).await;
                }
            }
            Err(e) => warn!("Telegram notifier setup failed: {}", e),
        }
    }
}

/// Optional hookup for the price-change event class; does nothing unless
/// enabled in the Telegram config.
pub async fn notify_price_changes(config: &NotificationsConfig, changes: &[PriceChange]) {
    if changes.is_empty() || !config.telegram.enabled || !config.telegram.notify_price_changes {
        return;
    }

    match telegram::TelegramNotifier::new(&config.telegram) {
        Ok(notifier) => {
            for change in changes.iter().take(TELEGRAM_BATCH_LIMIT) {
                if let Err(e) = notifier.notify_price_change(change).await {
                    warn!("Telegram price-change notification failed: {}", e);
                }
                sleep(TELEGRAM_SPACING).await;
            }
        }
        Err(e) => warn!("Telegram notifier setup failed: {}", e),
    }
}

fn record_deliveries(store: &SqliteStore, listings: &[Listing], channel: &str) {
    let now = Utc::now();
    for listing in listings {
        if let Err(e) = store.record_notification(&listing.identity(), channel, now) {
            warn!("Recording {} notification failed: {}", channel, e);
        }
    }
}
