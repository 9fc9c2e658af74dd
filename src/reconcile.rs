// Reconciliation: match freshly scraped candidates against persisted state
// and classify each as new, price-changed or unchanged. The store is only
// ever touched from here; adapters stay decoupled from persistence.
use crate::model::{Listing, PriceChange, SearchCriteria};
use crate::storage::SqliteStore;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Candidates inserted this cycle; the only ones worth a notification.
    pub new_listings: Vec<Listing>,
    /// Known listings that reappeared with a different price.
    pub price_changes: Vec<PriceChange>,
    pub unchanged: usize,
    pub rejected: usize,
}

/// Reconciles a batch of candidates in arrival order. Per-candidate failures
/// are logged and skipped; they never abort the rest of the batch.
pub fn reconcile(
    store: &SqliteStore,
    criteria: &SearchCriteria,
    candidates: &[Listing],
) -> ReconcileReport {
    reconcile_at(store, criteria, candidates, Utc::now())
}

pub fn reconcile_at(
    store: &SqliteStore,
    criteria: &SearchCriteria,
    candidates: &[Listing],
    now: DateTime<Utc>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for candidate in candidates {
        // final authoritative price check, regardless of adapter filtering
        if candidate.price <= 0.0 || !criteria.price_in_range(candidate.price) {
            debug!(
                "Rejected candidate outside price range: {} ({:.0} zł)",
                candidate.url, candidate.price
            );
            report.rejected += 1;
            continue;
        }

        let id = candidate.identity();
        let existing = match store.get(&id) {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Store lookup failed for {}: {}", candidate.url, e);
                continue;
            }
        };

        match existing {
            None => {
                if let Err(e) = store.insert(&id, candidate, now) {
                    warn!("Insert failed for {}: {}", candidate.url, e);
                    continue;
                }
                info!("New listing: {} ({:.0} zł)", candidate.title, candidate.price);
                report.new_listings.push(candidate.clone());
            }
            Some(row) if (row.price - candidate.price).abs() > f64::EPSILON => {
                if let Err(e) =
                    store.update_price(&id, candidate.price, candidate.price_per_m2(), now)
                {
                    warn!("Price update failed for {}: {}", candidate.url, e);
                    continue;
                }
                info!(
                    "Price change: {} ({:.0} → {:.0} zł)",
                    candidate.title, row.price, candidate.price
                );
                report.price_changes.push(PriceChange {
                    portal: candidate.portal,
                    title: candidate.title.clone(),
                    url: candidate.url.clone(),
                    old_price: row.price,
                    new_price: candidate.price,
                });
            }
            Some(_) => {
                if let Err(e) = store.touch(&id, now) {
                    warn!("Touch failed for {}: {}", candidate.url, e);
                    continue;
                }
                report.unchanged += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Portal;
    use chrono::Duration;

    fn candidate(url: &str, price: f64, area: Option<f64>) -> Listing {
        Listing {
            portal: Portal::Otodom,
            title: "Mieszkanie 50 m²".to_string(),
            price,
            area,
            location: "Wrocław".to_string(),
            url: url.to_string(),
        }
    }

    fn setup() -> (SqliteStore, SearchCriteria) {
        (SqliteStore::in_memory().unwrap(), SearchCriteria::default())
    }

    #[test]
    fn first_observation_inserts_and_classifies_new() {
        let (store, criteria) = setup();
        let batch = vec![candidate("u1", 400_000.0, Some(50.0))];
        let now = Utc::now();

        let report = reconcile_at(&store, &criteria, &batch, now);

        assert_eq!(report.new_listings.len(), 1);
        assert_eq!(report.unchanged, 0);

        let row = store.get(&batch[0].identity()).unwrap().unwrap();
        assert_eq!(row.price, 400_000.0);
        assert_eq!(row.price_per_m2, Some(8000.0));
        assert_eq!(row.first_seen, now);
    }

    #[test]
    fn identical_reobservation_only_touches() {
        let (store, criteria) = setup();
        let batch = vec![candidate("u1", 400_000.0, Some(50.0))];
        let first = Utc::now();
        let second = first + Duration::hours(1);

        reconcile_at(&store, &criteria, &batch, first);
        let report = reconcile_at(&store, &criteria, &batch, second);

        assert!(report.new_listings.is_empty());
        assert!(report.price_changes.is_empty());
        assert_eq!(report.unchanged, 1);

        let row = store.get(&batch[0].identity()).unwrap().unwrap();
        assert_eq!(row.first_seen, first);
        assert_eq!(row.last_seen, second);
    }

    #[test]
    fn price_change_updates_in_place_and_is_not_new() {
        let (store, criteria) = setup();
        let first = Utc::now();
        let second = first + Duration::hours(1);

        reconcile_at(&store, &criteria, &[candidate("u1", 400_000.0, Some(50.0))], first);
        let report = reconcile_at(
            &store,
            &criteria,
            &[candidate("u1", 410_000.0, Some(50.0))],
            second,
        );

        assert!(report.new_listings.is_empty());
        assert_eq!(report.price_changes.len(), 1);
        assert_eq!(report.price_changes[0].old_price, 400_000.0);
        assert_eq!(report.price_changes[0].new_price, 410_000.0);

        // still exactly one row, re-priced, first_seen preserved
        let row = store.get(&candidate("u1", 0.0, None).identity()).unwrap().unwrap();
        assert_eq!(row.price, 410_000.0);
        assert_eq!(row.price_per_m2, Some(8200.0));
        assert_eq!(row.first_seen, first);
        assert_eq!(row.last_seen, second);
    }

    #[test]
    fn non_positive_or_out_of_range_prices_never_insert() {
        let (store, criteria) = setup();
        let batch = vec![
            candidate("u1", 0.0, Some(50.0)),
            candidate("u2", -1.0, Some(50.0)),
            candidate("u3", 900_000.0, Some(50.0)),
        ];

        let report = reconcile_at(&store, &criteria, &batch, Utc::now());

        assert_eq!(report.rejected, 3);
        assert!(report.new_listings.is_empty());
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn area_unknown_is_still_insertable() {
        let (store, criteria) = setup();
        let batch = vec![candidate("u1", 400_000.0, None)];

        let report = reconcile_at(&store, &criteria, &batch, Utc::now());

        assert_eq!(report.new_listings.len(), 1);
        let row = store.get(&batch[0].identity()).unwrap().unwrap();
        assert_eq!(row.area, None);
        assert_eq!(row.price_per_m2, None);
    }

    #[test]
    fn bad_candidate_does_not_abort_the_batch() {
        let (store, criteria) = setup();
        let batch = vec![
            candidate("u1", 5_000.0, Some(50.0)), // rejected by range
            candidate("u2", 400_000.0, Some(50.0)),
        ];

        let report = reconcile_at(&store, &criteria, &batch, Utc::now());

        assert_eq!(report.rejected, 1);
        assert_eq!(report.new_listings.len(), 1);
        assert_eq!(report.new_listings[0].url, "u2");
    }
}
