// Per-portal price summaries for the dashboard header.
use crate::model::{Portal, StoredListing, round2};

#[derive(Debug, Clone)]
pub struct PortalSummary {
    pub portal: Portal,
    pub count: usize,
    pub avg_price: f64,
    pub avg_price_per_m2: f64,
}

/// Summarizes a listing window portal by portal. Every portal gets an entry,
/// empty ones with zeroed averages, so the dashboard layout stays stable.
pub fn summarize_by_portal(listings: &[StoredListing]) -> Vec<PortalSummary> {
    [Portal::Otodom, Portal::Olx, Portal::Gratka]
        .into_iter()
        .map(|portal| summarize(portal, listings))
        .collect()
}

fn summarize(portal: Portal, listings: &[StoredListing]) -> PortalSummary {
    let prices: Vec<f64> = listings
        .iter()
        .filter(|l| l.portal == portal)
        .map(|l| l.price)
        .filter(|p| *p > 0.0)
        .collect();

    let per_m2: Vec<f64> = listings
        .iter()
        .filter(|l| l.portal == portal)
        .filter_map(|l| l.price_per_m2)
        .collect();

    PortalSummary {
        portal,
        count: prices.len(),
        avg_price: average(&prices),
        avg_price_per_m2: average(&per_m2),
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored(portal: Portal, price: f64, area: Option<f64>) -> StoredListing {
        let now = Utc::now();
        StoredListing {
            id: format!("{portal}-{price}"),
            portal,
            title: "Mieszkanie".to_string(),
            price,
            area,
            price_per_m2: area.map(|a| round2(price / a)),
            location: "Wrocław".to_string(),
            url: format!("https://example.invalid/{portal}/{price}"),
            first_seen: now,
            last_seen: now,
            is_active: true,
        }
    }

    #[test]
    fn averages_are_grouped_by_portal() {
        let listings = vec![
            stored(Portal::Otodom, 400_000.0, Some(50.0)),
            stored(Portal::Otodom, 500_000.0, Some(50.0)),
            stored(Portal::Olx, 300_000.0, Some(60.0)),
        ];

        let summaries = summarize_by_portal(&listings);
        assert_eq!(summaries.len(), 3);

        let otodom = &summaries[0];
        assert_eq!(otodom.portal, Portal::Otodom);
        assert_eq!(otodom.count, 2);
        assert_eq!(otodom.avg_price, 450_000.0);
        assert_eq!(otodom.avg_price_per_m2, 9000.0);

        let gratka = &summaries[2];
        assert_eq!(gratka.count, 0);
        assert_eq!(gratka.avg_price, 0.0);
    }

    #[test]
    fn unknown_area_rows_do_not_skew_the_m2_average() {
        let listings = vec![
            stored(Portal::Olx, 300_000.0, Some(50.0)),
            stored(Portal::Olx, 310_000.0, None),
        ];

        let summaries = summarize_by_portal(&listings);
        let olx = &summaries[1];
        assert_eq!(olx.count, 2);
        assert_eq!(olx.avg_price_per_m2, 6000.0);
    }
}
