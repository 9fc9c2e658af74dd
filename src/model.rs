// Core structs: Portal, Listing, StoredListing, SearchCriteria
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Portal {
    Otodom,
    Olx,
    Gratka,
}

impl Portal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Portal::Otodom => "otodom",
            Portal::Olx => "olx",
            Portal::Gratka => "gratka",
        }
    }

    pub fn from_name(name: &str) -> Option<Portal> {
        match name.trim().to_lowercase().as_str() {
            "otodom" => Some(Portal::Otodom),
            "olx" => Some(Portal::Olx),
            "gratka" => Some(Portal::Gratka),
            _ => None,
        }
    }

    /// Origin prefixed to relative hrefs captured from result pages.
    pub fn origin(&self) -> &'static str {
        match self {
            Portal::Otodom => "https://www.otodom.pl",
            Portal::Olx => "https://www.olx.pl",
            Portal::Gratka => "https://gratka.pl",
        }
    }
}

impl std::fmt::Display for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized offer as produced by a portal adapter. Timestamps are
/// assigned later, during reconciliation, never by adapters.
#[derive(Debug, Clone)]
pub struct Listing {
    pub portal: Portal,
    pub title: String,
    /// Whole PLN. Adapters discard candidates without a positive price.
    pub price: f64,
    /// `None` = could not be determined, which is distinct from zero.
    pub area: Option<f64>,
    pub location: String,
    pub url: String,
}

impl Listing {
    /// Stable identity across re-scrapes: the URL is the most stable field
    /// the portals expose, so the key is derived from `portal:url`.
    pub fn identity(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", self.portal, self.url).as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn price_per_m2(&self) -> Option<f64> {
        match self.area {
            Some(area) if area > 0.0 => Some(round2(self.price / area)),
            _ => None,
        }
    }
}

/// A listings table row.
#[derive(Debug, Clone)]
pub struct StoredListing {
    pub id: String,
    pub portal: Portal,
    pub title: String,
    pub price: f64,
    pub area: Option<f64>,
    pub price_per_m2: Option<f64>,
    pub location: String,
    pub url: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub min_price: f64,
    pub max_price: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub city: String,
}

impl SearchCriteria {
    pub fn price_in_range(&self, price: f64) -> bool {
        price >= self.min_price && price <= self.max_price
    }

    pub fn area_in_range(&self, area: f64) -> bool {
        area >= self.min_area && area <= self.max_area
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            min_price: 200_000.0,
            max_price: 500_000.0,
            min_area: 35.0,
            max_area: 70.0,
            city: "Wrocław".to_string(),
        }
    }
}

/// Detected on reconciliation when a known URL reappears with a new price.
/// A distinct event class from a new listing; notification is optional.
#[derive(Debug, Clone)]
pub struct PriceChange {
    pub portal: Portal,
    pub title: String,
    pub url: String,
    pub old_price: f64,
    pub new_price: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("embedded payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("writing dashboard failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api responded with status {0}")]
    Api(reqwest::StatusCode),
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("building message failed: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: f64, area: Option<f64>) -> Listing {
        Listing {
            portal: Portal::Otodom,
            title: "Mieszkanie 2 pokoje".to_string(),
            price,
            area,
            location: "Wrocław".to_string(),
            url: "https://www.otodom.pl/pl/oferta/mieszkanie-2-pokoje-ID1".to_string(),
        }
    }

    #[test]
    fn identity_is_stable_and_portal_scoped() {
        let a = listing(400_000.0, Some(50.0));
        let b = listing(410_000.0, Some(50.0));
        // price does not participate in identity
        assert_eq!(a.identity(), b.identity());

        let mut c = a.clone();
        c.portal = Portal::Olx;
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn price_per_m2_requires_positive_area() {
        assert_eq!(listing(400_000.0, Some(50.0)).price_per_m2(), Some(8000.0));
        assert_eq!(listing(400_000.0, None).price_per_m2(), None);
        assert_eq!(listing(400_000.0, Some(0.0)).price_per_m2(), None);
    }

    #[test]
    fn price_per_m2_rounds_to_two_decimals() {
        assert_eq!(listing(350_000.0, Some(45.5)).price_per_m2(), Some(7692.31));
    }

    #[test]
    fn portal_names_round_trip() {
        for portal in [Portal::Otodom, Portal::Olx, Portal::Gratka] {
            assert_eq!(Portal::from_name(portal.as_str()), Some(portal));
        }
        assert_eq!(Portal::from_name("allegro"), None);
    }
}
