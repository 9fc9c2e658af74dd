// One adapter per listings portal. Adapters are pure functions of
// (criteria, http client): they never touch the store and never fail.
// Fetch and parse problems degrade to an empty batch for the cycle.

pub mod gratka;
pub mod olx;
pub mod otodom;

use crate::model::{Listing, ParseError, Portal, SearchCriteria};
use crate::scraper::HttpFetcher;
use scraper::{ElementRef, Selector};
use tracing::{info, warn};

pub use gratka::GratkaScraper;
pub use olx::OlxScraper;
pub use otodom::OtodomScraper;

/// Upper bound on candidates taken from one result page per cycle.
pub const MAX_LISTINGS_PER_SCAN: usize = 20;

#[async_trait::async_trait]
pub trait PortalScraper: Send + Sync {
    fn portal(&self) -> Portal;

    /// Fetches one result page and returns whatever listings could be built.
    /// All network and structure errors are logged inside the adapter.
    async fn fetch_listings(&self, fetcher: &HttpFetcher, criteria: &SearchCriteria)
    -> Vec<Listing>;
}

/// Builds the adapter set from configured portal names; unknown names are
/// logged and skipped.
pub fn enabled_scrapers(names: &[String]) -> Vec<Box<dyn PortalScraper>> {
    let mut scrapers: Vec<Box<dyn PortalScraper>> = Vec::new();
    for name in names {
        match Portal::from_name(name) {
            Some(Portal::Otodom) => scrapers.push(Box::new(OtodomScraper::new())),
            Some(Portal::Olx) => scrapers.push(Box::new(OlxScraper::new())),
            Some(Portal::Gratka) => scrapers.push(Box::new(GratkaScraper::new())),
            None => warn!("Unknown portal in config, skipping: {}", name),
        }
    }
    scrapers
}

/// Runs every adapter one after another and concatenates the results.
/// One adapter coming back empty never prevents the others from running.
pub async fn scrape_all(
    scrapers: &[Box<dyn PortalScraper>],
    fetcher: &HttpFetcher,
    criteria: &SearchCriteria,
) -> Vec<Listing> {
    let mut all = Vec::new();
    for scraper in scrapers {
        info!("Scraping {}...", scraper.portal());
        let mut listings = scraper.fetch_listings(fetcher, criteria).await;
        info!("Found {} listings on {}", listings.len(), scraper.portal());
        all.append(&mut listings);
    }
    all
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{css}: {e}")))
}

pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Rewrites relative hrefs to absolute links on the portal's origin.
pub(crate) fn absolute_url(portal: Portal, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", portal.origin(), href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubScraper {
        portal: Portal,
        listings: Vec<Listing>,
    }

    #[async_trait::async_trait]
    impl PortalScraper for StubScraper {
        fn portal(&self) -> Portal {
            self.portal
        }

        async fn fetch_listings(
            &self,
            _fetcher: &HttpFetcher,
            _criteria: &SearchCriteria,
        ) -> Vec<Listing> {
            self.listings.clone()
        }
    }

    #[tokio::test]
    async fn one_empty_adapter_does_not_block_the_others() {
        // A failed fetch surfaces as an empty batch; the healthy adapter's
        // listings must still come through.
        let broken = StubScraper {
            portal: Portal::Otodom,
            listings: Vec::new(),
        };
        let healthy = StubScraper {
            portal: Portal::Olx,
            listings: vec![Listing {
                portal: Portal::Olx,
                title: "Kawalerka 30 m²".to_string(),
                price: 250_000.0,
                area: Some(30.0),
                location: "Wrocław".to_string(),
                url: "https://www.olx.pl/d/oferta/kawalerka-1".to_string(),
            }],
        };

        let scrapers: Vec<Box<dyn PortalScraper>> = vec![Box::new(broken), Box::new(healthy)];
        let fetcher = HttpFetcher::new().unwrap();
        let criteria = SearchCriteria::default();

        let listings = scrape_all(&scrapers, &fetcher, &criteria).await;
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].portal, Portal::Olx);
    }

    #[test]
    fn unknown_portal_names_are_skipped() {
        let names = vec!["otodom".to_string(), "allegro".to_string()];
        let scrapers = enabled_scrapers(&names);
        assert_eq!(scrapers.len(), 1);
        assert_eq!(scrapers[0].portal(), Portal::Otodom);
    }

    #[test]
    fn relative_hrefs_get_the_portal_origin() {
        assert_eq!(
            absolute_url(Portal::Olx, "/d/oferta/kawalerka-1"),
            "https://www.olx.pl/d/oferta/kawalerka-1"
        );
        assert_eq!(
            absolute_url(Portal::Olx, "https://www.olx.pl/d/oferta/kawalerka-1"),
            "https://www.olx.pl/d/oferta/kawalerka-1"
        );
    }
}
