// OLX does not get the criteria forwarded upstream: the default Wrocław
// result page is fetched and the range filter is applied client-side.
// Cards rarely carry a dedicated area field; the title usually does.
use super::{MAX_LISTINGS_PER_SCAN, PortalScraper, absolute_url, element_text, parse_selector};
use crate::extract::{extract_area, extract_price};
use crate::model::{Listing, ParseError, Portal, SearchCriteria};
use crate::scraper::HttpFetcher;
use scraper::Html;
use tracing::warn;

const SEARCH_URL: &str = "https://www.olx.pl/nieruchomosci/mieszkania/sprzedaz/wroclaw/";

const ITEM_SELECTOR: &str = r#"div[data-cy="l-card"]"#;
const TITLE_SELECTOR: &str = "h6";
const PRICE_SELECTOR: &str = r#"p[data-testid="ad-price"]"#;
const LINK_SELECTOR: &str = "a[href]";

pub struct OlxScraper;

impl OlxScraper {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PortalScraper for OlxScraper {
    fn portal(&self) -> Portal {
        Portal::Olx
    }

    async fn fetch_listings(
        &self,
        fetcher: &HttpFetcher,
        criteria: &SearchCriteria,
    ) -> Vec<Listing> {
        let html = match fetcher.get(SEARCH_URL, &[]).await {
            Ok(html) => html,
            Err(e) => {
                warn!("OLX fetch failed: {}", e);
                return Vec::new();
            }
        };

        match parse_page(&html, criteria) {
            Ok(listings) => listings,
            Err(e) => {
                warn!("OLX parse error: {}", e);
                Vec::new()
            }
        }
    }
}

pub(crate) fn parse_page(
    html: &str,
    criteria: &SearchCriteria,
) -> Result<Vec<Listing>, ParseError> {
    let document = Html::parse_document(html);
    let item_sel = parse_selector(ITEM_SELECTOR)?;
    let title_sel = parse_selector(TITLE_SELECTOR)?;
    let price_sel = parse_selector(PRICE_SELECTOR)?;
    let link_sel = parse_selector(LINK_SELECTOR)?;

    let mut listings = Vec::new();

    for element in document.select(&item_sel).take(MAX_LISTINGS_PER_SCAN) {
        let Some(title_node) = element.select(&title_sel).next() else {
            continue;
        };
        let Some(price_node) = element.select(&price_sel).next() else {
            continue;
        };
        let Some(href) = element
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };

        let title = element_text(&title_node);
        let Some(price) = extract_price(&element_text(&price_node)).filter(|p| *p > 0.0) else {
            continue;
        };
        let area = extract_area(&title);

        if !criteria.price_in_range(price) {
            continue;
        }
        match area {
            Some(a) if criteria.area_in_range(a) => {}
            _ => continue,
        }

        listings.push(Listing {
            portal: Portal::Olx,
            title,
            price,
            area,
            location: criteria.city.clone(),
            url: absolute_url(Portal::Olx, href),
        });
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <div data-cy="l-card">
            <a href="/d/oferta/mieszkanie-45-5-m-centrum-CID3-ID14xyz.html">
                <h6>Mieszkanie 45,5 m² Centrum</h6>
            </a>
            <p data-testid="ad-price">389 000 zł</p>
        </div>
        <div data-cy="l-card">
            <a href="/d/oferta/apartament-120-m-CID3-ID15xyz.html">
                <h6>Apartament 120 m² Stare Miasto</h6>
            </a>
            <p data-testid="ad-price">1 450 000 zł</p>
        </div>
        <div data-cy="l-card">
            <a href="/d/oferta/mieszkanie-bez-metrazu-CID3-ID16xyz.html">
                <h6>Mieszkanie na sprzedaż</h6>
            </a>
            <p data-testid="ad-price">350 000 zł</p>
        </div>
        <div data-cy="l-card">
            <h6>Karta bez linku</h6>
            <p data-testid="ad-price">300 000 zł</p>
        </div>
        </body></html>
    "#;

    #[test]
    fn filters_on_criteria_and_skips_broken_cards() {
        let criteria = SearchCriteria::default();
        let listings = parse_page(PAGE, &criteria).unwrap();

        // card 2 fails the price/area range, card 3 has no recoverable area,
        // card 4 is missing its link
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.title, "Mieszkanie 45,5 m² Centrum");
        assert_eq!(listing.price, 389_000.0);
        assert_eq!(listing.area, Some(45.5));
        assert_eq!(listing.location, "Wrocław");
        assert_eq!(
            listing.url,
            "https://www.olx.pl/d/oferta/mieszkanie-45-5-m-centrum-CID3-ID14xyz.html"
        );
    }

    #[test]
    fn area_is_recovered_from_the_title() {
        let criteria = SearchCriteria::default();
        let listings = parse_page(PAGE, &criteria).unwrap();
        assert_eq!(listings[0].area, Some(45.5));
    }

    #[test]
    fn empty_page_parses_to_no_listings() {
        let criteria = SearchCriteria::default();
        assert!(parse_page("<html></html>", &criteria).unwrap().is_empty());
    }
}
