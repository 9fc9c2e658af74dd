// Otodom result pages ship a serialized Next.js state object; reading it is
// far more stable than the rendered markup, so the embedded payload is the
// preferred strategy and the markup selectors are only a fallback.
use super::{
    MAX_LISTINGS_PER_SCAN, PortalScraper, absolute_url, element_text, parse_selector,
};
use crate::extract::{extract_area, extract_price};
use crate::model::{Listing, ParseError, Portal, SearchCriteria};
use crate::scraper::HttpFetcher;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, warn};

const SEARCH_URL: &str = "https://www.otodom.pl/pl/wyniki/sprzedaz/mieszkanie/dolnoslaskie/wroclaw";

const NEXT_DATA_SELECTOR: &str = r#"script[id="__NEXT_DATA__"]"#;
const ITEMS_PATH: &str = "/props/pageProps/data/searchAds/items";
const OFFER_PATH_PREFIX: &str = "/pl/oferta/";

const ITEM_SELECTOR: &str = r#"article[data-cy="listing-item"]"#;
const TITLE_SELECTOR: &str = "h3";
const LOCATION_SELECTOR: &str = r#"p[data-cy="listing-item-location"]"#;
const LINK_SELECTOR: &str = "a[href]";
const SPAN_SELECTOR: &str = "span";

pub struct OtodomScraper;

impl OtodomScraper {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PortalScraper for OtodomScraper {
    fn portal(&self) -> Portal {
        Portal::Otodom
    }

    async fn fetch_listings(
        &self,
        fetcher: &HttpFetcher,
        criteria: &SearchCriteria,
    ) -> Vec<Listing> {
        // Otodom honors filter query parameters, so the criteria go upstream.
        let query = [
            ("priceMin", format!("{:.0}", criteria.min_price)),
            ("priceMax", format!("{:.0}", criteria.max_price)),
            ("areaMin", format!("{:.0}", criteria.min_area)),
            ("areaMax", format!("{:.0}", criteria.max_area)),
        ];

        let html = match fetcher.get(SEARCH_URL, &query).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Otodom fetch failed: {}", e);
                return Vec::new();
            }
        };

        parse_page(&html)
    }
}

pub(crate) fn parse_page(html: &str) -> Vec<Listing> {
    match parse_embedded(html) {
        Ok(Some(listings)) => return listings,
        Ok(None) => debug!("No embedded payload on Otodom page, trying markup"),
        Err(e) => warn!("Otodom embedded payload error: {}", e),
    }

    match parse_markup(html) {
        Ok(listings) => listings,
        Err(e) => {
            warn!("Otodom markup parse error: {}", e);
            Vec::new()
        }
    }
}

/// Reads listings out of the `__NEXT_DATA__` script payload. `Ok(None)` means
/// the payload is absent entirely; a payload without the expected items path
/// counts as "no listings found" for this cycle.
fn parse_embedded(html: &str) -> Result<Option<Vec<Listing>>, ParseError> {
    let document = Html::parse_document(html);
    let script = parse_selector(NEXT_DATA_SELECTOR)?;

    let Some(element) = document.select(&script).next() else {
        return Ok(None);
    };
    let payload = element.text().collect::<String>();
    let data: Value = serde_json::from_str(&payload)?;

    let Some(items) = data.pointer(ITEMS_PATH).and_then(Value::as_array) else {
        debug!("Otodom payload present but items path is missing");
        return Ok(Some(Vec::new()));
    };

    let listings = items
        .iter()
        .filter_map(embedded_listing)
        .take(MAX_LISTINGS_PER_SCAN)
        .collect();
    Ok(Some(listings))
}

fn embedded_listing(item: &Value) -> Option<Listing> {
    let title = item.get("title").and_then(Value::as_str)?.trim().to_string();
    let slug = item.get("slug").and_then(Value::as_str)?;

    let price = item
        .pointer("/totalPrice/value")
        .and_then(Value::as_f64)
        .or_else(|| item.get("totalPrice").and_then(Value::as_f64))?;
    if price <= 0.0 {
        return None;
    }

    let area = item
        .get("areaInSquareMeters")
        .and_then(Value::as_f64)
        .filter(|a| *a > 0.0)
        .or_else(|| extract_area(&title));
    // an offer without a floor area is useless for comparison
    if area.is_none() {
        return None;
    }

    let location = item
        .pointer("/locationLabel/value")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Some(Listing {
        portal: Portal::Otodom,
        title,
        price,
        area,
        location,
        url: format!("{}{}{}", Portal::Otodom.origin(), OFFER_PATH_PREFIX, slug),
    })
}

fn parse_markup(html: &str) -> Result<Vec<Listing>, ParseError> {
    let document = Html::parse_document(html);
    let item_sel = parse_selector(ITEM_SELECTOR)?;
    let title_sel = parse_selector(TITLE_SELECTOR)?;
    let location_sel = parse_selector(LOCATION_SELECTOR)?;
    let link_sel = parse_selector(LINK_SELECTOR)?;
    let span_sel = parse_selector(SPAN_SELECTOR)?;

    let mut listings = Vec::new();

    for element in document.select(&item_sel).take(MAX_LISTINGS_PER_SCAN) {
        // required sub-elements missing => skip this candidate only
        let Some(title_node) = element.select(&title_sel).next() else {
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
        let spans: Vec<String> = element.select(&span_sel).map(|s| element_text(&s)).collect();

        let Some(price) = spans
            .iter()
            .find(|t| t.contains("zł"))
            .and_then(|t| extract_price(t))
            .filter(|p| *p > 0.0)
        else {
            continue;
        };

        let area = spans
            .iter()
            .find(|t| t.contains("m²") || t.contains("m2"))
            .and_then(|t| extract_area(t))
            .or_else(|| extract_area(&title));
        if area.is_none() {
            continue;
        }

        let location = element
            .select(&location_sel)
            .next()
            .map(|e| element_text(&e))
            .unwrap_or_default();

        listings.push(Listing {
            portal: Portal::Otodom,
            title,
            price,
            area,
            location,
            url: absolute_url(Portal::Otodom, href),
        });
    }

    Ok(listings)
}
