// Gratka teaser cards expose their attributes as a parameter list; the area
// sits in one of the `teaserUnified__param` entries. Criteria are applied
// client-side, as with OLX.
use super::{MAX_LISTINGS_PER_SCAN, PortalScraper, absolute_url, element_text, parse_selector};
use crate::extract::{extract_area, extract_price};
use crate::model::{Listing, ParseError, Portal, SearchCriteria};
use crate::scraper::HttpFetcher;
use scraper::Html;
use tracing::warn;

const SEARCH_URL: &str = "https://gratka.pl/nieruchomosci/mieszkania/dolnoslaskie/wroclaw/sprzedaz";

const ITEM_SELECTOR: &str = "article.teaserUnified";
const TITLE_SELECTOR: &str = "h2";
const PRICE_SELECTOR: &str = "span.teaserUnified__price";
const PARAM_SELECTOR: &str = "li.teaserUnified__param";
const LINK_SELECTOR: &str = "a[href]";

pub struct GratkaScraper;

impl GratkaScraper {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PortalScraper for GratkaScraper {
    fn portal(&self) -> Portal {
        Portal::Gratka
    }

    async fn fetch_listings(
        &self,
        fetcher: &HttpFetcher,
        criteria: &SearchCriteria,
    ) -> Vec<Listing> {
        let html = match fetcher.get(SEARCH_URL, &[]).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Gratka fetch failed: {}", e);
                return Vec::new();
            }
        };

        match parse_page(&html, criteria) {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Gratka parse error: {}", e);
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
    let param_sel = parse_selector(PARAM_SELECTOR)?;
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

        let area = element
            .select(&param_sel)
            .map(|p| element_text(&p))
            .find(|t| t.contains("m²") || t.contains("m2"))
            .and_then(|t| extract_area(&t))
            .or_else(|| extract_area(&title));

        if !criteria.price_in_range(price) {
            continue;
        }
        match area {
            Some(a) if criteria.area_in_range(a) => {}
            _ => continue,
        }

        listings.push(Listing {
            portal: Portal::Gratka,
            title,
            price,
            area,
            location: criteria.city.clone(),
            url: absolute_url(Portal::Gratka, href),
        });
    }

    Ok(listings)
}
