// Static HTML dashboard: a bounded recent window of listings plus per-portal
// summary cards. Pure presentation; the pipeline only hands it store state.
use crate::model::{RenderError, StoredListing};
use crate::stats::{self, PortalSummary};
use crate::storage::SqliteStore;
use crate::utils::format_pln;
use chrono::{DateTime, Utc};
use html_escape::encode_text;
use std::fs;
use std::path::Path;
use tracing::info;

pub const DASHBOARD_PATH: &str = "dashboard.html";

/// How many of the most recent listings the dashboard shows.
const RECENT_WINDOW: usize = 100;

/// Renders the recent window into a static HTML file next to the process.
pub fn generate(store: &SqliteStore, path: &Path) -> Result<(), RenderError> {
    let listings = store.recent(RECENT_WINDOW)?;
    let summaries = stats::summarize_by_portal(&listings);
    let html = render(&listings, &summaries, Utc::now());
    fs::write(path, html)?;
    info!("Dashboard updated: {}", path.display());
    Ok(())
}

pub fn render(
    listings: &[StoredListing],
    summaries: &[PortalSummary],
    generated_at: DateTime<Utc>,
) -> String {
    let mut html = String::with_capacity(16 * 1024);

    html.push_str(
        r#"<!DOCTYPE html>
<html lang="pl">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Monitor Nieruchomości - Wrocław</title>
<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, 'Segoe UI', Arial, sans-serif; background: #f5f7fa; padding: 20px; }
.container { max-width: 1200px; margin: 0 auto; }
header { background: #667eea; color: white; padding: 30px; border-radius: 10px; margin-bottom: 30px; }
.stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
.stat-card { background: white; padding: 20px; border-radius: 10px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.stat-value { font-size: 28px; font-weight: bold; color: #667eea; }
.stat-label { color: #718096; margin-top: 5px; }
.property-card { background: white; border-radius: 10px; padding: 25px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.property-title { font-size: 18px; font-weight: 600; color: #2d3748; }
.portal-badge { background: #edf2f7; color: #4a5568; padding: 4px 12px; border-radius: 20px; font-size: 12px; text-transform: uppercase; float: right; }
.property-price { font-size: 28px; font-weight: bold; color: #27ae60; margin: 15px 0; }
.property-details { color: #4a5568; margin: 10px 0; }
.property-date { color: #a0aec0; font-size: 14px; }
.property-link { color: #3498db; text-decoration: none; font-weight: 600; }
.updated { text-align: center; color: #a0aec0; margin-top: 30px; font-size: 14px; }
</style>
</head>
<body>
<div class="container">
<header>
<h1>🏠 Monitor Nieruchomości</h1>
<p>Mieszkania na sprzedaż we Wrocławiu</p>
</header>
<div class="stats">
"#,
    );

    html.push_str(&format!(
        "<div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">Aktywnych ofert</div></div>\n",
        listings.len()
    ));
    for summary in summaries {
        html.push_str(&render_summary_card(summary));
    }
    html.push_str("</div>\n");

    for listing in listings {
        html.push_str(&render_property_card(listing));
    }

    html.push_str(&format!(
        "<p class=\"updated\">Ostatnia aktualizacja: {}</p>\n</div>\n</body>\n</html>\n",
        generated_at.format("%d.%m.%Y %H:%M:%S")
    ));

    html
}

fn render_summary_card(summary: &PortalSummary) -> String {
    let label = if summary.count > 0 {
        format!(
            "{} · śr. {} zł · {} zł/m²",
            summary.portal.as_str().to_uppercase(),
            format_pln(summary.avg_price),
            format_pln(summary.avg_price_per_m2)
        )
    } else {
        summary.portal.as_str().to_uppercase()
    };
    format!(
        "<div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
        summary.count, label
    )
}

fn render_property_card(listing: &StoredListing) -> String {
    let area = listing
        .area
        .map(|a| format!("{a} m²"))
        .unwrap_or_else(|| "metraż nieznany".to_string());
    let per_m2 = listing
        .price_per_m2
        .map(|p| format!(" • {} zł/m²", format_pln(p)))
        .unwrap_or_default();

    format!(
        r#"<div class="property-card">
<span class="portal-badge">{portal}</span>
<div class="property-title">{title}</div>
<div class="property-price">{price} zł</div>
<div class="property-details">📐 {area}{per_m2} • 📍 {location}</div>
<div class="property-date">Dodano: {date}</div>
<a href="{url}" target="_blank" class="property-link">Zobacz ogłoszenie →</a>
</div>
"#,
        portal = listing.portal,
        title = encode_text(&listing.title),
        price = format_pln(listing.price),
        area = area,
        per_m2 = per_m2,
        location = encode_text(&listing.location),
        date = listing.first_seen.format("%d.%m.%Y %H:%M"),
        url = encode_text(&listing.url),
    )
}
