use crate::config::TelegramConfig;
use crate::model::{Listing, NotifyError, PriceChange};
use crate::utils::format_pln;
use reqwest::Client;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            client,
        })
    }

    pub async fn notify_listing(&self, listing: &Listing) -> Result<(), NotifyError> {
        self.send_message(format_listing(listing)).await
    }

    pub async fn notify_price_change(&self, change: &PriceChange) -> Result<(), NotifyError> {
        self.send_message(format_price_change(change)).await
    }

    async fn send_message(&self, text: String) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", API_BASE, self.bot_token);
        let params = [
            ("chat_id", self.chat_id.clone()),
            ("text", text),
            ("parse_mode", "Markdown".to_string()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Api(status));
        }
        Ok(())
    }
}

fn format_listing(listing: &Listing) -> String {
    let area = listing
        .area
        .map(|a| format!("{a} m²"))
        .unwrap_or_else(|| "nieznany".to_string());
    let per_m2 = listing
        .price_per_m2()
        .map(|p| format!("\n💵 Za m²: {} zł", format_pln(p)))
        .unwrap_or_default();

    format!(
        "🏠 *Nowa oferta we Wrocławiu!*\n\n{}\n\n💰 Cena: *{} zł*\n📐 Metraż: {}{}\n📍 {}\n🌐 Portal: {}\n\n[Zobacz ogłoszenie]({})",
        listing.title,
        format_pln(listing.price),
        area,
        per_m2,
        listing.location,
        listing.portal.as_str().to_uppercase(),
        listing.url,
    )
}

fn format_price_change(change: &PriceChange) -> String {
    format!(
        "💰 *Zmiana ceny!*\n\n{}\n\n{} zł → *{} zł*\n🌐 Portal: {}\n\n[Zobacz ogłoszenie]({})",
        change.title,
        format_pln(change.old_price),
        format_pln(change.new_price),
        change.portal.as_str().to_uppercase(),
        change.url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Portal;

    #[test]
    fn listing_message_carries_price_and_link() {
        let listing = Listing {
            portal: Portal::Gratka,
            title: "Mieszkanie dwupokojowe, Krzyki".to_string(),
            price: 420_000.0,
            area: Some(48.3),
            location: "Wrocław".to_string(),
            url: "https://gratka.pl/nieruchomosci/x/ob/31234567".to_string(),
        };

        let message = format_listing(&listing);
        assert!(message.contains("*420 000 zł*"));
        assert!(message.contains("48.3 m²"));
        assert!(message.contains("GRATKA"));
        assert!(message.contains("(https://gratka.pl/nieruchomosci/x/ob/31234567)"));
    }

    #[test]
    fn price_change_message_shows_both_prices() {
        let change = PriceChange {
            portal: Portal::Otodom,
            title: "Mieszkanie 50 m²".to_string(),
            url: "https://www.otodom.pl/pl/oferta/x-ID1".to_string(),
            old_price: 400_000.0,
            new_price: 410_000.0,
        };

        let message = format_price_change(&change);
        assert!(message.contains("400 000 zł → *410 000 zł*"));
    }
}
