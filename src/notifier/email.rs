use crate::config::EmailConfig;
use crate::model::{Listing, NotifyError};
use crate::utils::format_pln;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::{AsyncSmtpTransport, authentication::Credentials};
use lettre::{AsyncTransport, Tokio1Executor};

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let creds = Credentials::new(config.sender.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let from = config.sender.parse()?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<Mailbox>, _>>()?;

        Ok(Self {
            mailer,
            from,
            recipients,
        })
    }

    /// One HTML mail per cycle summarizing every new listing.
    pub async fn send_new_listings(&self, listings: &[Listing]) -> Result<(), NotifyError> {
        let subject = format!("🏠 {} nowych mieszkań we Wrocławiu", listings.len());
        let html = build_email_html(listings);

        let mut builder = Message::builder().from(self.from.clone());
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        let message = builder
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html)?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

fn build_email_html(listings: &[Listing]) -> String {
    let mut html = format!(
        "<html><body style=\"font-family: Arial, sans-serif;\">\
         <h2>🏠 Znaleziono {} nowych ofert we Wrocławiu!</h2>",
        listings.len()
    );

    for listing in listings {
        let area = listing
            .area
            .map(|a| format!("{a} m²"))
            .unwrap_or_else(|| "metraż nieznany".to_string());
        let per_m2 = listing
            .price_per_m2()
            .map(|p| format!(" • 💰 {} zł/m²", format_pln(p)))
            .unwrap_or_default();

        html.push_str(&format!(
            "<div style=\"border: 1px solid #ddd; margin: 10px 0; padding: 15px; border-radius: 5px;\">\
             <h3>{title}</h3>\
             <p style=\"color: #27ae60; font-size: 20px; font-weight: bold;\">{price} zł</p>\
             <p style=\"color: #7f8c8d;\">📐 {area}{per_m2} • 📍 {location} • 🌐 {portal}</p>\
             <p><a href=\"{url}\">Zobacz ogłoszenie →</a></p>\
             </div>",
            title = html_escape::encode_text(&listing.title),
            price = format_pln(listing.price),
            area = area,
            per_m2 = per_m2,
            location = html_escape::encode_text(&listing.location),
            portal = listing.portal.as_str().to_uppercase(),
            url = html_escape::encode_text(&listing.url),
        ));
    }

    html.push_str("</body></html>");
    html
}
