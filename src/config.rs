use crate::model::SearchCriteria;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub criteria: SearchCriteria,
    pub notifications: NotificationsConfig,
    pub check_interval_minutes: u64,
    pub portals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    pub email: EmailConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    /// Price changes are always detected; whether they are sent out is a
    /// separate decision, off unless asked for.
    #[serde(default)]
    pub notify_price_changes: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads configuration. Environment variables win (cloud deployments set
/// them instead of shipping a file); otherwise `config.json` is read and,
/// when missing, created with defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    if std::env::var("EMAIL_SENDER").is_ok() {
        info!("Using configuration from environment variables");
        return Ok(AppConfig::from_env());
    }

    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("No {path} found, writing a default one");
            let config = AppConfig::default();
            fs::write(path, serde_json::to_string_pretty(&config)?)?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

impl AppConfig {
    fn from_env() -> AppConfig {
        let sender = env_or("EMAIL_SENDER", "");
        let recipients = std::env::var("EMAIL_RECIPIENT")
            .unwrap_or_else(|_| sender.clone())
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        AppConfig {
            criteria: SearchCriteria {
                min_price: env_parse("MIN_PRICE", 200_000.0),
                max_price: env_parse("MAX_PRICE", 500_000.0),
                min_area: env_parse("MIN_AREA", 35.0),
                max_area: env_parse("MAX_AREA", 70.0),
                city: "Wrocław".to_string(),
            },
            notifications: NotificationsConfig {
                email: EmailConfig {
                    enabled: true,
                    smtp_server: env_or("SMTP_SERVER", "smtp.gmail.com"),
                    smtp_port: env_parse("SMTP_PORT", 587),
                    sender,
                    password: env_or("EMAIL_PASSWORD", ""),
                    recipients,
                },
                telegram: TelegramConfig {
                    enabled: env_or("TELEGRAM_ENABLED", "false").to_lowercase() == "true",
                    bot_token: env_or("TELEGRAM_BOT_TOKEN", ""),
                    chat_id: env_or("TELEGRAM_CHAT_ID", ""),
                    notify_price_changes: env_or("NOTIFY_PRICE_CHANGES", "false").to_lowercase()
                        == "true",
                },
            },
            check_interval_minutes: env_parse("CHECK_INTERVAL", 60),
            portals: env_or("PORTALS", "otodom,olx,gratka")
                .split(',')
                .map(|p| p.trim().to_string())
                .collect(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            criteria: SearchCriteria::default(),
            notifications: NotificationsConfig {
                email: EmailConfig {
                    enabled: false,
                    smtp_server: "smtp.gmail.com".to_string(),
                    smtp_port: 587,
                    sender: "twoj_email@gmail.com".to_string(),
                    password: "haslo_aplikacji".to_string(),
                    recipients: vec!["twoj_email@gmail.com".to_string()],
                },
                telegram: TelegramConfig {
                    enabled: false,
                    bot_token: String::new(),
                    chat_id: String::new(),
                    notify_price_changes: false,
                },
            },
            check_interval_minutes: 30,
            portals: vec![
                "otodom".to_string(),
                "olx".to_string(),
                "gratka".to_string(),
            ],
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Could not parse {key}={raw}, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config_file() {
        let json = r#"{
            "criteria": {
                "min_price": 250000,
                "max_price": 450000,
                "min_area": 40,
                "max_area": 65,
                "city": "Wrocław"
            },
            "notifications": {
                "email": {
                    "enabled": true,
                    "smtp_server": "smtp.example.com",
                    "smtp_port": 587,
                    "sender": "bot@example.com",
                    "password": "secret",
                    "recipients": ["me@example.com"]
                },
                "telegram": {
                    "enabled": true,
                    "bot_token": "123:abc",
                    "chat_id": "42"
                }
            },
            "check_interval_minutes": 15,
            "portals": ["otodom", "olx"]
        }"#;

        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.criteria.min_price, 250_000.0);
        assert_eq!(config.check_interval_minutes, 15);
        assert_eq!(config.portals, vec!["otodom", "olx"]);
        assert!(config.notifications.telegram.enabled);
        // absent from the file => detection without notification
        assert!(!config.notifications.telegram.notify_price_changes);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.criteria.max_price, config.criteria.max_price);
        assert_eq!(parsed.portals.len(), 3);
        assert!(!parsed.notifications.email.enabled);
    }
}
