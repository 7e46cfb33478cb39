use crate::core::{AppError, Currency, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
///
/// Loaded once at start-up and injected into the services that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub documents: DocumentsConfig,
    pub gateway: GatewayConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Where generated PDFs live and how the external renderer is invoked
#[derive(Debug, Clone)]
pub struct DocumentsConfig {
    pub base_dir: PathBuf,
    pub invoices_dir: PathBuf,
    pub receipts_dir: PathBuf,
    pub wkhtmltopdf_cmd: String,
    pub render_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub fallback_email: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let base_dir = PathBuf::from(
            env::var("DOCUMENTS_BASE_DIR").unwrap_or_else(|_| "data".to_string()),
        );

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
                log_format: match env::var("LOG_FORMAT").as_deref() {
                    Ok("json") => LogFormat::Json,
                    _ => LogFormat::Pretty,
                },
                currency: env::var("CURRENCY")
                    .unwrap_or_else(|_| "INR".to_string())
                    .parse()
                    .map_err(|e: String| AppError::Configuration(e))?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            documents: DocumentsConfig {
                invoices_dir: base_dir.join(
                    env::var("INVOICES_DIR").unwrap_or_else(|_| "invoices".to_string()),
                ),
                receipts_dir: base_dir.join(
                    env::var("RECEIPTS_DIR").unwrap_or_else(|_| "receipts".to_string()),
                ),
                base_dir,
                wkhtmltopdf_cmd: env::var("WKHTMLTOPDF_CMD")
                    .unwrap_or_else(|_| "/usr/bin/wkhtmltopdf".to_string()),
                render_timeout: Duration::from_secs(
                    env::var("RENDER_TIMEOUT_SECS")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .map_err(|_| {
                            AppError::Configuration("Invalid RENDER_TIMEOUT_SECS".to_string())
                        })?,
                ),
            },
            gateway: GatewayConfig {
                key_id: env::var("PAYMENT_GATEWAY_KEY_ID").unwrap_or_default(),
                key_secret: env::var("PAYMENT_GATEWAY_KEY_SECRET").unwrap_or_default(),
                webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").map_err(|_| {
                    AppError::Configuration("PAYMENT_WEBHOOK_SECRET not set".to_string())
                })?,
                base_url: env::var("PAYMENT_GATEWAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            },
            notifications: NotificationConfig {
                fallback_email: env::var("NOTIFICATION_FALLBACK_EMAIL")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.documents.render_timeout.is_zero() {
            return Err(AppError::Configuration(
                "Render timeout must be greater than 0".to_string(),
            ));
        }

        if self.gateway.webhook_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "Webhook secret cannot be empty".to_string(),
            ));
        }

        if self.documents.invoices_dir == self.documents.receipts_dir {
            return Err(AppError::Configuration(
                "Invoices and receipts must use different directories".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}
