//! Application configuration loaded from environment variables.

use std::collections::HashMap;

use domain::pricing::{DEFAULT_DISCOUNT_CODES, DEFAULT_SHIPPING_FEE_CENTS, parse_discount_codes};
use domain::{Money, PricingConfig};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `SHIPPING_FEE_CENTS`: flat shipping fee (default: `500`)
/// - `DISCOUNT_CODES`: `CODE:PERCENT,...` (default: `SAVE10:10,SAVE20:20,WELCOME5:5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub shipping_fee_cents: i64,
    pub discount_codes: HashMap<String, u32>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(p) => p.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => defaults.log_format,
            Some(f) if f.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    reason: format!("expected text or json, got '{other}'"),
                });
            }
        };

        let shipping_fee_cents = match lookup("SHIPPING_FEE_CENTS") {
            Some(fee) => {
                let fee: i64 = fee.trim().parse().map_err(|e| ConfigError::Invalid {
                    key: "SHIPPING_FEE_CENTS",
                    reason: format!("{e}"),
                })?;
                if fee < 0 {
                    return Err(ConfigError::Invalid {
                        key: "SHIPPING_FEE_CENTS",
                        reason: "must not be negative".to_string(),
                    });
                }
                fee
            }
            None => defaults.shipping_fee_cents,
        };

        let discount_codes = match lookup("DISCOUNT_CODES") {
            Some(codes) => {
                parse_discount_codes(&codes).map_err(|reason| ConfigError::Invalid {
                    key: "DISCOUNT_CODES",
                    reason,
                })?
            }
            None => defaults.discount_codes,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            shipping_fee_cents,
            discount_codes,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the pricing rules applied at order creation.
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig::new(
            Money::from_cents(self.shipping_fee_cents),
            self.discount_codes.clone(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            shipping_fee_cents: DEFAULT_SHIPPING_FEE_CENTS,
            discount_codes: parse_discount_codes(DEFAULT_DISCOUNT_CODES).unwrap_or_default(),
        }
    }
}
