//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `GAMEVERSE_DATABASE_URL` - SQLite connection string
//!   (default: `sqlite://gameverse.db?mode=rwc`, falls back to `DATABASE_URL`)
//! - `CATALOG_API_URL` - Base URL of the game-search API
//!   (default: `https://www.nexarda.com/api/v3/`)
//! - `CATALOG_SYNC_QUERY` - Search query used by the background sync (default: empty)
//! - `CATALOG_PRICE_RATE` - USD to local currency rate (default: 950)
//! - `GEOCODER_URL` - Reverse-geocoding endpoint
//!   (default: `https://nominatim.openstreetmap.org/reverse`)
//! - `GEOCODER_USER_AGENT` - User-Agent sent to the geocoder
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://gameverse.db?mode=rwc";
const DEFAULT_CATALOG_API_URL: &str = "https://www.nexarda.com/api/v3/";
const DEFAULT_PRICE_RATE: &str = "950";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_GEOCODER_USER_AGENT: &str = concat!("gameverse/", env!("CARGO_PKG_VERSION"));

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// SQLite database URL
    pub database_url: SecretString,
    /// Remote catalog settings
    pub catalog: CatalogConfig,
    /// Reverse-geocoding settings
    pub geocoder: GeocoderConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Remote game-search API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL; request paths are joined onto it, so it should end in `/`.
    pub api_url: Url,
    /// Query sent by the background sync.
    pub sync_query: String,
    /// Multiplier from the API's USD prices to shop prices.
    pub price_rate: Decimal,
}

/// Reverse-geocoding service configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub url: Url,
    pub user_agent: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("GAMEVERSE_DATABASE_URL"),
            catalog: CatalogConfig::from_env()?,
            geocoder: GeocoderConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_sample_rate("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let rate_raw = get_env_or_default("CATALOG_PRICE_RATE", DEFAULT_PRICE_RATE);
        let price_rate = Decimal::from_str(rate_raw.trim()).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_PRICE_RATE".to_string(), e.to_string())
        })?;
        if price_rate.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_PRICE_RATE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            api_url: parse_url("CATALOG_API_URL", DEFAULT_CATALOG_API_URL)?,
            sync_query: get_env_or_default("CATALOG_SYNC_QUERY", ""),
            price_rate,
        })
    }
}

impl GeocoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url("GEOCODER_URL", DEFAULT_GEOCODER_URL)?,
            user_agent: get_env_or_default("GEOCODER_USER_AGENT", DEFAULT_GEOCODER_USER_AGENT),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`, then the local default.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    Url::parse(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a sample rate and check it lies in `0.0..=1.0`.
fn parse_sample_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate = get_env_or_default(key, default)
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls_parse() {
        assert!(Url::parse(DEFAULT_CATALOG_API_URL).is_ok());
        assert!(Url::parse(DEFAULT_GEOCODER_URL).is_ok());
    }

    #[test]
    fn test_default_price_rate() {
        assert_eq!(
            Decimal::from_str(DEFAULT_PRICE_RATE).unwrap(),
            Decimal::from(950)
        );
    }

    #[test]
    fn test_sample_rate_default_used_when_unset() {
        let rate = parse_sample_rate("GAMEVERSE_TEST_UNSET_SAMPLE_RATE", "0.25").unwrap();
        assert!((rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let result = parse_sample_rate("GAMEVERSE_TEST_UNSET_SAMPLE_RATE", "1.5");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_user_agent_names_crate_version() {
        assert!(DEFAULT_GEOCODER_USER_AGENT.starts_with("gameverse/"));
    }
}
