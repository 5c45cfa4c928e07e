//! Integration tests for the GameVerse storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gameverse-integration-tests
//! ```
//!
//! Every test runs against a private in-memory SQLite database. The remote
//! catalog is either an in-process fake or a loopback HTTP server serving
//! canned JSON, so no network access is needed.
//!
//! # Test Categories
//!
//! - `catalog_sync` - Remote catalog over HTTP into the view state
//! - `storefront_flow` - Accounts, profile, cart and admin edits end to end
//! - `location` - Address resolution through the shared state

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use url::Url;

use gameverse_storefront::catalog::types::SearchResponse;
use gameverse_storefront::catalog::{CatalogError, CatalogSource, RawItem};
use gameverse_storefront::config::{CatalogConfig, GeocoderConfig, StorefrontConfig};
use gameverse_storefront::db::Database;
use gameverse_storefront::location::{GeocodeError, Geocoder, Placemark};
use gameverse_storefront::state::AppState;

/// Query the background sync sends in tests.
pub const SYNC_QUERY: &str = "zelda";

/// Two games with ids, one hit without game info.
pub const SEARCH_FIXTURE: &str = r#"{
    "success": true,
    "results": {
        "items": [
            {
                "type": "Game",
                "title": "Breath of the Wild",
                "text": "Open-air adventure",
                "image": "https://example.com/botw.jpg",
                "game_info": {
                    "id": 101,
                    "name": "The Legend of Zelda: Breath of the Wild",
                    "short_desc": "Explore Hyrule",
                    "release_date": 1488499200,
                    "lowest_price": 19.99
                }
            },
            {
                "type": "Game",
                "title": "Tears of the Kingdom",
                "image": "https://example.com/totk.jpg",
                "game_info": {
                    "id": 102,
                    "lowest_price": 40.0
                }
            },
            {
                "type": "Article",
                "title": "Zelda retrospective"
            }
        ]
    }
}"#;

/// Configuration pointing at `api_url`, with the production price rate.
///
/// # Panics
///
/// Panics if the geocoder placeholder URL fails to parse.
#[must_use]
pub fn test_config(api_url: Url) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("sqlite::memory:"),
        catalog: CatalogConfig {
            api_url,
            sync_query: SYNC_QUERY.to_string(),
            price_rate: Decimal::from(950),
        },
        geocoder: GeocoderConfig {
            url: Url::parse("http://127.0.0.1:9/reverse").expect("valid URL"),
            user_agent: "gameverse-tests".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Application state over an in-memory database.
///
/// # Panics
///
/// Panics if the database cannot be opened.
pub async fn test_state(config: StorefrontConfig, catalog: Arc<dyn CatalogSource>) -> AppState {
    let database = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    AppState::new(config, database, catalog, Arc::new(StreetGeocoder))
}

/// State whose catalog returns the parsed [`SEARCH_FIXTURE`] without HTTP.
///
/// # Panics
///
/// Panics if the database cannot be opened.
pub async fn fixture_state() -> AppState {
    let config = test_config(Url::parse("http://127.0.0.1:9/api/v3/").expect("valid URL"));
    test_state(config, Arc::new(StaticCatalog::fixture())).await
}

/// A catalog that returns the same items for every query.
pub struct StaticCatalog {
    items: Vec<RawItem>,
}

impl StaticCatalog {
    /// # Panics
    ///
    /// Panics if [`SEARCH_FIXTURE`] does not parse.
    #[must_use]
    pub fn fixture() -> Self {
        let response: SearchResponse =
            serde_json::from_str(SEARCH_FIXTURE).expect("fixture parses");
        Self {
            items: response.into_items(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn search(&self, _query: &str) -> Result<Vec<RawItem>, CatalogError> {
        Ok(self.items.clone())
    }
}

/// Resolves every coordinate to the same street address.
pub struct StreetGeocoder;

#[async_trait]
impl Geocoder for StreetGeocoder {
    async fn reverse(&self, _: f64, _: f64) -> Result<Vec<Placemark>, GeocodeError> {
        Ok(vec![Placemark {
            thoroughfare: Some("Jalan Sudirman".to_string()),
            sub_thoroughfare: Some("12".to_string()),
            locality: Some("Jakarta".to_string()),
            sub_admin_area: None,
            country_name: Some("Indonesia".to_string()),
        }])
    }
}

/// A loopback HTTP server answering every request with one canned response.
pub struct CannedServer {
    /// Base URL ending in `/api/v3/`.
    pub url: Url,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    /// Start serving `body` with `status`.
    ///
    /// # Panics
    ///
    /// Panics if no loopback port can be bound.
    pub async fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind loopback listener");
        let addr = listener.local_addr().expect("listener has an address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let response = response.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        if socket.read_buf(&mut request).await? == 0 {
                            break;
                        }
                    }
                    let text = String::from_utf8_lossy(&request);
                    if let Some(line) = text.lines().next()
                        && let Ok(mut log) = log.lock()
                    {
                        log.push(line.to_string());
                    }
                    socket.write_all(response.as_bytes()).await?;
                    socket.shutdown().await
                });
            }
        });

        Self {
            url: Url::parse(&format!("http://{addr}/api/v3/")).expect("valid URL"),
            requests,
        }
    }

    /// Request lines received so far, e.g. `GET /api/v3/search?... HTTP/1.1`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

/// Wait until `rx` holds a value matching `pred` and return it.
///
/// # Panics
///
/// Panics after five seconds or if the sender is dropped.
pub async fn wait_until<T: Clone>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) -> T {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("publisher dropped")
        .clone()
}
