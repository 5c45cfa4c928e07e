//! Wire types of the game-search API.
//!
//! Every field is optional on the wire; mapping rules live in
//! [`super::conversions`].

use serde::Deserialize;

/// Top-level search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<SearchResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// One search hit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub game_info: Option<GameInfo>,
}

/// Game details attached to a search hit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameInfo {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_desc: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub release_date: Option<i64>,
    /// Lowest known price in USD.
    #[serde(default)]
    pub lowest_price: Option<f64>,
}

impl SearchResponse {
    /// The items of a successful response.
    #[must_use]
    pub fn into_items(self) -> Vec<RawItem> {
        self.results.map(|r| r.items).unwrap_or_default()
    }
}
