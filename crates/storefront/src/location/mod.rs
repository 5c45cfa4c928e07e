//! Reverse geocoding and the user's last known location.
//!
//! A [`Geocoder`] turns coordinates into [`Placemark`]s; [`describe_location`]
//! formats them into one line; [`LocationTracker`] keeps the latest
//! coordinates and their resolved address.

mod nominatim;
mod tracker;

pub use nominatim::NominatimGeocoder;
pub use tracker::{LocationState, LocationTracker};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub const ADDRESS_NOT_FOUND: &str = "Address not found";
pub const ADDRESS_UNAVAILABLE: &str = "Unable to resolve address";
pub const RESOLVING_ADDRESS: &str = "Resolving address...";

/// Errors from a reverse-geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder error: {0}")]
    Service(String),
}

/// Civic address parts of a location. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    /// Street name.
    pub thoroughfare: Option<String>,
    /// House number.
    pub sub_thoroughfare: Option<String>,
    /// City or town.
    pub locality: Option<String>,
    /// County or municipality, used when there is no locality.
    pub sub_admin_area: Option<String>,
    pub country_name: Option<String>,
}

/// A reverse-geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Placemarks for the coordinates, best match first. Empty if nothing
    /// is known there.
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Vec<Placemark>, GeocodeError>;
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Format the best placemark as `"<street> <number>, <locality>, <country>"`.
///
/// Segments that are missing are skipped. With no placemark at all the
/// result is [`ADDRESS_NOT_FOUND`]; with a placemark but no usable segment
/// it falls back to the coordinates.
#[must_use]
pub fn describe_location(latitude: f64, longitude: f64, placemarks: &[Placemark]) -> String {
    let Some(place) = placemarks.first() else {
        return ADDRESS_NOT_FOUND.to_string();
    };

    let mut parts = Vec::new();

    if let Some(street) = non_empty(place.thoroughfare.as_ref()) {
        match non_empty(place.sub_thoroughfare.as_ref()) {
            Some(number) => parts.push(format!("{street} {number}")),
            None => parts.push(street.to_string()),
        }
    }

    if let Some(area) = non_empty(place.locality.as_ref())
        .or_else(|| non_empty(place.sub_admin_area.as_ref()))
    {
        parts.push(area.to_string());
    }

    if let Some(country) = non_empty(place.country_name.as_ref()) {
        parts.push(country.to_string());
    }

    if parts.is_empty() {
        format!("Location ({latitude}, {longitude})")
    } else {
        parts.join(", ")
    }
}

/// Look up and format an address. Never fails; errors become
/// [`ADDRESS_UNAVAILABLE`].
pub async fn resolve_address(geocoder: &dyn Geocoder, latitude: f64, longitude: f64) -> String {
    match geocoder.reverse(latitude, longitude).await {
        Ok(placemarks) => describe_location(latitude, longitude, &placemarks),
        Err(e) => {
            warn!(error = %e, "Reverse geocoding failed");
            ADDRESS_UNAVAILABLE.to_string()
        }
    }
}
