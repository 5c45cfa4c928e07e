//! OpenStreetMap Nominatim reverse-geocoding client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{GeocodeError, Geocoder, Placemark};
use crate::config::GeocoderConfig;

/// Reverse geocoder backed by a Nominatim `/reverse` endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    inner: Arc<NominatimInner>,
}

struct NominatimInner {
    client: reqwest::Client,
    endpoint: Url,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    municipality: Option<String>,
    country: Option<String>,
}

impl From<NominatimAddress> for Placemark {
    fn from(a: NominatimAddress) -> Self {
        Self {
            thoroughfare: a.road,
            sub_thoroughfare: a.house_number,
            locality: a.city.or(a.town).or(a.village),
            sub_admin_area: a.county.or(a.municipality),
            country_name: a.country,
        }
    }
}

impl NominatimGeocoder {
    #[must_use]
    pub fn new(config: &GeocoderConfig) -> Self {
        Self {
            inner: Arc::new(NominatimInner {
                client: reqwest::Client::new(),
                endpoint: config.url.clone(),
                user_agent: config.user_agent.clone(),
            }),
        }
    }

    fn reverse_url(&self, latitude: f64, longitude: f64) -> Url {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("addressdetails", "1");
        url
    }
}

/// Placemarks in a Nominatim reply. "Unable to geocode" means no match.
fn placemarks(response: ReverseResponse) -> Result<Vec<Placemark>, GeocodeError> {
    match (response.error, response.address) {
        (_, Some(address)) => Ok(vec![address.into()]),
        (Some(error), None) if error.eq_ignore_ascii_case("unable to geocode") => Ok(vec![]),
        (Some(error), None) => Err(GeocodeError::Service(error)),
        (None, None) => Ok(vec![]),
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Vec<Placemark>, GeocodeError> {
        let response = self
            .inner
            .client
            .get(self.reverse_url(latitude, longitude))
            .header("User-Agent", &self.inner.user_agent)
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;

        let placemarks = placemarks(response)?;
        debug!(count = placemarks.len(), "Reverse geocoding complete");
        Ok(placemarks)
    }
}
