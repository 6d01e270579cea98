//! Geoapify geocoding and places implementation.
//!
//! Uses the Geoapify REST API for both destination lookup and nearby
//! points of interest. Requires an API key from https://www.geoapify.com/

use serde::Deserialize;
use url::Url;

use crate::providers::config::ProviderConfig;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::types::{Location, Place, UNNAMED_PLACE};
use crate::providers::{Geocoder, PlaceFinder, ProviderFuture};

const PROVIDER: &str = "Geoapify";
const GEOCODE_PATH: &str = "/v1/geocode/search";
const PLACES_PATH: &str = "/v2/places";

/// Geoapify client serving both geocoding and place lookups.
pub struct GeoapifyClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl GeoapifyClient {
    /// Create a client on top of a shared HTTP client.
    #[must_use]
    pub const fn new(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    /// Look up the best match for `text`.
    ///
    /// # Errors
    /// Returns an error if the API key is missing, the request fails, or the
    /// response cannot be decoded. An empty result set is `Ok(None)`.
    pub async fn geocode(&self, text: &str) -> ProviderResult<Option<Location>> {
        let api_key = self.api_key()?;
        let url = build_geocode_url(&self.config.geoapify_url, text, api_key)?;
        tracing::debug!("Geocoding destination: {text}");

        let body = self.fetch(url).await?;
        parse_geocode_response(&body)
    }

    /// Fetch up to `limit` places of `categories` around `location`.
    ///
    /// # Errors
    /// Returns an error if the API key is missing, the request fails, or the
    /// response cannot be decoded.
    pub async fn places(
        &self,
        location: Location,
        categories: &str,
        limit: u32,
    ) -> ProviderResult<Vec<Place>> {
        let api_key = self.api_key()?;
        let url = build_places_url(
            &self.config.geoapify_url,
            location,
            categories,
            self.config.radius_meters,
            limit,
            api_key,
        )?;
        tracing::debug!("Fetching up to {limit} places [{categories}] near {location}");

        let body = self.fetch(url).await?;
        parse_places_response(&body)
    }

    fn api_key(&self) -> ProviderResult<&str> {
        self.config
            .api_keys
            .geoapify
            .as_deref()
            .ok_or(ProviderError::ApiKeyRequired(PROVIDER))
    }

    async fn fetch(&self, url: Url) -> ProviderResult<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus {
                provider: PROVIDER,
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Geocoder for GeoapifyClient {
    fn resolve(&self, text: &str) -> ProviderFuture<'_, Option<Location>> {
        let text = text.trim().to_string();
        Box::pin(async move {
            match self.geocode(&text).await {
                Ok(Some(location)) => Some(location),
                Ok(None) => {
                    tracing::info!("No geocoding result for: {text}");
                    None
                }
                Err(e) => {
                    tracing::error!("Geocoding failed for {text}: {e}");
                    None
                }
            }
        })
    }
}

impl PlaceFinder for GeoapifyClient {
    fn find(
        &self,
        location: Location,
        categories: &str,
        days: u32,
    ) -> ProviderFuture<'_, Vec<Place>> {
        let categories = categories.to_string();
        let limit = self.config.place_limit(days);
        Box::pin(async move {
            self.places(location, &categories, limit)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("Place lookup [{categories}] failed: {e}");
                    Vec::new()
                })
        })
    }
}

fn endpoint(base: &str, path: &str) -> ProviderResult<Url> {
    Ok(Url::parse(&format!("{}{path}", base.trim_end_matches('/')))?)
}

/// Build the geocoding URL with query parameters.
fn build_geocode_url(base: &str, text: &str, api_key: &str) -> ProviderResult<Url> {
    let mut url = endpoint(base, GEOCODE_PATH)?;
    url.query_pairs_mut()
        .append_pair("text", text)
        .append_pair("limit", "1")
        .append_pair("format", "json")
        .append_pair("apiKey", api_key);
    Ok(url)
}

/// Build the places URL: a circle filter plus a proximity bias on the same point.
fn build_places_url(
    base: &str,
    location: Location,
    categories: &str,
    radius_meters: u32,
    limit: u32,
    api_key: &str,
) -> ProviderResult<Url> {
    let mut url = endpoint(base, PLACES_PATH)?;
    url.query_pairs_mut()
        .append_pair("categories", categories)
        .append_pair(
            "filter",
            &format!("circle:{},{},{radius_meters}", location.lon, location.lat),
        )
        .append_pair("bias", &format!("proximity:{},{}", location.lon, location.lat))
        .append_pair("limit", &limit.to_string())
        .append_pair("apiKey", api_key);
    Ok(url)
}

/// Parse a `format=json` geocoding response; the first result wins.
fn parse_geocode_response(body: &str) -> ProviderResult<Option<Location>> {
    let response: GeocodeResponse = serde_json::from_str(body)?;
    Ok(response
        .results
        .into_iter()
        .next()
        .map(|result| Location::new(result.lat, result.lon)))
}

/// Parse a GeoJSON places response.
fn parse_places_response(body: &str) -> ProviderResult<Vec<Place>> {
    let response: PlacesResponse = serde_json::from_str(body)?;
    Ok(response
        .features
        .into_iter()
        .map(|feature| {
            let props = feature.properties;
            Place {
                name: props
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNNAMED_PLACE.to_string()),
                categories: props.categories.unwrap_or_default(),
                formatted: props.formatted.unwrap_or_default(),
                place_id: props.place_id,
                lat: props.lat,
                lon: props.lon,
            }
        })
        .collect())
}

// Geoapify API response structures

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    features: Vec<PlaceFeature>,
}

#[derive(Debug, Deserialize)]
struct PlaceFeature {
    properties: PlaceProperties,
}

#[derive(Debug, Deserialize)]
struct PlaceProperties {
    name: Option<String>,
    categories: Option<Vec<String>>,
    formatted: Option<String>,
    #[serde(default)]
    place_id: String,
    lat: Option<f64>,
    lon: Option<f64>,
}
