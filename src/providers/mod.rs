//! Travel data providers for the Voyage agent.
//!
//! This module wraps the three third-party services the planner talks to:
//! - Geocoding (Geoapify): destination text to coordinates
//! - Places (Geoapify): attractions and food venues around a coordinate
//! - Weather (WeatherAPI): daily forecast for a coordinate
//!
//! Each service sits behind a small capability trait so the conversation
//! controller can be driven by deterministic fakes. The HTTP implementations
//! never surface errors through the traits: failures are logged and degrade
//! to "nothing found".

pub mod config;
pub mod error;
pub mod geoapify;
pub mod types;
pub mod weatherapi;

pub use config::{ATTRACTION_CATEGORIES, FOOD_CATEGORIES, ProviderConfig};
pub use error::{ProviderError, ProviderResult};
pub use geoapify::GeoapifyClient;
pub use types::{Location, Place, WeatherDay};
pub use weatherapi::WeatherApiClient;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future type for provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Turns free-text destinations into coordinates.
pub trait Geocoder: Send + Sync {
    /// Resolve `text` to its best-matching location.
    ///
    /// Returns `None` when nothing matched or the provider could not be reached.
    fn resolve(&self, text: &str) -> ProviderFuture<'_, Option<Location>>;
}

/// Finds points of interest around a coordinate.
pub trait PlaceFinder: Send + Sync {
    /// Fetch up to `days × places_per_day` places of `categories` near `location`.
    ///
    /// Returns an empty list on failure.
    fn find(
        &self,
        location: Location,
        categories: &str,
        days: u32,
    ) -> ProviderFuture<'_, Vec<Place>>;
}

/// Produces a daily weather forecast.
pub trait WeatherForecaster: Send + Sync {
    /// One entry per day starting today, ascending by date. Empty on failure.
    fn forecast(&self, location: Location, days: u32) -> ProviderFuture<'_, Vec<WeatherDay>>;
}

/// The three providers the planner needs, bundled for injection.
#[derive(Clone)]
pub struct TravelProviders {
    /// Destination geocoder.
    pub geocoder: Arc<dyn Geocoder>,
    /// Attraction and food lookup.
    pub places: Arc<dyn PlaceFinder>,
    /// Weather forecast lookup.
    pub weather: Arc<dyn WeatherForecaster>,
}

impl TravelProviders {
    /// Bundle arbitrary provider implementations.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        places: Arc<dyn PlaceFinder>,
        weather: Arc<dyn WeatherForecaster>,
    ) -> Self {
        Self {
            geocoder,
            places,
            weather,
        }
    }

    /// Build the HTTP-backed providers from configuration.
    ///
    /// Geocoding and places share one Geoapify client; all clients share one
    /// connection pool.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        config.validate()?;
        let client = build_client(config)?;

        if config.api_keys.geoapify.is_none() {
            tracing::warn!("Geoapify API key not configured; destinations will not resolve");
        }
        if config.api_keys.weather.is_none() {
            tracing::warn!("WeatherAPI key not configured; forecasts will be empty");
        }

        let geoapify = Arc::new(GeoapifyClient::new(client.clone(), config.clone()));
        let weather = Arc::new(WeatherApiClient::new(client, config.clone()));

        Ok(Self {
            geocoder: geoapify.clone(),
            places: geoapify,
            weather,
        })
    }
}

/// Build an HTTP client with appropriate headers and settings.
fn build_client(config: &ProviderConfig) -> ProviderResult<reqwest::Client> {
    use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

    let mut headers = HeaderMap::new();

    let ua = format!("voyage-agent/{}", env!("CARGO_PKG_VERSION"));
    if let Ok(ua_value) = HeaderValue::from_str(&ua) {
        headers.insert(USER_AGENT, ua_value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| ProviderError::HttpClient(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_from_default_config() {
        let providers = TravelProviders::from_config(&ProviderConfig::default());
        assert!(providers.is_ok());
    }

    #[test]
    fn test_providers_reject_invalid_config() {
        let config = ProviderConfig::default().with_weather_url("::");
        assert!(TravelProviders::from_config(&config).is_err());
    }
}
