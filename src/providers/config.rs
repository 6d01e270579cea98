//! Configuration for the provider clients.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ProviderError, ProviderResult};

/// Default Geoapify API base URL.
pub const DEFAULT_GEOAPIFY_URL: &str = "https://api.geoapify.com";
/// Default WeatherAPI base URL.
pub const DEFAULT_WEATHER_URL: &str = "https://api.weatherapi.com";

/// Category tags used for sights and attractions.
pub const ATTRACTION_CATEGORIES: &str = "tourism.sights,tourism.attraction";
/// Category tags used for restaurants and fast food.
pub const FOOD_CATEGORIES: &str = "catering.restaurant,catering.fast_food";

const GEOAPIFY_KEY_ENV: &str = "VOYAGE_GEOAPIFY_API_KEY";
const WEATHER_KEY_ENV: &str = "VOYAGE_WEATHER_API_KEY";
const GEOAPIFY_URL_ENV: &str = "VOYAGE_GEOAPIFY_URL";
const WEATHER_URL_ENV: &str = "VOYAGE_WEATHER_URL";

/// Configuration shared by the geocoding, places and weather clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Geoapify API (geocoding and places).
    pub geoapify_url: String,
    /// Base URL of the WeatherAPI service.
    pub weather_url: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Search radius around the destination, in meters.
    pub radius_meters: u32,
    /// Places requested per trip day.
    pub places_per_day: u32,
    /// Category filter for attractions.
    pub attraction_categories: String,
    /// Category filter for food venues.
    pub food_categories: String,
    /// Provider credentials.
    pub api_keys: ApiKeys,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geoapify_url: DEFAULT_GEOAPIFY_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            radius_meters: 5_000,
            places_per_day: 5,
            attraction_categories: ATTRACTION_CATEGORIES.to_string(),
            food_categories: FOOD_CATEGORIES.to_string(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl ProviderConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from defaults overridden by `VOYAGE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(GEOAPIFY_URL_ENV) {
            config.geoapify_url = url;
        }
        if let Ok(url) = std::env::var(WEATHER_URL_ENV) {
            config.weather_url = url;
        }
        config.api_keys.geoapify = non_empty_env(GEOAPIFY_KEY_ENV);
        config.api_keys.weather = non_empty_env(WEATHER_KEY_ENV);
        config
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set Geoapify API key.
    #[must_use]
    pub fn with_geoapify_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.geoapify = Some(key.into());
        self
    }

    /// Set WeatherAPI key.
    #[must_use]
    pub fn with_weather_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.weather = Some(key.into());
        self
    }

    /// Point the Geoapify client at another base URL.
    #[must_use]
    pub fn with_geoapify_url(mut self, url: impl Into<String>) -> Self {
        self.geoapify_url = url.into();
        self
    }

    /// Point the weather client at another base URL.
    #[must_use]
    pub fn with_weather_url(mut self, url: impl Into<String>) -> Self {
        self.weather_url = url.into();
        self
    }

    /// Maximum number of places to request for a trip of `days` days.
    #[must_use]
    pub const fn place_limit(&self, days: u32) -> u32 {
        days.saturating_mul(self.places_per_day)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if a base URL does not parse or a numeric bound is zero.
    pub fn validate(&self) -> ProviderResult<()> {
        Url::parse(&self.geoapify_url)?;
        Url::parse(&self.weather_url)?;

        if self.radius_meters == 0 {
            return Err(ProviderError::Config("radius_meters must be > 0".to_string()));
        }
        if self.places_per_day == 0 {
            return Err(ProviderError::Config(
                "places_per_day must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// API keys for the providers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Geoapify key (geocoding and places).
    pub geoapify: Option<String>,
    /// WeatherAPI key.
    pub weather: Option<String>,
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
