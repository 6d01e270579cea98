//! WeatherAPI forecast implementation.
//!
//! Requires an API key from https://www.weatherapi.com/

use chrono::NaiveDate;
use serde::Deserialize;
use url::Url;

use crate::providers::config::ProviderConfig;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::types::{Location, WeatherDay};
use crate::providers::{ProviderFuture, WeatherForecaster};

const PROVIDER: &str = "WeatherAPI";
const FORECAST_PATH: &str = "/v1/forecast.json";

/// Client for the WeatherAPI daily forecast endpoint.
pub struct WeatherApiClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl WeatherApiClient {
    /// Create a client on top of a shared HTTP client.
    #[must_use]
    pub const fn new(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    /// Fetch `days` daily forecasts for `location`.
    ///
    /// # Errors
    /// Returns an error if the API key is missing, the request fails, or the
    /// response cannot be decoded.
    pub async fn daily(&self, location: Location, days: u32) -> ProviderResult<Vec<WeatherDay>> {
        let api_key = self
            .config
            .api_keys
            .weather
            .as_deref()
            .ok_or(ProviderError::ApiKeyRequired(PROVIDER))?;
        let url = build_url(&self.config.weather_url, location, days, api_key)?;
        tracing::debug!("Fetching {days}-day forecast near {location}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus {
                provider: PROVIDER,
                status: response.status(),
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

impl WeatherForecaster for WeatherApiClient {
    fn forecast(&self, location: Location, days: u32) -> ProviderFuture<'_, Vec<WeatherDay>> {
        Box::pin(async move {
            self.daily(location, days).await.unwrap_or_else(|e| {
                tracing::error!("Weather forecast failed: {e}");
                Vec::new()
            })
        })
    }
}

/// Build the forecast URL with query parameters.
fn build_url(base: &str, location: Location, days: u32, api_key: &str) -> ProviderResult<Url> {
    let mut url = Url::parse(&format!("{}{FORECAST_PATH}", base.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("key", api_key)
        .append_pair("q", &format!("{},{}", location.lat, location.lon))
        .append_pair("days", &days.to_string())
        .append_pair("aqi", "no")
        .append_pair("alerts", "no");
    Ok(url)
}

/// Parse the forecast response, keeping days in ascending date order.
fn parse_response(body: &str) -> ProviderResult<Vec<WeatherDay>> {
    let response: ForecastResponse = serde_json::from_str(body)?;

    let mut days = response
        .forecast
        .forecastday
        .into_iter()
        .map(|entry| {
            let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d").map_err(|e| {
                ProviderError::UnexpectedResponse {
                    provider: PROVIDER,
                    detail: format!("bad date {:?}: {e}", entry.date),
                }
            })?;
            Ok(WeatherDay {
                date,
                condition: entry.day.condition.text,
                icon: entry.day.condition.icon,
                temp: entry.day.avgtemp_c,
                humidity: humidity_percent(entry.day.avghumidity),
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    days.sort_by_key(|day| day.date);
    Ok(days)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn humidity_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

// WeatherAPI response structures

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    date: String,
    day: DaySummary,
}

#[derive(Debug, Deserialize)]
struct DaySummary {
    avgtemp_c: f64,
    avghumidity: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
    #[serde(default)]
    icon: String,
}
