//! Value types returned by the travel data providers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name used when the places provider omits one.
pub const UNNAMED_PLACE: &str = "Unnamed Place";

/// A resolved geographic coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

/// A point of interest (attraction or food venue).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Display name.
    pub name: String,
    /// Provider category tags, most specific last.
    pub categories: Vec<String>,
    /// Human readable address.
    pub formatted: String,
    /// Provider identifier, unique within one fetch batch.
    pub place_id: String,
    /// Latitude, when the provider returned one.
    pub lat: Option<f64>,
    /// Longitude, when the provider returned one.
    pub lon: Option<f64>,
}

impl Place {
    /// Build a place with only a name and id; used by callers that
    /// have no address or coordinates.
    #[must_use]
    pub fn named(name: impl Into<String>, place_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            formatted: String::new(),
            place_id: place_id.into(),
            lat: None,
            lon: None,
        }
    }

    /// Coordinates of the place, if both components are known.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Location::new(lat, lon)),
            _ => None,
        }
    }
}

/// Forecast for a single day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    /// Calendar date of the forecast.
    pub date: NaiveDate,
    /// Condition text, e.g. "Partly cloudy".
    pub condition: String,
    /// Icon reference as returned by the provider.
    pub icon: String,
    /// Average temperature in Celsius.
    pub temp: f64,
    /// Average relative humidity in percent.
    pub humidity: u8,
}
