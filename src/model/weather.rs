//! Weather observations delivered by the data feed

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Station readings as of one observation date
///
/// Cumulative figures run from the start of the current season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub station: String,
    pub observed_on: NaiveDate,
    /// Millimetres since season start
    pub cumulative_rainfall: f64,
    /// Degrees Celsius
    pub max_temperature: f64,
    pub consecutive_dry_days: u32,
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Reported harvest yield per acre, once available
    #[serde(default)]
    pub yield_per_area: Option<f64>,
}

/// Index underlying a weather derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherIndex {
    Rainfall,
    Temperature,
    Humidity,
}

impl WeatherIndex {
    /// Realized index value read from a snapshot
    pub fn value_from(&self, snapshot: &WeatherSnapshot) -> Option<f64> {
        match self {
            WeatherIndex::Rainfall => Some(snapshot.cumulative_rainfall),
            WeatherIndex::Temperature => Some(snapshot.max_temperature),
            WeatherIndex::Humidity => snapshot.humidity,
        }
    }
}
