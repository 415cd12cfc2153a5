//! Weather providers and their canonical input.

mod open_weather_map;

pub use open_weather_map::{OpenWeatherMap, ONE_CALL_URL};

use crate::config::{Secret, WeatherModel};
use crate::traits::ScaleType;

/// Upstream sections the One Call API accepts in `exclude`.
pub const KNOWN_EXCLUDE_FLAGS: [&str; 5] = ["current", "minutely", "hourly", "daily", "alerts"];

/// Sections the provider reads and therefore refuses to exclude.
pub const REQUIRED_SECTIONS: [&str; 2] = ["current", "daily"];

/// Validated weather provider input.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherObject {
    /// Provider tag.
    pub model: WeatherModel,
    /// API key.
    pub api_token: Secret,
    /// Decimal degrees in [-90, 90].
    pub latitude: f64,
    /// Decimal degrees in [-180, 180].
    pub longitude: f64,
    /// Sections left out of the response, in the order supplied.
    pub exclude_flags: Vec<String>,
    /// Output scale.
    pub scale: ScaleType,
}
