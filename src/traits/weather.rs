//! Weather source abstraction.
//!
//! A [`WeatherSource`] fetches one payload per session and answers every
//! accessor from that cached payload. Temperatures are cached in Kelvin and
//! converted on the way out, so the cache never changes after
//! [`WeatherSource::retrieve_data`] returns.
//!
//! # Day indexing
//!
//! | Day | Meaning |
//! |-----|---------|
//! | 0 | current conditions |
//! | 1..=7 | daily forecast entries |

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Furthest forecast day any provider may be asked for.
pub const MAX_FORECAST_DAY: usize = 7;

// ============================================================================
// Temperature
// ============================================================================

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Kelvin to Celsius, unrounded.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Celsius to Fahrenheit, unrounded.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Output temperature scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl ScaleType {
    /// Unit suffix used in formatted strings.
    pub fn symbol(self) -> &'static str {
        match self {
            ScaleType::Celsius => "°C",
            ScaleType::Fahrenheit => "°F",
        }
    }

    /// Convert a Kelvin reading into this scale.
    pub fn from_kelvin(self, kelvin: f64) -> f64 {
        let celsius = kelvin_to_celsius(kelvin);
        match self {
            ScaleType::Celsius => celsius,
            ScaleType::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }
}

impl FromStr for ScaleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(ScaleType::Celsius),
            "fahrenheit" | "f" => Ok(ScaleType::Fahrenheit),
            other => Err(Error::config(
                "weather.scale",
                format!("unknown temperature scale `{other}`"),
            )),
        }
    }
}

/// A temperature in a known scale.
///
/// Displays with one decimal place: `12.3°C`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Temperature {
    /// Numeric value in `scale`.
    pub value: f64,
    /// Scale of `value`.
    pub scale: ScaleType,
}

impl Temperature {
    /// Build from a Kelvin reading.
    pub fn from_kelvin(kelvin: f64, scale: ScaleType) -> Self {
        Self {
            value: scale.from_kelvin(kelvin),
            scale,
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}{}", self.value, self.scale.symbol())
    }
}

// ============================================================================
// Icon Type
// ============================================================================

/// The nine conditions every provider normalizes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IconType {
    /// Clear sky.
    ClearSky,
    /// Few clouds.
    FewClouds,
    /// Scattered clouds.
    ScatteredClouds,
    /// Broken or overcast clouds.
    BrokenClouds,
    /// Showers and drizzle.
    ShowerRain,
    /// Steady rain.
    Rain,
    /// Thunderstorm.
    Thunderstorm,
    /// Snow, sleet and freezing rain.
    Snow,
    /// Mist, fog, haze, dust and the rest of the atmosphere group.
    Mist,
}

impl IconType {
    /// Every variant, in declaration order.
    pub const ALL: [IconType; 9] = [
        IconType::ClearSky,
        IconType::FewClouds,
        IconType::ScatteredClouds,
        IconType::BrokenClouds,
        IconType::ShowerRain,
        IconType::Rain,
        IconType::Thunderstorm,
        IconType::Snow,
        IconType::Mist,
    ];

    /// Map an OpenWeatherMap condition id.
    ///
    /// The table lists every id from the vendor's condition documentation
    /// together with the icon the vendor itself assigns to it. Ids that are
    /// not listed return `None`; callers turn that into
    /// [`Error::UnrecognizedCondition`].
    pub fn from_condition_code(code: u16) -> Option<IconType> {
        let icon = match code {
            200 | 201 | 202 | 210 | 211 | 212 | 221 | 230 | 231 | 232 => IconType::Thunderstorm,
            300 | 301 | 302 | 310 | 311 | 312 | 313 | 314 | 321 => IconType::ShowerRain,
            500 | 501 | 502 | 503 | 504 => IconType::Rain,
            511 => IconType::Snow,
            520 | 521 | 522 | 531 => IconType::ShowerRain,
            600 | 601 | 602 | 611 | 612 | 613 | 615 | 616 | 620 | 621 | 622 => IconType::Snow,
            701 | 711 | 721 | 731 | 741 | 751 | 761 | 762 | 771 | 781 => IconType::Mist,
            800 => IconType::ClearSky,
            801 => IconType::FewClouds,
            802 => IconType::ScatteredClouds,
            803 | 804 => IconType::BrokenClouds,
            _ => return None,
        };
        Some(icon)
    }
}

// ============================================================================
// Weather Source Trait
// ============================================================================

/// Weather data provider.
///
/// Every accessor reads the payload cached by [`retrieve_data`]; none of them
/// reaches the network. Calling an accessor first yields
/// [`Error::NotRetrieved`].
///
/// [`retrieve_data`]: WeatherSource::retrieve_data
pub trait WeatherSource {
    /// Fetch and cache the upstream payload. Idempotent: only the first call
    /// queries upstream.
    fn retrieve_data(&self) -> Result<()>;

    /// Scale every temperature accessor reports in.
    fn scale(&self) -> ScaleType;

    /// Icon for `day`.
    fn get_icon(&self, day: usize) -> Result<IconType>;

    /// Condition description for `day` (e.g. "light rain").
    fn get_condition(&self, day: usize) -> Result<String>;

    /// `(min, max)` for `day`.
    fn get_temp_range(&self, day: usize) -> Result<(Temperature, Temperature)>;

    /// Current temperature.
    fn get_current_temperature(&self) -> Result<Temperature>;

    /// Short current condition (e.g. "Clouds").
    fn get_current_condition(&self) -> Result<String>;

    /// Daytime temperature for `day`; day 0 is the current reading.
    fn get_future_weather(&self, day: usize) -> Result<Temperature>;

    /// `"<temperature> - <condition>"` for right now.
    fn get_current_weather(&self) -> Result<String> {
        Ok(format!(
            "{} - {}",
            self.get_current_temperature()?,
            self.get_current_condition()?
        ))
    }
}

/// Reject days beyond [`MAX_FORECAST_DAY`] before any payload is consulted.
pub fn check_day_limit(day: usize) -> Result<()> {
    if day > MAX_FORECAST_DAY {
        return Err(Error::OutOfRange {
            what: "forecast day",
            requested: day,
            limit: MAX_FORECAST_DAY,
        });
    }
    Ok(())
}
