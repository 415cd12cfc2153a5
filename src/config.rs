//! Configuration loading for the three backend families.
//!
//! The raw sections here are deliberately loose (optional tokens, signed
//! row counts, free-form station codes) so that [`crate::factory`] can name
//! the offending field when it turns them into canonical objects.
//!
//! Values come from a TOML file and can be overridden by environment
//! variables, which is how tokens are usually supplied.
//!
//! # Example
//!
//! ```rust
//! use rs_inky::config::{Config, TrainConfig, TrainModel};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.train.number, 3);
//!
//! // Or customize
//! let config = Config::default().with_train(
//!     TrainConfig::default()
//!         .with_model(TrainModel::Huxley2)
//!         .with_stations("MZH", "LBG"),
//! );
//! assert_eq!(config.train.station_to.as_str(), "LBG");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use heapless::String as HString;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::traits::ScaleType;

/// Maximum length for short config strings (station codes, tags)
pub const MAX_SHORT_STRING: usize = 16;

/// Maximum length for longer config strings (URLs, paths)
pub const MAX_LONG_STRING: usize = 256;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

/// Copy as much of `s` as fits into a `heapless::String<N>`, stopping at a
/// UTF-8 boundary.
pub fn bounded<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::<N>::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    bounded(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    bounded(s)
}

// ============================================================================
// Secrets
// ============================================================================

/// An API token. Never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for building requests only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the token is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// ============================================================================
// Model tags
// ============================================================================

/// Display backend tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayModel {
    /// Physical panel on a Raspberry Pi.
    #[serde(alias = "inky", alias = "panel")]
    PixelPanel,
    /// PNG preview written on commit.
    #[serde(alias = "desktop")]
    DesktopPreview,
    /// Text printed to the terminal.
    #[serde(alias = "terminal")]
    TerminalText,
}

impl DisplayModel {
    /// Canonical tag.
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayModel::PixelPanel => "pixel_panel",
            DisplayModel::DesktopPreview => "desktop_preview",
            DisplayModel::TerminalText => "terminal_text",
        }
    }
}

impl FromStr for DisplayModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixel_panel" | "inky" | "panel" => Ok(DisplayModel::PixelPanel),
            "desktop_preview" | "desktop" => Ok(DisplayModel::DesktopPreview),
            "terminal_text" | "terminal" => Ok(DisplayModel::TerminalText),
            other => Err(Error::config(
                "display.model",
                format!("unknown display model `{other}`"),
            )),
        }
    }
}

/// Weather provider tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherModel {
    /// OpenWeatherMap One Call API.
    #[serde(alias = "owm")]
    OpenWeatherMap,
}

impl WeatherModel {
    /// Canonical tag.
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherModel::OpenWeatherMap => "open_weather_map",
        }
    }
}

impl FromStr for WeatherModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open_weather_map" | "owm" => Ok(WeatherModel::OpenWeatherMap),
            other => Err(Error::config(
                "weather.model",
                format!("unknown weather model `{other}`"),
            )),
        }
    }
}

/// Train provider tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainModel {
    /// Huxley2 JSON proxy.
    #[serde(alias = "huxley")]
    Huxley2,
    /// National Rail OpenLDBWS SOAP service.
    #[serde(alias = "openldbws")]
    OpenLive,
}

impl TrainModel {
    /// Canonical tag.
    pub fn as_str(self) -> &'static str {
        match self {
            TrainModel::Huxley2 => "huxley2",
            TrainModel::OpenLive => "open_live",
        }
    }
}

impl FromStr for TrainModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huxley2" | "huxley" => Ok(TrainModel::Huxley2),
            "open_live" | "openldbws" => Ok(TrainModel::OpenLive),
            other => Err(Error::config(
                "train.model",
                format!("unknown train model `{other}`"),
            )),
        }
    }
}

/// Panel colour variant; picks the accent ink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseColor {
    /// Black and white only.
    Black,
    /// Black, white and red.
    Red,
    /// Black, white and yellow.
    #[default]
    Yellow,
}

impl FromStr for BaseColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(BaseColor::Black),
            "red" => Ok(BaseColor::Red),
            "yellow" => Ok(BaseColor::Yellow),
            other => Err(Error::config(
                "display.base_color",
                format!("unknown colour `{other}`"),
            )),
        }
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display backend section
    pub display: DisplayConfig,
    /// Weather provider section
    pub weather: WeatherConfig,
    /// Train provider section
    pub train: TrainConfig,
}

impl Config {
    /// Read a TOML file.
    ///
    /// Parse errors report only the parser message, never the offending
    /// source line, so a malformed token cannot leak into the diagnostic.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config("config", format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config("config", e.message().to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("DISPLAY_MODEL") {
            self.display.model = v.parse()?;
        }
        if let Some(v) = lookup("INKY_COLOR") {
            self.display.base_color = v.parse()?;
        }
        if let Some(v) = lookup("WEATHER_MODEL") {
            self.weather.model = v.parse()?;
        }
        if let Some(v) = lookup("WEATHER_API_TOKEN") {
            self.weather.api_token = Some(Secret::new(v));
        }
        if let Some(v) = lookup("LATITUDE") {
            self.weather.latitude = Some(parse_number("weather.latitude", &v)?);
        }
        if let Some(v) = lookup("LONGITUDE") {
            self.weather.longitude = Some(parse_number("weather.longitude", &v)?);
        }
        if let Some(v) = lookup("EXCLUDE_FLAGS") {
            self.weather.exclude_flags = v
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("TEMPERATURE_SCALE") {
            self.weather.scale = v.parse()?;
        }
        if let Some(v) = lookup("TRAIN_MODEL") {
            self.train.model = v.parse()?;
        }
        if let Some(v) = lookup("TRAIN_NUMBER") {
            self.train.number = parse_number("train.number", &v)?;
        }
        if let Some(v) = lookup("STATION_FROM") {
            self.train.station_from = short_string(&v);
        }
        if let Some(v) = lookup("STATION_TO") {
            self.train.station_to = short_string(&v);
        }
        if let Some(v) = lookup("TRAIN_API_TOKEN") {
            self.train.token = Some(Secret::new(v));
        }
        if let Some(v) = lookup("TRAIN_MODEL_URL") {
            self.train.url = Some(long_string(&v));
        }
        Ok(self)
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set weather configuration
    pub fn with_weather(mut self, weather: WeatherConfig) -> Self {
        self.weather = weather;
        self
    }

    /// Set train configuration
    pub fn with_train(mut self, train: TrainConfig) -> Self {
        self.train = train;
        self
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(field, format!("`{}` is not a number", raw.trim())))
}

// ============================================================================
// Display Config
// ============================================================================

/// Display backend configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Which backend to render with
    pub model: DisplayModel,
    /// Panel colour variant
    pub base_color: BaseColor,
    /// Where the desktop preview writes its PNG
    pub preview_path: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            model: DisplayModel::PixelPanel,
            base_color: BaseColor::Yellow,
            preview_path: PathBuf::from("inky-preview.png"),
        }
    }
}

impl DisplayConfig {
    /// Set the backend
    pub fn with_model(mut self, model: DisplayModel) -> Self {
        self.model = model;
        self
    }

    /// Set the colour variant
    pub fn with_base_color(mut self, color: BaseColor) -> Self {
        self.base_color = color;
        self
    }

    /// Set the preview output path
    pub fn with_preview_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preview_path = path.into();
        self
    }
}

// ============================================================================
// Weather Config
// ============================================================================

/// Weather provider configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider tag
    pub model: WeatherModel,
    /// API key
    pub api_token: Option<Secret>,
    /// Decimal degrees, north positive
    pub latitude: Option<f64>,
    /// Decimal degrees, east positive
    pub longitude: Option<f64>,
    /// Upstream sections to leave out of the response
    pub exclude_flags: Vec<String>,
    /// Temperature scale for every accessor
    pub scale: ScaleType,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            model: WeatherModel::OpenWeatherMap,
            api_token: None,
            latitude: Some(51.5085),
            longitude: Some(-0.1257),
            exclude_flags: vec!["minutely".to_string(), "hourly".to_string()],
            scale: ScaleType::Celsius,
        }
    }
}

impl WeatherConfig {
    /// Set the API key
    pub fn with_api_token(mut self, token: &str) -> Self {
        self.api_token = Some(Secret::new(token));
        self
    }

    /// Set the location
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the excluded sections
    pub fn with_exclude_flags(mut self, flags: &[&str]) -> Self {
        self.exclude_flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Set the temperature scale
    pub fn with_scale(mut self, scale: ScaleType) -> Self {
        self.scale = scale;
        self
    }
}

// ============================================================================
// Train Config
// ============================================================================

/// Train provider configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Provider tag
    pub model: TrainModel,
    /// Rows to show; validated positive by the factory
    pub number: i64,
    /// Departure station CRS code
    pub station_from: ShortString,
    /// Destination filter CRS code
    pub station_to: ShortString,
    /// API token
    pub token: Option<Secret>,
    /// Endpoint override
    pub url: Option<LongString>,
    /// Show the weather icon and forecast above the departures
    pub weather_glimpse: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: TrainModel::OpenLive,
            number: 3,
            station_from: short_string("BHO"),
            station_to: short_string("WMW"),
            token: None,
            url: None,
            weather_glimpse: true,
        }
    }
}

impl TrainConfig {
    /// Set the provider
    pub fn with_model(mut self, model: TrainModel) -> Self {
        self.model = model;
        self
    }

    /// Set the row count
    pub fn with_number(mut self, number: i64) -> Self {
        self.number = number;
        self
    }

    /// Set both stations
    pub fn with_stations(mut self, from: &str, to: &str) -> Self {
        self.station_from = short_string(from);
        self.station_to = short_string(to);
        self
    }

    /// Set the API token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(Secret::new(token));
        self
    }

    /// Set the endpoint override
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(long_string(url));
        self
    }

    /// Toggle the weather glimpse on the train screen
    pub fn with_weather_glimpse(mut self, enabled: bool) -> Self {
        self.weather_glimpse = enabled;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
