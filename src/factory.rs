//! Factory and registry for the three backend families.
//!
//! Each family goes through two steps:
//!
//! 1. `*_model_factory(tag, config)` validates the configuration section and
//!    builds the canonical object, or fails with [`Error::Configuration`]
//!    naming the offending field.
//! 2. `instantiate_*(object, ..)` builds the concrete provider or sink.
//!
//! Display backends are resolved through [`import_display`], which also
//! probes whether the physical panel can run here. Callers fall back to
//! another backend on [`Error::UnavailableBackend`].
//!
//! ```rust
//! use rs_inky::config::{WeatherConfig, WeatherModel};
//! use rs_inky::factory::weather_model_factory;
//!
//! let config = WeatherConfig::default().with_api_token("owm-key");
//! let object = weather_model_factory(WeatherModel::OpenWeatherMap, &config).unwrap();
//! assert_eq!(object.exclude_flags, vec!["minutely", "hourly"]);
//!
//! let err = weather_model_factory(WeatherModel::OpenWeatherMap, &WeatherConfig::default());
//! assert!(err.unwrap_err().to_string().contains("weather.api_token"));
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{
    long_string, short_string, DisplayConfig, DisplayModel, Secret, ShortString, TrainConfig,
    TrainModel, WeatherConfig, WeatherModel,
};
use crate::dispatch::{AnyDisplay, AnyTrainSource, AnyWeatherSource};
use crate::display::{DesktopPreview, DisplayObject, TerminalText};
use crate::error::{Error, Result};
use crate::telemetry::Telemetry;
use crate::traits::HttpClient;
use crate::train::{Huxley2, OpenLive, TrainObject};
use crate::weather::{OpenWeatherMap, WeatherObject, KNOWN_EXCLUDE_FLAGS, REQUIRED_SECTIONS};

// ============================================================================
// Field Validation
// ============================================================================

fn required_token(field: &'static str, token: Option<&Secret>) -> Result<Secret> {
    match token {
        Some(secret) if !secret.is_blank() => Ok(Secret::new(secret.expose().trim())),
        Some(_) => Err(Error::config(field, "must not be blank")),
        None => Err(Error::config(field, "is required")),
    }
}

fn optional_token(token: Option<&Secret>) -> Option<Secret> {
    token
        .filter(|secret| !secret.is_blank())
        .map(|secret| Secret::new(secret.expose().trim()))
}

fn coordinate(field: &'static str, value: Option<f64>, bound: f64) -> Result<f64> {
    let value = value.ok_or_else(|| Error::config(field, "is required"))?;
    if !value.is_finite() || !(-bound..=bound).contains(&value) {
        return Err(Error::config(
            field,
            format!("{value} is outside [-{bound}, {bound}]"),
        ));
    }
    Ok(value)
}

fn exclude_flags(flags: &[String]) -> Result<Vec<String>> {
    const FIELD: &str = "weather.exclude_flags";
    let mut out: Vec<String> = Vec::with_capacity(flags.len());
    for raw in flags {
        let flag = raw.trim().to_ascii_lowercase();
        if flag.is_empty() || out.contains(&flag) {
            continue;
        }
        if !KNOWN_EXCLUDE_FLAGS.contains(&flag.as_str()) {
            return Err(Error::config(FIELD, format!("unknown section `{flag}`")));
        }
        if REQUIRED_SECTIONS.contains(&flag.as_str()) {
            return Err(Error::config(
                FIELD,
                format!("section `{flag}` is needed to draw the forecast"),
            ));
        }
        out.push(flag);
    }
    Ok(out)
}

/// Upper-cased three character CRS code.
fn crs(field: &'static str, code: &str) -> Result<ShortString> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::config(
            field,
            format!("`{code}` is not a three character station code"),
        ));
    }
    Ok(short_string(&code.to_ascii_uppercase()))
}

fn endpoint(url: Option<&str>) -> Result<Option<&str>> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        None => Ok(None),
        Some(u) if u.starts_with("https://") || u.starts_with("http://") => Ok(Some(u)),
        Some(_) => Err(Error::config("train.url", "must be an http(s) URL")),
    }
}

// ============================================================================
// Canonical Objects
// ============================================================================

/// Build the [`DisplayObject`] for `model`.
pub fn display_model_factory(model: DisplayModel, config: &DisplayConfig) -> Result<DisplayObject> {
    if config.preview_path.as_os_str().is_empty() {
        return Err(Error::config("display.preview_path", "must not be empty"));
    }
    Ok(DisplayObject {
        model,
        base_color: config.base_color,
        preview_path: config.preview_path.clone(),
    })
}

/// Build the [`WeatherObject`] for `model`.
pub fn weather_model_factory(model: WeatherModel, config: &WeatherConfig) -> Result<WeatherObject> {
    match model {
        WeatherModel::OpenWeatherMap => Ok(WeatherObject {
            model,
            api_token: required_token("weather.api_token", config.api_token.as_ref())?,
            latitude: coordinate("weather.latitude", config.latitude, 90.0)?,
            longitude: coordinate("weather.longitude", config.longitude, 180.0)?,
            exclude_flags: exclude_flags(&config.exclude_flags)?,
            scale: config.scale,
        }),
    }
}

/// Build the [`TrainObject`] for `model`.
///
/// `number` only has to be positive; providers cap the rows they request.
pub fn train_model_factory(model: TrainModel, config: &TrainConfig) -> Result<TrainObject> {
    let number = usize::try_from(config.number)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| {
            Error::config("train.number", format!("{} is not a positive integer", config.number))
        })?;
    let token = match model {
        TrainModel::OpenLive => Some(required_token("train.token", config.token.as_ref())?),
        TrainModel::Huxley2 => optional_token(config.token.as_ref()),
    };
    Ok(TrainObject {
        model,
        number,
        station_from: crs("train.station_from", &config.station_from)?,
        station_to: crs("train.station_to", &config.station_to)?,
        token,
        url: endpoint(config.url.as_deref())?.map(long_string),
    })
}

// ============================================================================
// Display Registry
// ============================================================================

/// Builds a sink from its canonical object.
pub type DisplayConstructor = fn(&DisplayObject, &Telemetry) -> Result<AnyDisplay>;

/// Device tree file naming the board.
pub const BOARD_MODEL_PATH: &str = "/sys/firmware/devicetree/base/model";

/// Where the panel's I2C bus shows up.
pub const I2C_DEVICE_PATH: &str = "/dev/i2c-1";

/// Checks that the physical panel can be driven from this machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelProbe {
    /// File whose contents name the board.
    pub model_path: PathBuf,
    /// I2C device node.
    pub device_path: PathBuf,
}

impl Default for PanelProbe {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(BOARD_MODEL_PATH),
            device_path: PathBuf::from(I2C_DEVICE_PATH),
        }
    }
}

impl PanelProbe {
    /// Ok when running on a Raspberry Pi with the I2C bus enabled.
    pub fn check(&self) -> Result<()> {
        let unavailable = |reason: String| Error::UnavailableBackend {
            backend: DisplayModel::PixelPanel.as_str(),
            reason,
        };
        let board = std::fs::read_to_string(&self.model_path)
            .map_err(|_| unavailable(format!("cannot read {}", self.model_path.display())))?;
        if !board.contains("Raspberry Pi") {
            return Err(unavailable(format!(
                "not a Raspberry Pi ({})",
                board.trim_end_matches('\0').trim()
            )));
        }
        if !self.device_path.exists() {
            return Err(unavailable(format!(
                "{} not found",
                self.device_path.display()
            )));
        }
        Ok(())
    }
}

fn desktop(object: &DisplayObject, telemetry: &Telemetry) -> Result<AnyDisplay> {
    Ok(AnyDisplay::Desktop(DesktopPreview::new(object, telemetry)))
}

fn terminal(object: &DisplayObject, telemetry: &Telemetry) -> Result<AnyDisplay> {
    Ok(AnyDisplay::Terminal(TerminalText::new(object, telemetry)))
}

#[cfg(feature = "panel")]
fn panel(object: &DisplayObject, telemetry: &Telemetry) -> Result<AnyDisplay> {
    use crate::display::PixelPanel;
    use crate::hal::Ssd1306Panel;

    let device = PanelProbe::default().device_path;
    let driver = Ssd1306Panel::open(&device.to_string_lossy())?;
    Ok(AnyDisplay::Panel(PixelPanel::new(
        object,
        Box::new(driver),
        telemetry,
    )))
}

#[cfg(feature = "panel")]
fn resolve_panel(probe: &PanelProbe) -> Result<DisplayConstructor> {
    probe.check()?;
    Ok(panel as DisplayConstructor)
}

#[cfg(not(feature = "panel"))]
fn resolve_panel(_probe: &PanelProbe) -> Result<DisplayConstructor> {
    Err(Error::UnavailableBackend {
        backend: DisplayModel::PixelPanel.as_str(),
        reason: "built without the `panel` feature".into(),
    })
}

/// Resolve the constructor for `model`, probing the panel with the default
/// [`PanelProbe`].
pub fn import_display(model: DisplayModel) -> Result<DisplayConstructor> {
    import_display_with(model, &PanelProbe::default())
}

/// [`import_display`] with an explicit probe.
pub fn import_display_with(model: DisplayModel, probe: &PanelProbe) -> Result<DisplayConstructor> {
    match model {
        DisplayModel::PixelPanel => resolve_panel(probe),
        DisplayModel::DesktopPreview => {
            if cfg!(feature = "desktop") {
                Ok(desktop as DisplayConstructor)
            } else {
                Err(Error::UnavailableBackend {
                    backend: model.as_str(),
                    reason: "built without the `desktop` feature".into(),
                })
            }
        }
        DisplayModel::TerminalText => Ok(terminal as DisplayConstructor),
    }
}

// ============================================================================
// Instantiation
// ============================================================================

/// Build the sink for `object`.
pub fn instantiate_display(object: &DisplayObject, telemetry: &Telemetry) -> Result<AnyDisplay> {
    let construct = import_display(object.model)?;
    construct(object, telemetry)
}

/// Build the weather provider for `object`.
pub fn instantiate_weather(
    object: WeatherObject,
    client: Arc<dyn HttpClient>,
    telemetry: &Telemetry,
) -> AnyWeatherSource {
    match object.model {
        WeatherModel::OpenWeatherMap => {
            AnyWeatherSource::OpenWeatherMap(OpenWeatherMap::new(object, client, telemetry))
        }
    }
}

/// Build the train provider for `object`.
pub fn instantiate_train(
    object: TrainObject,
    client: Arc<dyn HttpClient>,
    telemetry: &Telemetry,
) -> AnyTrainSource {
    match object.model {
        TrainModel::Huxley2 => AnyTrainSource::Huxley2(Huxley2::new(object, client, telemetry)),
        TrainModel::OpenLive => AnyTrainSource::OpenLive(OpenLive::new(object, client, telemetry)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseColor;
    use crate::hal::MockHttp;
    use crate::traits::{ScaleType, TrainSource};
    use proptest::prelude::*;
    use std::io::Write;

    fn field_of(err: Error) -> &'static str {
        match err {
            Error::Configuration { field, .. } => field,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    fn weather() -> WeatherConfig {
        WeatherConfig::default().with_api_token("owm-key")
    }

    fn open_live() -> TrainConfig {
        TrainConfig::default()
            .with_model(TrainModel::OpenLive)
            .with_token("ldb-token")
    }

    // =========================================================================
    // Weather Tests
    // =========================================================================

    #[test]
    fn weather_object_from_config() {
        let config = weather()
            .with_location(-33.86, 151.2)
            .with_scale(ScaleType::Fahrenheit);
        let object = weather_model_factory(WeatherModel::OpenWeatherMap, &config).unwrap();
        assert_eq!(object.api_token.expose(), "owm-key");
        assert_eq!(object.latitude, -33.86);
        assert_eq!(object.longitude, 151.2);
        assert_eq!(object.scale, ScaleType::Fahrenheit);
    }

    #[test]
    fn weather_token_must_be_present() {
        let blank = WeatherConfig::default().with_api_token("   ");
        let err = weather_model_factory(WeatherModel::OpenWeatherMap, &blank).unwrap_err();
        assert_eq!(field_of(err), "weather.api_token");

        let missing = WeatherConfig::default();
        let err = weather_model_factory(WeatherModel::OpenWeatherMap, &missing).unwrap_err();
        assert_eq!(field_of(err), "weather.api_token");
    }

    #[test]
    fn coordinates_are_bounded() {
        for (lat, lon, field) in [
            (90.5, 0.0, "weather.latitude"),
            (-91.0, 0.0, "weather.latitude"),
            (f64::NAN, 0.0, "weather.latitude"),
            (0.0, 180.1, "weather.longitude"),
            (0.0, -200.0, "weather.longitude"),
        ] {
            let config = weather().with_location(lat, lon);
            let err = weather_model_factory(WeatherModel::OpenWeatherMap, &config).unwrap_err();
            assert_eq!(field_of(err), field);
        }

        let edge = weather().with_location(90.0, -180.0);
        assert!(weather_model_factory(WeatherModel::OpenWeatherMap, &edge).is_ok());

        let mut missing = weather();
        missing.longitude = None;
        let err = weather_model_factory(WeatherModel::OpenWeatherMap, &missing).unwrap_err();
        assert_eq!(field_of(err), "weather.longitude");
    }

    #[test]
    fn exclude_flags_are_checked() {
        let config = weather().with_exclude_flags(&[" Alerts", "minutely", "", "alerts"]);
        let object = weather_model_factory(WeatherModel::OpenWeatherMap, &config).unwrap();
        assert_eq!(object.exclude_flags, vec!["alerts", "minutely"]);

        for bad in ["weekly", "daily", "current"] {
            let config = weather().with_exclude_flags(&[bad]);
            let err = weather_model_factory(WeatherModel::OpenWeatherMap, &config).unwrap_err();
            assert_eq!(field_of(err), "weather.exclude_flags");
        }
    }

    // =========================================================================
    // Train Tests
    // =========================================================================

    #[test]
    fn open_live_needs_a_token() {
        let config = TrainConfig::default().with_model(TrainModel::OpenLive);
        let err = train_model_factory(TrainModel::OpenLive, &config).unwrap_err();
        assert_eq!(field_of(err), "train.token");

        let object = train_model_factory(TrainModel::OpenLive, &open_live()).unwrap();
        assert_eq!(object.token.unwrap().expose(), "ldb-token");
    }

    #[test]
    fn huxley_token_is_optional() {
        let config = TrainConfig::default().with_model(TrainModel::Huxley2);
        let object = train_model_factory(TrainModel::Huxley2, &config).unwrap();
        assert_eq!(object.token, None);

        let blank = config.with_token("  ");
        let object = train_model_factory(TrainModel::Huxley2, &blank).unwrap();
        assert_eq!(object.token, None);
    }

    #[test]
    fn number_must_be_positive() {
        for number in [0, -3] {
            let config = open_live().with_number(number);
            let err = train_model_factory(TrainModel::OpenLive, &config).unwrap_err();
            assert_eq!(field_of(err), "train.number");
        }
        let big = open_live().with_number(50);
        let object = train_model_factory(TrainModel::OpenLive, &big).unwrap();
        assert_eq!(object.number, 50);
        assert_eq!(object.rows(), 10);
    }

    #[test]
    fn station_codes_are_normalized() {
        let config = open_live().with_stations(" bho", "bho");
        let object = train_model_factory(TrainModel::OpenLive, &config).unwrap();
        assert_eq!(object.station_from.as_str(), "BHO");
        assert_eq!(object.station_to, object.station_from);

        for (from, to, field) in [
            ("BH", "WMW", "train.station_from"),
            ("BHO", "W-W", "train.station_to"),
            ("BHO", "", "train.station_to"),
        ] {
            let config = open_live().with_stations(from, to);
            let err = train_model_factory(TrainModel::OpenLive, &config).unwrap_err();
            assert_eq!(field_of(err), field);
        }
    }

    #[test]
    fn url_must_be_http() {
        let ok = open_live().with_url("http://localhost:8080/ldb.asmx");
        let object = train_model_factory(TrainModel::OpenLive, &ok).unwrap();
        assert_eq!(object.url.as_deref(), Some("http://localhost:8080/ldb.asmx"));

        let blank = open_live().with_url("  ");
        assert_eq!(train_model_factory(TrainModel::OpenLive, &blank).unwrap().url, None);

        let bad = open_live().with_url("ftp://example.org");
        let err = train_model_factory(TrainModel::OpenLive, &bad).unwrap_err();
        assert_eq!(field_of(err), "train.url");
    }

    #[test]
    fn instantiate_train_picks_provider() {
        let http: Arc<dyn HttpClient> = Arc::new(MockHttp::new());
        let telemetry = Telemetry::silent();

        let object = train_model_factory(TrainModel::OpenLive, &open_live()).unwrap();
        let source = instantiate_train(object, http.clone(), &telemetry);
        assert!(matches!(source, AnyTrainSource::OpenLive(_)));
        assert_eq!(source.number(), 3);

        let config = TrainConfig::default().with_model(TrainModel::Huxley2);
        let object = train_model_factory(TrainModel::Huxley2, &config).unwrap();
        let source = instantiate_train(object, http, &telemetry);
        assert!(matches!(source, AnyTrainSource::Huxley2(_)));
    }

    proptest! {
        #[test]
        fn any_positive_number_is_accepted(number in 1i64..10_000) {
            let config = open_live().with_number(number);
            let object = train_model_factory(TrainModel::OpenLive, &config).unwrap();
            prop_assert_eq!(object.number as i64, number);
            prop_assert!(object.rows() >= 1 && object.rows() <= 10);
        }

        #[test]
        fn latitude_inside_range_is_accepted(lat in -90.0f64..=90.0) {
            let config = weather().with_location(lat, 0.0);
            prop_assert!(weather_model_factory(WeatherModel::OpenWeatherMap, &config).is_ok());
        }
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[test]
    fn display_object_from_config() {
        let config = DisplayConfig::default()
            .with_base_color(BaseColor::Red)
            .with_preview_path("out/screen.png");
        let object = display_model_factory(DisplayModel::DesktopPreview, &config).unwrap();
        assert_eq!(object.model, DisplayModel::DesktopPreview);
        assert_eq!(object.base_color, BaseColor::Red);
        assert_eq!(object.preview_path, PathBuf::from("out/screen.png"));

        let empty = DisplayConfig::default().with_preview_path("");
        let err = display_model_factory(DisplayModel::DesktopPreview, &empty).unwrap_err();
        assert_eq!(field_of(err), "display.preview_path");
    }

    #[test]
    fn terminal_is_always_available() {
        let probe = PanelProbe {
            model_path: "/nonexistent/model".into(),
            device_path: "/nonexistent/i2c".into(),
        };
        assert!(import_display_with(DisplayModel::TerminalText, &probe).is_ok());
    }

    #[test]
    fn panel_is_unavailable_off_target() {
        let probe = PanelProbe {
            model_path: "/nonexistent/model".into(),
            device_path: "/nonexistent/i2c".into(),
        };
        let Err(err) = import_display_with(DisplayModel::PixelPanel, &probe) else {
            panic!("panel should be unavailable");
        };
        assert!(matches!(
            err,
            Error::UnavailableBackend { backend: "pixel_panel", .. }
        ));
    }

    #[test]
    fn probe_reads_board_and_device() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model");
        let device_path = dir.path().join("i2c-1");

        let mut file = std::fs::File::create(&model_path).unwrap();
        file.write_all(b"Raspberry Pi Zero 2 W Rev 1.0\0").unwrap();
        let probe = PanelProbe {
            model_path: model_path.clone(),
            device_path: device_path.clone(),
        };
        let err = probe.check().unwrap_err();
        assert!(err.to_string().contains("i2c-1 not found"));

        std::fs::File::create(&device_path).unwrap();
        assert!(probe.check().is_ok());

        std::fs::write(&model_path, "Generic x86 board").unwrap();
        let err = probe.check().unwrap_err();
        assert!(err.to_string().contains("not a Raspberry Pi"));
    }

    #[cfg(feature = "desktop")]
    #[test]
    fn desktop_constructor_builds_preview() {
        let object = display_model_factory(DisplayModel::DesktopPreview, &DisplayConfig::default())
            .unwrap();
        let display = instantiate_display(&object, &Telemetry::silent()).unwrap();
        assert!(matches!(display, AnyDisplay::Desktop(_)));
    }
}
