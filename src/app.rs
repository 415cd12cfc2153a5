//! Application wiring.
//!
//! [`run`] turns a [`Config`] into one provider per family, picks a display
//! backend (falling back when the requested one cannot run here) and hands
//! everything to [`display_data`].
//!
//! Display fallback order: `pixel_panel` → `desktop_preview` →
//! `terminal_text`. Only [`Error::UnavailableBackend`] triggers a fallback;
//! any other error aborts.

use std::sync::Arc;

use crate::config::{Config, DisplayModel};
use crate::dispatch::AnyDisplay;
use crate::display::DisplayObject;
use crate::error::{Error, Result};
use crate::factory::{
    display_model_factory, import_display, instantiate_train, instantiate_weather,
    train_model_factory, weather_model_factory, DisplayConstructor,
};
use crate::orchestrator::{display_data, DisplayOption, Session};
use crate::telemetry::Telemetry;
use crate::traits::{Clock, DisplaySink, HttpClient};

/// Collaborators injected into a run.
pub struct Runtime {
    /// Transport for every provider.
    pub client: Arc<dyn HttpClient>,
    /// Source of the header timestamp.
    pub clock: Box<dyn Clock>,
    /// Log handle.
    pub telemetry: Telemetry,
}

impl Runtime {
    /// Bundle the collaborators.
    pub fn new(client: Arc<dyn HttpClient>, clock: Box<dyn Clock>, telemetry: Telemetry) -> Self {
        Self {
            client,
            clock,
            telemetry,
        }
    }
}

const FALLBACK_ORDER: [DisplayModel; 3] = [
    DisplayModel::PixelPanel,
    DisplayModel::DesktopPreview,
    DisplayModel::TerminalText,
];

/// Resolve `requested`, or the first backend after it that can run here.
pub fn resolve_display(
    requested: DisplayModel,
    import: impl Fn(DisplayModel) -> Result<DisplayConstructor>,
    telemetry: &Telemetry,
) -> Result<(DisplayModel, DisplayConstructor)> {
    let start = FALLBACK_ORDER
        .iter()
        .position(|&m| m == requested)
        .unwrap_or(0);
    let mut last = None;
    for &model in &FALLBACK_ORDER[start..] {
        match import(model) {
            Ok(construct) => {
                if model != requested {
                    telemetry.warn(format_args!(
                        "falling back from {} to {}",
                        requested.as_str(),
                        model.as_str()
                    ));
                }
                return Ok((model, construct));
            }
            Err(err @ Error::UnavailableBackend { .. }) => {
                telemetry.warn(format_args!("{err}"));
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last.unwrap_or(Error::UnavailableBackend {
        backend: requested.as_str(),
        reason: "no display backend can run here".into(),
    }))
}

/// Build the display for `config`, falling back as needed.
pub fn open_display(config: &Config, telemetry: &Telemetry) -> Result<AnyDisplay> {
    let object = display_model_factory(config.display.model, &config.display)?;
    let (model, construct) = resolve_display(object.model, import_display, telemetry)?;
    let object = DisplayObject { model, ..object };
    construct(&object, telemetry)
}

/// Render `option` into an already opened `sink`.
pub fn render(
    option: DisplayOption,
    config: &Config,
    runtime: &Runtime,
    sink: &mut dyn DisplaySink,
) -> Result<()> {
    let telemetry = &runtime.telemetry;
    let weather_object = weather_model_factory(config.weather.model, &config.weather)?;
    let train_object = train_model_factory(config.train.model, &config.train)?;
    telemetry.debug(format_args!(
        "weather from {}, trains from {} ({} to {})",
        weather_object.model.as_str(),
        train_object.model.as_str(),
        train_object.station_from.as_str(),
        train_object.station_to.as_str(),
    ));

    let weather = instantiate_weather(weather_object, Arc::clone(&runtime.client), telemetry);
    let trains = instantiate_train(train_object, Arc::clone(&runtime.client), telemetry);
    let session = Session::new(runtime.clock.now(), telemetry)
        .with_weather_glimpse(config.train.weather_glimpse);

    display_data(option, sink, &weather, &trains, &session)
}

/// Render `option` for `config` on the best available display.
pub fn run(option: DisplayOption, config: &Config, runtime: &Runtime) -> Result<()> {
    // Validate before opening a backend.
    weather_model_factory(config.weather.model, &config.weather)?;
    train_model_factory(config.train.model, &config.train)?;

    let mut display = open_display(config, &runtime.telemetry)?;
    runtime
        .telemetry
        .info(format_args!("drawing on {}", display.name()));
    let result = render(option, config, runtime, &mut display);
    runtime.telemetry.flush();
    result
}
