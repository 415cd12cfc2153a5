//! Runtime selection of one concrete provider or sink per family.
//!
//! The factory returns these enums so the binary can pick a backend from
//! configuration without boxing. Each one forwards every trait method to the
//! variant it holds.
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_inky::config::TrainConfig;
//! use rs_inky::dispatch::AnyTrainSource;
//! use rs_inky::factory::{instantiate_train, train_model_factory};
//! use rs_inky::hal::MockHttp;
//! use rs_inky::telemetry::Telemetry;
//!
//! let config = TrainConfig::default().with_stations("MZH", "LBG");
//! let object = train_model_factory(config.model, &config).unwrap();
//! let source = instantiate_train(object, Arc::new(MockHttp::new()), &Telemetry::silent());
//! assert!(matches!(source, AnyTrainSource::Huxley2(_)));
//! ```

use core::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::display::{DesktopPreview, PixelPanel, TerminalText};
use crate::error::Result;
use crate::traits::{
    DisplaySink, Departures, IconType, ScaleType, Temperature, TrainSource, WeatherSource,
};
use crate::train::{Huxley2, OpenLive};
use crate::weather::OpenWeatherMap;

// ============================================================================
// Weather
// ============================================================================

/// Any weather provider.
#[derive(Debug)]
pub enum AnyWeatherSource {
    /// OpenWeatherMap One Call.
    OpenWeatherMap(OpenWeatherMap),
}

impl AnyWeatherSource {
    fn inner(&self) -> &dyn WeatherSource {
        match self {
            AnyWeatherSource::OpenWeatherMap(source) => source,
        }
    }
}

impl WeatherSource for AnyWeatherSource {
    fn retrieve_data(&self) -> Result<()> {
        self.inner().retrieve_data()
    }

    fn scale(&self) -> ScaleType {
        self.inner().scale()
    }

    fn get_icon(&self, day: usize) -> Result<IconType> {
        self.inner().get_icon(day)
    }

    fn get_condition(&self, day: usize) -> Result<String> {
        self.inner().get_condition(day)
    }

    fn get_temp_range(&self, day: usize) -> Result<(Temperature, Temperature)> {
        self.inner().get_temp_range(day)
    }

    fn get_current_temperature(&self) -> Result<Temperature> {
        self.inner().get_current_temperature()
    }

    fn get_current_condition(&self) -> Result<String> {
        self.inner().get_current_condition()
    }

    fn get_future_weather(&self, day: usize) -> Result<Temperature> {
        self.inner().get_future_weather(day)
    }
}

// ============================================================================
// Trains
// ============================================================================

/// Any departure board provider.
#[derive(Debug)]
pub enum AnyTrainSource {
    /// Huxley2 JSON proxy.
    Huxley2(Huxley2),
    /// National Rail OpenLDBWS SOAP service.
    OpenLive(OpenLive),
}

impl AnyTrainSource {
    fn inner(&self) -> &dyn TrainSource {
        match self {
            AnyTrainSource::Huxley2(source) => source,
            AnyTrainSource::OpenLive(source) => source,
        }
    }
}

impl TrainSource for AnyTrainSource {
    fn retrieve_data(&self) -> Departures {
        self.inner().retrieve_data()
    }

    fn number(&self) -> usize {
        self.inner().number()
    }
}

// ============================================================================
// Displays
// ============================================================================

/// Any display sink.
pub enum AnyDisplay {
    /// Physical panel.
    Panel(PixelPanel),
    /// PNG preview.
    Desktop(DesktopPreview),
    /// Text on a terminal.
    Terminal(TerminalText),
}

impl AnyDisplay {
    /// Backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnyDisplay::Panel(_) => "pixel_panel",
            AnyDisplay::Desktop(_) => "desktop_preview",
            AnyDisplay::Terminal(_) => "terminal_text",
        }
    }

    fn inner(&mut self) -> &mut dyn DisplaySink {
        match self {
            AnyDisplay::Panel(sink) => sink,
            AnyDisplay::Desktop(sink) => sink,
            AnyDisplay::Terminal(sink) => sink,
        }
    }
}

impl fmt::Debug for AnyDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyDisplay").field(&self.name()).finish()
    }
}

impl DisplaySink for AnyDisplay {
    fn draw_date(&mut self, now: NaiveDateTime) -> Result<()> {
        self.inner().draw_date(now)
    }

    fn draw_time(&mut self, now: NaiveDateTime) -> Result<()> {
        self.inner().draw_time(now)
    }

    fn draw_weather_icon(&mut self, icon: IconType) -> Result<()> {
        self.inner().draw_weather_icon(icon)
    }

    fn draw_weather_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        disp_tomorrow: bool,
    ) -> Result<()> {
        self.inner().draw_weather_forecast(weather, disp_tomorrow)
    }

    fn draw_mini_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        slot: usize,
        day: usize,
        today: NaiveDate,
    ) -> Result<()> {
        self.inner().draw_mini_forecast(weather, slot, day, today)
    }

    fn draw_forecast_icons(&mut self, weather: &dyn WeatherSource, today: NaiveDate) -> Result<()> {
        self.inner().draw_forecast_icons(weather, today)
    }

    fn draw_train_times(&mut self, trains: &dyn TrainSource) -> Result<()> {
        self.inner().draw_train_times(trains)
    }

    fn draw_goodnight(&mut self) -> Result<()> {
        self.inner().draw_goodnight()
    }

    fn commit(&mut self) -> Result<()> {
        self.inner().commit()
    }
}
