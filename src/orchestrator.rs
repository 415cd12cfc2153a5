//! Screen orchestration.
//!
//! [`display_data`] drives one render session: it reads the sources in a
//! fixed order, draws into the sink and commits exactly once.
//!
//! | Option | Sources read | Draw calls |
//! |--------|--------------|------------|
//! | `Weather` | weather | date, time, icon, forecast, five mini forecasts |
//! | `Train` | trains (+ weather with the glimpse) | date, time, [icon, forecast + tomorrow], train times |
//! | `Night` | none | goodnight |
//!
//! Any error aborts the session before `commit`, so a failed render never
//! leaves a half drawn screen on the output.

use core::fmt;
use core::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::telemetry::Telemetry;
use crate::traits::{DisplaySink, TrainSource, WeatherSource};

/// Which screen to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayOption {
    /// Today's weather and a five day forecast.
    Weather,
    /// Departures, optionally under a weather glimpse.
    Train,
    /// Closed eye and a goodnight label.
    Night,
}

impl DisplayOption {
    /// Lower-case tag used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayOption::Weather => "weather",
            DisplayOption::Train => "train",
            DisplayOption::Night => "night",
        }
    }
}

impl fmt::Display for DisplayOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weather" => Ok(DisplayOption::Weather),
            "train" | "trains" => Ok(DisplayOption::Train),
            "night" | "goodnight" => Ok(DisplayOption::Night),
            other => Err(Error::config(
                "display_option",
                format!("unknown screen `{other}` (expected weather, train or night)"),
            )),
        }
    }
}

/// Per-invocation inputs that are not sources or sinks.
#[derive(Clone, Debug)]
pub struct Session {
    /// Timestamp shown in the header.
    pub now: NaiveDateTime,
    /// Draw the weather icon and forecast above the departures.
    pub weather_glimpse: bool,
    /// Log handle.
    pub telemetry: Telemetry,
}

impl Session {
    /// A session at `now` with the glimpse enabled.
    pub fn new(now: NaiveDateTime, telemetry: &Telemetry) -> Self {
        Self {
            now,
            weather_glimpse: true,
            telemetry: telemetry.scoped("rs_inky"),
        }
    }

    /// Toggle the weather glimpse on the train screen.
    pub fn with_weather_glimpse(mut self, enabled: bool) -> Self {
        self.weather_glimpse = enabled;
        self
    }
}

/// Render `option` into `sink` and commit it.
pub fn display_data(
    option: DisplayOption,
    sink: &mut dyn DisplaySink,
    weather: &dyn WeatherSource,
    trains: &dyn TrainSource,
    session: &Session,
) -> Result<()> {
    let log = &session.telemetry;
    log.info(format_args!("rendering {option} screen"));

    match option {
        DisplayOption::Weather => {
            weather.retrieve_data()?;
            let icon = weather.get_icon(0)?;
            sink.draw_date(session.now)?;
            sink.draw_time(session.now)?;
            sink.draw_weather_icon(icon)?;
            sink.draw_weather_forecast(weather, false)?;
            sink.draw_forecast_icons(weather, session.now.date())?;
        }
        DisplayOption::Train => {
            let glimpse = if session.weather_glimpse {
                weather.retrieve_data()?;
                Some(weather.get_icon(0)?)
            } else {
                None
            };
            let departures = trains.retrieve_data();
            if let Some(fault) = &departures.sentinel {
                log.debug(format_args!("drawing train sentinel {fault:?}"));
            }
            sink.draw_date(session.now)?;
            sink.draw_time(session.now)?;
            if let Some(icon) = glimpse {
                sink.draw_weather_icon(icon)?;
                sink.draw_weather_forecast(weather, true)?;
            }
            sink.draw_train_times(trains)?;
        }
        DisplayOption::Night => sink.draw_goodnight()?,
    }

    sink.commit()?;
    log.debug(format_args!("{option} screen committed"));
    Ok(())
}
