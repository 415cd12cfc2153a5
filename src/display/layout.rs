//! Screen content and positions shared by every backend.
//!
//! The raster sinks place these strings at the pixel positions below; the
//! terminal sink stacks the same strings as lines. Either way a screen
//! reads the same.
//!
//! ```text
//! (10,5) date                                (257,5) Updated HH:MM
//!        (135,50) temperature   (275,63) condition
//! (30,90)  icon   (135,100) range
//!                 (135,130) description
//!                 (135,160) tomorrow: ...
//! (10,180) slot 0 | slot 1 | ... 78px apart        or trains from (10,205)
//! ```

use chrono::{Days, NaiveDate, NaiveDateTime};
use embedded_graphics::prelude::Point;

use crate::error::{Error, Result};
use crate::traits::{IconType, TrainSource, WeatherSource};

/// Date header position.
pub const DATE_AT: Point = Point::new(10, 5);
/// Update time position.
pub const TIME_AT: Point = Point::new(257, 5);
/// Main weather icon position.
pub const ICON_AT: Point = Point::new(30, 90);
/// Forecast text origin.
pub const FORECAST_AT: Point = Point::new(135, 50);
/// First forecast slot.
pub const SLOTS_AT: Point = Point::new(10, 180);
/// Horizontal distance between forecast slots.
pub const SLOT_PITCH: i32 = 78;
/// First departure line.
pub const TRAINS_AT: Point = Point::new(10, 205);
/// Vertical distance between departure lines.
pub const TRAIN_PITCH: i32 = 30;
/// Closed eye position.
pub const EYE_AT: Point = Point::new(115, 20);
/// Baseline row of the goodnight label.
pub const GOODNIGHT_Y: i32 = 150;

/// Date header text, e.g. "Mon 14 Oct 2024".
pub fn date_text(now: NaiveDateTime) -> String {
    now.format("%a %d %b %Y").to_string()
}

/// Update time text, e.g. "Updated 07:45".
pub fn time_text(now: NaiveDateTime) -> String {
    now.format("Updated %H:%M").to_string()
}

/// Text block next to the main icon.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastText {
    /// Current temperature, e.g. "12.0°C".
    pub temperature: String,
    /// Short current condition, e.g. "Clouds".
    pub condition: String,
    /// Today's range, e.g. "5.0°C - 15.0°C".
    pub range: String,
    /// Today's description, e.g. "light rain".
    pub description: String,
    /// "tomorrow: ..." when requested.
    pub tomorrow: Option<String>,
}

impl ForecastText {
    /// Read everything the block shows from `weather`.
    pub fn read(weather: &dyn WeatherSource, disp_tomorrow: bool) -> Result<Self> {
        let (min, max) = weather.get_temp_range(0)?;
        let tomorrow = if disp_tomorrow {
            Some(format!("tomorrow: {}", weather.get_condition(1)?))
        } else {
            None
        };
        Ok(Self {
            temperature: weather.get_current_temperature()?.to_string(),
            condition: weather.get_current_condition()?,
            range: format!("{min} - {max}"),
            description: weather.get_condition(0)?,
            tomorrow,
        })
    }
}

/// One forecast slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotText {
    /// Weekday label, e.g. "Tue 15".
    pub label: String,
    /// Glyph to draw.
    pub icon: IconType,
    /// Daytime temperature.
    pub temperature: String,
}

impl SlotText {
    /// Read forecast `day`, labelled relative to `today`.
    pub fn read(weather: &dyn WeatherSource, day: usize, today: NaiveDate) -> Result<Self> {
        let date = today
            .checked_add_days(Days::new(day as u64))
            .ok_or(Error::OutOfRange {
                what: "forecast date",
                requested: day,
                limit: 0,
            })?;
        Ok(Self {
            label: date.format("%a %d").to_string(),
            icon: weather.get_icon(day)?,
            temperature: weather.get_future_weather(day)?.to_string(),
        })
    }
}

/// Departure lines, or the single error line.
pub fn train_lines(trains: &dyn TrainSource) -> Vec<String> {
    trains.fetch_train().lines()
}

/// Top-left of forecast slot `slot`.
pub fn slot_origin(slot: usize) -> Point {
    SLOTS_AT + Point::new(SLOT_PITCH * slot as i32, 0)
}

/// Top-left of departure line `row`.
pub fn train_origin(row: usize) -> Point {
    TRAINS_AT + Point::new(0, TRAIN_PITCH * row as i32)
}
