//! Display sink abstraction.
//!
//! This module defines the [`DisplaySink`] trait shared by the panel, the
//! desktop preview and the terminal. All three lay out the same screen;
//! only [`DisplaySink::commit`] touches the outside world.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::traits::{IconType, TrainSource, WeatherSource};

/// Forecast slots drawn by [`DisplaySink::draw_forecast_icons`].
pub const FORECAST_SLOTS: usize = 5;

/// Label drawn under the closed eye.
pub const GOODNIGHT_LABEL: &str = "Good Night ^^";

/// Drawing contract for one render session.
///
/// Draw calls compose into an off-screen surface. `commit` flushes it and
/// must be the last call of the session.
///
/// # Example
///
/// ```ignore
/// use rs_inky::traits::DisplaySink;
///
/// fn header<S: DisplaySink>(sink: &mut S, now: chrono::NaiveDateTime) -> rs_inky::Result<()> {
///     sink.draw_date(now)?;
///     sink.draw_time(now)
/// }
/// ```
pub trait DisplaySink {
    /// Date header, e.g. "Mon 14 Oct 2024".
    fn draw_date(&mut self, now: NaiveDateTime) -> Result<()>;

    /// Update time, e.g. "Updated 07:45".
    fn draw_time(&mut self, now: NaiveDateTime) -> Result<()>;

    /// Large glyph for `icon` at the main icon position.
    fn draw_weather_icon(&mut self, icon: IconType) -> Result<()>;

    /// Current weather and today's range; tomorrow's forecast too when
    /// `disp_tomorrow` is set.
    fn draw_weather_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        disp_tomorrow: bool,
    ) -> Result<()>;

    /// One forecast slot: weekday label, small glyph, day temperature.
    fn draw_mini_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        slot: usize,
        day: usize,
        today: NaiveDate,
    ) -> Result<()>;

    /// [`FORECAST_SLOTS`] mini forecasts for days 1 onwards, left to right.
    fn draw_forecast_icons(&mut self, weather: &dyn WeatherSource, today: NaiveDate) -> Result<()> {
        for slot in 0..FORECAST_SLOTS {
            self.draw_mini_forecast(weather, slot, slot + 1, today)?;
        }
        Ok(())
    }

    /// Departure lines, or the single error line when there are none.
    fn draw_train_times(&mut self, trains: &dyn TrainSource) -> Result<()>;

    /// Closed eye and [`GOODNIGHT_LABEL`].
    fn draw_goodnight(&mut self) -> Result<()>;

    /// Flush the composed screen to its output.
    fn commit(&mut self) -> Result<()>;
}
