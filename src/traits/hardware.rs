//! Hardware-facing traits: wall clock and panel driver.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Clock`] | Local wall-clock time for the header and forecast labels |
//! | [`PanelDriver`] | Pushes a finished frame to a physical display |
//!
//! For testing use the implementations from [`crate::hal::mock`]. The
//! SSD1306 driver lives in `hal::ssd1306` (requires `panel` feature).

use chrono::{Local, NaiveDateTime};

use crate::display::Canvas;
use crate::error::Result;

/// Time source.
///
/// # Example
///
/// ```rust
/// use rs_inky::traits::Clock;
/// use rs_inky::hal::MockClock;
///
/// let clock = MockClock::at(2024, 10, 14, 7, 45);
/// assert_eq!(clock.now().format("%H:%M").to_string(), "07:45");
/// ```
pub trait Clock {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A physical display that shows a finished frame.
///
/// The frame is always the full 400x300 canvas; drivers for smaller or
/// monochrome hardware map it onto their own pixels.
pub trait PanelDriver {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether the panel can show the red/yellow accent ink.
    fn supports_accent(&self) -> bool;

    /// Replace the panel contents with `frame`.
    fn show(&mut self, frame: &Canvas) -> Result<()>;
}
