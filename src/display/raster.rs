//! Pixel backends: the panel and the desktop preview.
//!
//! Both draw the same 400x300 [`Canvas`]; they differ only in what
//! [`FrameOutput::present`] does with it on commit.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`PixelPanel`] | hands the frame to a [`PanelDriver`] |
//! | [`DesktopPreview`] | adds a border and writes a PNG |

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_7X13, FONT_9X15};
use embedded_graphics::prelude::Point;

use crate::display::layout::{self, ForecastText, SlotText};
use crate::display::{Canvas, DisplayObject};
use crate::error::{Error, Result};
use crate::icons::{closed_eye, compose, Accent, IconSize, Ink};
use crate::telemetry::Telemetry;
use crate::traits::{DisplaySink, IconType, PanelDriver, TrainSource, WeatherSource, GOODNIGHT_LABEL};

/// Border drawn around the desktop preview.
pub const PREVIEW_BORDER: u32 = 5;

// ============================================================================
// Outputs
// ============================================================================

/// Where a finished frame goes.
pub trait FrameOutput {
    /// Backend tag for logs and errors.
    const BACKEND: &'static str;

    /// Push `frame` out. Called once per session.
    fn present(&mut self, frame: &mut Canvas) -> Result<()>;
}

/// Output to a physical panel.
pub struct PanelOutput {
    driver: Box<dyn PanelDriver>,
}

impl FrameOutput for PanelOutput {
    const BACKEND: &'static str = "pixel_panel";

    fn present(&mut self, frame: &mut Canvas) -> Result<()> {
        self.driver.show(frame)
    }
}

/// Output to a PNG file.
#[derive(Clone, Debug)]
pub struct PngOutput {
    path: PathBuf,
}

impl PngOutput {
    /// Where the PNG is written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameOutput for PngOutput {
    const BACKEND: &'static str = "desktop_preview";

    fn present(&mut self, frame: &mut Canvas) -> Result<()> {
        frame.border(PREVIEW_BORDER, Ink::Black);
        write_png(frame, &self.path)
    }
}

#[cfg(feature = "desktop")]
fn write_png(frame: &Canvas, path: &Path) -> Result<()> {
    use embedded_graphics::pixelcolor::RgbColor;

    let width = frame.width();
    let pixels = frame.pixels();
    let image = image::RgbImage::from_fn(width, frame.height(), |x, y| {
        let p = pixels[(y * width + x) as usize];
        image::Rgb([p.r(), p.g(), p.b()])
    });
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Error::Render {
            backend: PngOutput::BACKEND,
            reason: e.to_string(),
        })
}

#[cfg(not(feature = "desktop"))]
fn write_png(_frame: &Canvas, _path: &Path) -> Result<()> {
    Err(Error::UnavailableBackend {
        backend: PngOutput::BACKEND,
        reason: "built without the `desktop` feature".into(),
    })
}

// ============================================================================
// Raster Sink
// ============================================================================

/// Draws the screen into a [`Canvas`] and hands it to `O` on commit.
pub struct RasterSink<O> {
    canvas: Canvas,
    accent: Accent,
    output: O,
    telemetry: Telemetry,
    committed: bool,
}

/// The e-ink/OLED panel sink.
pub type PixelPanel = RasterSink<PanelOutput>;

/// The PNG preview sink.
pub type DesktopPreview = RasterSink<PngOutput>;

impl PixelPanel {
    /// Draw for `driver`. Monochrome drivers force a monochrome accent.
    pub fn new(object: &DisplayObject, driver: Box<dyn PanelDriver>, telemetry: &Telemetry) -> Self {
        let accent = if driver.supports_accent() {
            Accent::from(object.base_color)
        } else {
            Accent::Monochrome
        };
        let telemetry = telemetry.scoped("rs_inky::display");
        telemetry.debug(format_args!(
            "panel driver {} with {accent:?} accent",
            driver.name()
        ));
        Self::with_output(PanelOutput { driver }, accent, telemetry)
    }
}

impl DesktopPreview {
    /// Draw into a PNG at `object.preview_path`.
    pub fn new(object: &DisplayObject, telemetry: &Telemetry) -> Self {
        let output = PngOutput {
            path: object.preview_path.clone(),
        };
        Self::with_output(
            output,
            Accent::from(object.base_color),
            telemetry.scoped("rs_inky::display"),
        )
    }

    /// Where commit writes the PNG.
    pub fn path(&self) -> &Path {
        self.output.path()
    }
}

impl<O: FrameOutput> RasterSink<O> {
    fn with_output(output: O, accent: Accent, telemetry: Telemetry) -> Self {
        Self {
            canvas: Canvas::default(),
            accent,
            output,
            telemetry,
            committed: false,
        }
    }

    /// The frame drawn so far.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Accent glyphs are drawn with.
    pub fn accent(&self) -> Accent {
        self.accent
    }

    fn glyph(&mut self, icon: IconType, at: Point, size: IconSize) {
        let shapes = compose(icon, at, size, self.accent);
        self.canvas.paint(&shapes);
    }
}

impl<O: FrameOutput> DisplaySink for RasterSink<O> {
    fn draw_date(&mut self, now: NaiveDateTime) -> Result<()> {
        self.canvas
            .text(&layout::date_text(now), layout::DATE_AT, &FONT_10X20, Ink::Black);
        Ok(())
    }

    fn draw_time(&mut self, now: NaiveDateTime) -> Result<()> {
        self.canvas
            .text(&layout::time_text(now), layout::TIME_AT, &FONT_10X20, Ink::Black);
        Ok(())
    }

    fn draw_weather_icon(&mut self, icon: IconType) -> Result<()> {
        self.glyph(icon, layout::ICON_AT, IconSize::Large);
        Ok(())
    }

    fn draw_weather_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        disp_tomorrow: bool,
    ) -> Result<()> {
        let text = ForecastText::read(weather, disp_tomorrow)?;
        let at = layout::FORECAST_AT;
        let canvas = &mut self.canvas;
        canvas.text(&text.temperature, at, &FONT_10X20, Ink::Black);
        canvas.text(&text.condition, at + Point::new(140, 13), &FONT_9X15, Ink::Black);
        canvas.text(&text.range, at + Point::new(0, 50), &FONT_9X15, Ink::Black);
        canvas.text(&text.description, at + Point::new(0, 80), &FONT_9X15, Ink::Black);
        if let Some(tomorrow) = &text.tomorrow {
            canvas.text(tomorrow, at + Point::new(0, 110), &FONT_7X13, Ink::Black);
        }
        Ok(())
    }

    fn draw_mini_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        slot: usize,
        day: usize,
        today: NaiveDate,
    ) -> Result<()> {
        let text = SlotText::read(weather, day, today)?;
        let at = layout::slot_origin(slot);
        self.canvas
            .text(&text.label, at + Point::new(10, 5), &FONT_7X13, Ink::Black);
        self.glyph(text.icon, at + Point::new(20, 27), IconSize::Small);
        self.canvas
            .text(&text.temperature, at + Point::new(10, 62), &FONT_7X13, Ink::Black);
        Ok(())
    }

    fn draw_train_times(&mut self, trains: &dyn TrainSource) -> Result<()> {
        for (row, line) in layout::train_lines(trains).iter().enumerate() {
            self.canvas
                .text(line, layout::train_origin(row), &FONT_10X20, Ink::Black);
        }
        Ok(())
    }

    fn draw_goodnight(&mut self) -> Result<()> {
        let eye = closed_eye(layout::EYE_AT, self.accent);
        self.canvas.paint(&eye);

        let glyph = FONT_10X20.character_size.width + FONT_10X20.character_spacing;
        let width = glyph * GOODNIGHT_LABEL.chars().count() as u32;
        let x = (self.canvas.width().saturating_sub(width) / 2) as i32;
        self.canvas.text(
            GOODNIGHT_LABEL,
            Point::new(x, layout::GOODNIGHT_Y),
            &FONT_10X20,
            Ink::Black,
        );
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Err(Error::Render {
                backend: O::BACKEND,
                reason: "frame already committed".into(),
            });
        }
        self.output.present(&mut self.canvas)?;
        self.committed = true;
        self.telemetry
            .info(format_args!("{} frame committed", O::BACKEND));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaseColor, DisplayModel};
    use crate::display::ink_color;
    use crate::hal::{MockClock, MockPanel, MockTrain, MockWeather};
    use crate::traits::Clock;
    use embedded_graphics::prelude::Size;
    use embedded_graphics::primitives::Rectangle;

    fn object(color: BaseColor) -> DisplayObject {
        DisplayObject {
            model: DisplayModel::PixelPanel,
            base_color: color,
            preview_path: PathBuf::from("unused.png"),
        }
    }

    fn weather() -> MockWeather {
        let weather = MockWeather::new();
        weather.retrieve_data().unwrap();
        weather
    }

    fn ink_in(canvas: &Canvas, at: Point, size: Size) -> usize {
        canvas.count_in(&Rectangle::new(at, size), ink_color(Ink::Black))
    }

    // =========================================================================
    // Panel Tests
    // =========================================================================

    #[test]
    fn commit_hands_frame_to_driver() {
        let panel = MockPanel::new();
        let mut sink = PixelPanel::new(
            &object(BaseColor::Red),
            Box::new(panel.clone()),
            &Telemetry::silent(),
        );
        sink.draw_date(MockClock::at(2024, 10, 14, 7, 45).now()).unwrap();
        assert_eq!(panel.frame_count(), 0);

        sink.commit().unwrap();
        assert_eq!(panel.frame_count(), 1);
        assert_eq!(panel.last_frame().as_ref(), Some(sink.canvas()));
    }

    #[test]
    fn second_commit_is_rejected() {
        let panel = MockPanel::new();
        let mut sink = PixelPanel::new(
            &object(BaseColor::Red),
            Box::new(panel.clone()),
            &Telemetry::silent(),
        );
        sink.commit().unwrap();
        assert!(matches!(sink.commit(), Err(Error::Render { .. })));
        assert_eq!(panel.frame_count(), 1);
    }

    #[test]
    fn driver_failure_propagates() {
        let mut panel = MockPanel::new();
        panel.fail = true;
        let mut sink = PixelPanel::new(&object(BaseColor::Red), Box::new(panel), &Telemetry::silent());
        assert!(matches!(sink.commit(), Err(Error::Render { .. })));
    }

    #[test]
    fn monochrome_driver_forces_monochrome() {
        let sink = PixelPanel::new(
            &object(BaseColor::Yellow),
            Box::new(MockPanel::monochrome()),
            &Telemetry::silent(),
        );
        assert_eq!(sink.accent(), Accent::Monochrome);

        let sink = PixelPanel::new(
            &object(BaseColor::Yellow),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        assert_eq!(sink.accent(), Accent::Yellow);
    }

    // =========================================================================
    // Layout Tests
    // =========================================================================

    #[test]
    fn header_lands_top_left_and_right() {
        let mut sink = PixelPanel::new(
            &object(BaseColor::Black),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        let now = MockClock::at(2024, 10, 14, 7, 45).now();
        sink.draw_date(now).unwrap();
        assert!(ink_in(sink.canvas(), layout::DATE_AT, Size::new(150, 20)) > 0);
        assert_eq!(ink_in(sink.canvas(), layout::TIME_AT, Size::new(130, 20)), 0);

        sink.draw_time(now).unwrap();
        assert!(ink_in(sink.canvas(), layout::TIME_AT, Size::new(130, 20)) > 0);
    }

    #[test]
    fn forecast_slots_fill_five_columns() {
        let mut sink = PixelPanel::new(
            &object(BaseColor::Black),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        let today = NaiveDate::from_ymd_opt(2024, 10, 14).unwrap();
        sink.draw_forecast_icons(&weather(), today).unwrap();
        for slot in 0..5 {
            let at = layout::slot_origin(slot);
            assert!(ink_in(sink.canvas(), at, Size::new(78, 80)) > 0, "slot {slot}");
        }
    }

    #[test]
    fn accent_glyph_in_accent_ink() {
        let mut sink = PixelPanel::new(
            &object(BaseColor::Red),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        sink.draw_weather_icon(IconType::ClearSky).unwrap();
        assert!(sink.canvas().count(ink_color(Ink::Red)) > 0);
    }

    #[test]
    fn train_lines_stack_downwards() {
        let mut sink = PixelPanel::new(
            &object(BaseColor::Black),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        let trains = MockTrain::with_services(&[("Brighton", "12:30"), ("Bedford", "12:45")], 3);
        sink.draw_train_times(&trains).unwrap();
        let row = |r: usize| ink_in(sink.canvas(), layout::train_origin(r), Size::new(330, 20));
        assert!(row(0) > 0);
        assert!(row(1) > 0);
        assert_eq!(row(2), 0);
    }

    #[test]
    fn goodnight_needs_no_sources() {
        let mut sink = PixelPanel::new(
            &object(BaseColor::Yellow),
            Box::new(MockPanel::new()),
            &Telemetry::silent(),
        );
        sink.draw_goodnight().unwrap();
        assert!(sink.canvas().count(ink_color(Ink::Yellow)) > 0);
        assert!(ink_in(sink.canvas(), Point::new(0, layout::GOODNIGHT_Y), Size::new(400, 20)) > 0);
    }

    // =========================================================================
    // Preview Tests
    // =========================================================================

    #[cfg(feature = "desktop")]
    #[test]
    fn preview_writes_bordered_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut object = object(BaseColor::Red);
        object.model = DisplayModel::DesktopPreview;
        object.preview_path = dir.path().join("screen.png");

        let mut sink = DesktopPreview::new(&object, &Telemetry::silent());
        sink.draw_goodnight().unwrap();
        sink.commit().unwrap();

        let png = image::open(dir.path().join("screen.png")).unwrap().to_rgb8();
        assert_eq!(png.dimensions(), (400, 300));
        assert_eq!(png.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(png.get_pixel(4, 150).0, [0, 0, 0]);
        assert_eq!(png.get_pixel(6, 150).0, [255, 255, 255]);
    }
}
