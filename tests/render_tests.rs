//! Whole render sessions against the real display sinks

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use rs_inky::app::{render, Runtime};
use rs_inky::config::{BaseColor, Config, DisplayModel, TrainConfig, TrainModel, WeatherConfig};
use rs_inky::display::{ink_color, layout, Canvas, DisplayObject, PixelPanel, TerminalText};
use rs_inky::hal::{fixtures, CaptureLog, MockClock, MockHttp, MockPanel};
use rs_inky::icons::Ink;
use rs_inky::telemetry::Telemetry;
use rs_inky::traits::GOODNIGHT_LABEL;
use rs_inky::{DisplayOption, DisplaySink, Error};

use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::{PointsIter, Rectangle};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

const WEEK: [u16; 8] = [800, 500, 801, 802, 803, 600, 200, 701];

fn config() -> Config {
    Config::default()
        .with_weather(WeatherConfig::default().with_api_token("owm-key"))
        .with_train(
            TrainConfig::default()
                .with_model(TrainModel::Huxley2)
                .with_stations("BHO", "LBG"),
        )
}

fn runtime(http: &Arc<MockHttp>, log: &CaptureLog) -> Runtime {
    Runtime::new(
        http.clone(),
        Box::new(MockClock::at(2024, 10, 14, 7, 45)),
        Telemetry::new(log.clone()),
    )
}

fn object(model: DisplayModel, color: BaseColor) -> DisplayObject {
    DisplayObject {
        model,
        base_color: color,
        preview_path: "inky-preview.png".into(),
    }
}

fn inked(canvas: &Canvas, area: Rectangle) -> usize {
    let white = ink_color(Ink::White);
    area.points()
        .filter_map(|p| canvas.pixel(p))
        .filter(|&c| c != white)
        .count()
}

// ============================================================================
// Panel Tests
// ============================================================================

#[test]
fn weather_screen_on_panel() {
    let http = Arc::new(MockHttp::new());
    http.queue_ok(&fixtures::one_call(&WEEK));
    let panel = MockPanel::new();
    let log = CaptureLog::new();
    let mut sink = PixelPanel::new(
        &object(DisplayModel::PixelPanel, BaseColor::Red),
        Box::new(panel.clone()),
        &Telemetry::new(log.clone()),
    );

    render(DisplayOption::Weather, &config(), &runtime(&http, &log), &mut sink).unwrap();

    let frame = panel.last_frame().unwrap();
    assert_eq!(panel.frame_count(), 1);
    assert!(inked(&frame, Rectangle::new(layout::DATE_AT, Size::new(150, 20))) > 0);
    assert!(inked(&frame, Rectangle::new(layout::ICON_AT, Size::new(70, 60))) > 0);
    for slot in 0..5 {
        let area = Rectangle::new(layout::slot_origin(slot), Size::new(70, 80));
        assert!(inked(&frame, area) > 0, "slot {slot}");
    }
    assert!(frame.count(ink_color(Ink::Red)) > 0);
}

#[test]
fn train_screen_on_monochrome_panel() {
    let http = Arc::new(MockHttp::new());
    http.queue_ok(&fixtures::one_call(&WEEK));
    http.queue_ok(&fixtures::huxley2_board(&[
        ("London Bridge", "07:52", "On time"),
        ("London Bridge", "08:02", "08:05"),
    ]));
    let panel = MockPanel::monochrome();
    let log = CaptureLog::new();
    let mut sink = PixelPanel::new(
        &object(DisplayModel::PixelPanel, BaseColor::Yellow),
        Box::new(panel.clone()),
        &Telemetry::silent(),
    );

    render(DisplayOption::Train, &config(), &runtime(&http, &log), &mut sink).unwrap();

    let frame = panel.last_frame().unwrap();
    assert_eq!(frame.count(ink_color(Ink::Yellow)), 0);
    for row in 0..2 {
        let area = Rectangle::new(layout::train_origin(row), Size::new(380, 20));
        assert!(inked(&frame, area) > 0, "row {row}");
    }
    let third = Rectangle::new(layout::train_origin(2), Size::new(380, 20));
    assert_eq!(inked(&frame, third), 0);
}

#[test]
fn failed_weather_leaves_panel_untouched() {
    let http = Arc::new(MockHttp::new());
    let panel = MockPanel::new();
    let log = CaptureLog::new();
    let mut sink = PixelPanel::new(
        &object(DisplayModel::PixelPanel, BaseColor::Red),
        Box::new(panel.clone()),
        &Telemetry::silent(),
    );

    let err = render(DisplayOption::Weather, &config(), &runtime(&http, &log), &mut sink)
        .unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(panel.frame_count(), 0);
}

// ============================================================================
// Terminal Tests
// ============================================================================

#[test]
fn night_on_terminal_needs_no_network() {
    let http = Arc::new(MockHttp::new());
    let buf = SharedBuf::default();
    let log = CaptureLog::new();
    let mut sink = TerminalText::with_writer(
        &object(DisplayModel::TerminalText, BaseColor::Black),
        Box::new(buf.clone()),
        &Telemetry::silent(),
    );

    render(DisplayOption::Night, &config(), &runtime(&http, &log), &mut sink).unwrap();

    assert_eq!(http.call_count(), 0);
    let printed = buf.text();
    assert!(printed.lines().last().unwrap().trim() == GOODNIGHT_LABEL);
    assert!(matches!(sink.commit(), Err(Error::Render { .. })));
}

#[test]
fn train_screen_on_terminal() {
    let http = Arc::new(MockHttp::new());
    http.queue_ok(&fixtures::huxley2_board(&[]));
    let buf = SharedBuf::default();
    let log = CaptureLog::new();
    let mut config = config();
    config.train.weather_glimpse = false;
    let mut sink = TerminalText::with_writer(
        &object(DisplayModel::TerminalText, BaseColor::Black),
        Box::new(buf.clone()),
        &Telemetry::silent(),
    );

    render(DisplayOption::Train, &config, &runtime(&http, &log), &mut sink).unwrap();

    assert_eq!(
        sink.lines(),
        vec![
            format!("Mon 14 Oct 2024{}Updated 07:45", " ".repeat(32)),
            "No train services to London Bridge.".to_string(),
        ]
    );
    assert!(buf.text().contains("No train services to London Bridge."));
}

// ============================================================================
// Preview Tests
// ============================================================================

#[cfg(feature = "desktop")]
#[test]
fn goodnight_preview_png() {
    use rs_inky::display::{DesktopPreview, CANVAS_HEIGHT, CANVAS_WIDTH};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("night.png");
    let display = DisplayObject {
        preview_path: path.clone(),
        ..object(DisplayModel::DesktopPreview, BaseColor::Red)
    };
    let mut sink = DesktopPreview::new(&display, &Telemetry::silent());
    sink.draw_goodnight().unwrap();
    sink.commit().unwrap();

    let image = image::open(&path).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(image.get_pixel(20, 290).0, [255, 255, 255]);
    let red = image.pixels().filter(|p| p.0 == [255, 0, 0]).count();
    assert!(red > 0);
}
