//! Mock implementations for testing without network or hardware.
//!
//! This module provides test doubles for every collaborator trait, so the
//! providers, sinks and orchestrator can be exercised on any machine.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockHttp`] | [`HttpClient`] | Queued responses, recorded requests |
//! | [`MockClock`] | [`Clock`] | Fixed wall-clock time |
//! | [`MockPanel`] | [`PanelDriver`] | Captures committed frames |
//! | [`MockWeather`] | [`WeatherSource`] | Canned forecast, counts calls |
//! | [`MockTrain`] | [`TrainSource`] | Canned departures, counts calls |
//! | [`MockDisplay`] | [`DisplaySink`] | Records draw calls and commits |
//! | [`CaptureLog`] | `log::Log` | Collects formatted log lines |
//!
//! Canned upstream payloads live in [`fixtures`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_inky::hal::{fixtures, MockHttp};
//! use rs_inky::traits::{HttpClient, HttpRequest};
//!
//! let http = Arc::new(MockHttp::new());
//! http.queue_ok(&fixtures::one_call(&[800, 500]));
//!
//! let response = http.send(&HttpRequest::get("https://example.org")).unwrap();
//! assert!(response.is_success());
//! assert_eq!(http.call_count(), 1);
//! ```

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};
use log::{Log, Metadata, Record};

use crate::display::Canvas;
use crate::error::{Error, Result};
use crate::traits::{
    Clock, Departures, DisplaySink, HttpClient, HttpRequest, HttpResponse, IconType,
    PanelDriver, ScaleType, Temperature, TrainFault, TrainRecord, TrainSource, TransportError,
    TransportErrorKind, WeatherSource,
};

// ============================================================================
// Network Mocks
// ============================================================================

/// Mock HTTP client.
///
/// Responses are served in the order they were queued. Once the queue is
/// empty every request fails with a transport error. Share it with a
/// provider through `Arc` and inspect it afterwards.
///
/// # Example
///
/// ```rust
/// use rs_inky::hal::MockHttp;
/// use rs_inky::traits::{HttpClient, HttpRequest, HttpResponse};
///
/// let http = MockHttp::new();
/// http.queue(Ok(HttpResponse::new(401, "")));
///
/// let first = http.send(&HttpRequest::get("https://example.org/a")).unwrap();
/// assert_eq!(first.status, 401);
/// assert!(http.send(&HttpRequest::get("https://example.org/b")).is_err());
/// assert_eq!(http.requests()[1].url, "https://example.org/b");
/// ```
#[derive(Debug, Default)]
pub struct MockHttp {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttp {
    /// Creates a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unanswered request.
    pub fn queue(&self, outcome: Result<HttpResponse, TransportError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Queue a `200 OK` with `body`.
    pub fn queue_ok(&self, body: &str) {
        self.queue(Ok(HttpResponse::ok(body)));
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests seen so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl HttpClient for MockHttp {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Connect,
                    "no response queued",
                ))
            })
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock clock fixed at one instant.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockClock {
    /// The instant `now()` returns.
    pub now: NaiveDateTime,
}

impl MockClock {
    /// A clock stopped at the given local date and minute.
    ///
    /// Invalid dates fall back to the Unix epoch.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap_or_default();
        Self { now }
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Mock panel driver.
///
/// Clones share the same frame log, so a test can keep one clone while the
/// sink owns the other.
#[derive(Clone, Debug)]
pub struct MockPanel {
    /// Whether the panel reports accent ink support.
    pub accent: bool,
    /// Make every `show` fail.
    pub fail: bool,
    frames: Arc<Mutex<Vec<Canvas>>>,
}

impl MockPanel {
    /// An accent-capable panel.
    pub fn new() -> Self {
        Self {
            accent: true,
            fail: false,
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A black and white panel.
    pub fn monochrome() -> Self {
        Self {
            accent: false,
            ..Self::new()
        }
    }

    /// Number of frames shown.
    pub fn frame_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<Canvas> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Default for MockPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelDriver for MockPanel {
    fn name(&self) -> &'static str {
        "mock-panel"
    }

    fn supports_accent(&self) -> bool {
        self.accent
    }

    fn show(&mut self, frame: &Canvas) -> Result<()> {
        if self.fail {
            return Err(Error::Render {
                backend: "mock-panel",
                reason: "panel did not acknowledge".into(),
            });
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.clone());
        Ok(())
    }
}

// ============================================================================
// Source Mocks
// ============================================================================

/// Mock weather source with eight days of canned data.
///
/// Temperatures are stored in Kelvin, like a real provider's cache.
/// Accessors fail with [`Error::NotRetrieved`] until `retrieve_data` runs.
#[derive(Debug)]
pub struct MockWeather {
    /// Output scale.
    pub scale: ScaleType,
    /// Icon per day.
    pub icons: Vec<IconType>,
    /// Description per day.
    pub conditions: Vec<String>,
    /// `(min, max)` in Kelvin per day.
    pub ranges: Vec<(f64, f64)>,
    /// Daytime Kelvin per day; day 0 is the current reading.
    pub day_temps: Vec<f64>,
    /// Short current condition.
    pub current_condition: String,
    /// Returned by `retrieve_data` when set.
    pub fail_retrieve: Option<Error>,
    retrieved: Cell<bool>,
    calls: Cell<usize>,
}

impl MockWeather {
    /// Clear today, rain tomorrow, then the remaining icons in order.
    pub fn new() -> Self {
        let icons = vec![
            IconType::ClearSky,
            IconType::Rain,
            IconType::FewClouds,
            IconType::ScatteredClouds,
            IconType::BrokenClouds,
            IconType::Snow,
            IconType::Thunderstorm,
            IconType::Mist,
        ];
        let conditions = icons
            .iter()
            .map(|icon| {
                match icon {
                    IconType::ClearSky => "clear sky",
                    IconType::FewClouds => "few clouds",
                    IconType::ScatteredClouds => "scattered clouds",
                    IconType::BrokenClouds => "broken clouds",
                    IconType::ShowerRain => "shower rain",
                    IconType::Rain => "light rain",
                    IconType::Thunderstorm => "thunderstorm",
                    IconType::Snow => "snow",
                    IconType::Mist => "mist",
                }
                .to_string()
            })
            .collect();
        Self {
            scale: ScaleType::Celsius,
            icons,
            conditions,
            ranges: vec![(278.15, 288.15); 8],
            day_temps: (0..8).map(|d| 285.15 - d as f64).collect(),
            current_condition: "Clear".into(),
            fail_retrieve: None,
            retrieved: Cell::new(false),
            calls: Cell::new(0),
        }
    }

    /// A source whose `retrieve_data` fails with `err`.
    pub fn failing(err: Error) -> Self {
        Self {
            fail_retrieve: Some(err),
            ..Self::new()
        }
    }

    /// Report temperatures in `scale`.
    pub fn with_scale(mut self, scale: ScaleType) -> Self {
        self.scale = scale;
        self
    }

    /// Calls of any trait method so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn touch(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.retrieved.get() {
            Ok(())
        } else {
            Err(Error::NotRetrieved { provider: "mock" })
        }
    }

    fn day<T: Clone>(&self, values: &[T], day: usize) -> Result<T> {
        self.touch()?;
        values.get(day).cloned().ok_or(Error::OutOfRange {
            what: "forecast day",
            requested: day,
            limit: values.len().saturating_sub(1),
        })
    }
}

impl Default for MockWeather {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherSource for MockWeather {
    fn retrieve_data(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if let Some(err) = &self.fail_retrieve {
            return Err(err.clone());
        }
        self.retrieved.set(true);
        Ok(())
    }

    fn scale(&self) -> ScaleType {
        self.scale
    }

    fn get_icon(&self, day: usize) -> Result<IconType> {
        self.day(&self.icons, day)
    }

    fn get_condition(&self, day: usize) -> Result<String> {
        self.day(&self.conditions, day)
    }

    fn get_temp_range(&self, day: usize) -> Result<(Temperature, Temperature)> {
        let (min, max) = self.day(&self.ranges, day)?;
        Ok((
            Temperature::from_kelvin(min, self.scale),
            Temperature::from_kelvin(max, self.scale),
        ))
    }

    fn get_current_temperature(&self) -> Result<Temperature> {
        self.get_future_weather(0)
    }

    fn get_current_condition(&self) -> Result<String> {
        self.touch()?;
        Ok(self.current_condition.clone())
    }

    fn get_future_weather(&self, day: usize) -> Result<Temperature> {
        let kelvin = self.day(&self.day_temps, day)?;
        Ok(Temperature::from_kelvin(kelvin, self.scale))
    }
}

/// Mock departure board.
#[derive(Debug)]
pub struct MockTrain {
    /// Board returned by `retrieve_data`.
    pub departures: Departures,
    /// Rows to show.
    pub number: usize,
    calls: Cell<usize>,
}

impl MockTrain {
    /// A board with one record per `(destination, time)` pair.
    pub fn with_services(services: &[(&str, &str)], number: usize) -> Self {
        let records = services
            .iter()
            .map(|(destination, time)| TrainRecord::new(destination, time))
            .collect();
        Self {
            departures: Departures::from_records(records, "London Bridge"),
            number,
            calls: Cell::new(0),
        }
    }

    /// A board that failed upstream.
    pub fn failing(fault: TrainFault) -> Self {
        Self {
            departures: Departures::failed(fault),
            number: 3,
            calls: Cell::new(0),
        }
    }

    /// Calls of `retrieve_data` so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl TrainSource for MockTrain {
    fn retrieve_data(&self) -> Departures {
        self.calls.set(self.calls.get() + 1);
        self.departures.clone()
    }

    fn number(&self) -> usize {
        self.number
    }
}

// ============================================================================
// Display Mocks
// ============================================================================

/// Mock display sink.
///
/// Records one entry per draw call. Draw calls that take a source read from
/// it the way a real sink does, so source errors surface here too.
///
/// # Example
///
/// ```rust
/// use rs_inky::hal::MockDisplay;
/// use rs_inky::traits::DisplaySink;
///
/// let mut display = MockDisplay::new();
/// display.draw_goodnight().unwrap();
/// display.commit().unwrap();
///
/// assert_eq!(display.calls, vec!["draw_goodnight", "commit"]);
/// assert_eq!(display.commit_count, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Draw calls in order.
    pub calls: Vec<String>,
    /// Number of times `commit` was called.
    pub commit_count: usize,
    /// Train lines seen by the last `draw_train_times`.
    pub train_lines: Vec<String>,
    /// Name of a call that should fail with a render error.
    pub fail_on: Option<&'static str>,
}

impl MockDisplay {
    /// Creates a new mock display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls whose name starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&mut self, name: &'static str, call: String) -> Result<()> {
        if self.fail_on == Some(name) {
            return Err(Error::Render {
                backend: "mock-display",
                reason: format!("{name} failed"),
            });
        }
        self.calls.push(call);
        Ok(())
    }
}

impl DisplaySink for MockDisplay {
    fn draw_date(&mut self, now: NaiveDateTime) -> Result<()> {
        self.record("draw_date", format!("draw_date({})", now.format("%a %d %b %Y")))
    }

    fn draw_time(&mut self, now: NaiveDateTime) -> Result<()> {
        self.record("draw_time", format!("draw_time({})", now.format("%H:%M")))
    }

    fn draw_weather_icon(&mut self, icon: IconType) -> Result<()> {
        self.record("draw_weather_icon", format!("draw_weather_icon({icon:?})"))
    }

    fn draw_weather_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        disp_tomorrow: bool,
    ) -> Result<()> {
        weather.get_current_weather()?;
        if disp_tomorrow {
            weather.get_condition(1)?;
        }
        self.record(
            "draw_weather_forecast",
            format!("draw_weather_forecast(tomorrow={disp_tomorrow})"),
        )
    }

    fn draw_mini_forecast(
        &mut self,
        weather: &dyn WeatherSource,
        slot: usize,
        day: usize,
        _today: NaiveDate,
    ) -> Result<()> {
        weather.get_icon(day)?;
        self.record(
            "draw_mini_forecast",
            format!("draw_mini_forecast(slot={slot}, day={day})"),
        )
    }

    fn draw_train_times(&mut self, trains: &dyn TrainSource) -> Result<()> {
        self.train_lines = trains.fetch_train().lines();
        self.record("draw_train_times", "draw_train_times".into())
    }

    fn draw_goodnight(&mut self) -> Result<()> {
        self.record("draw_goodnight", "draw_goodnight".into())
    }

    fn commit(&mut self) -> Result<()> {
        self.record("commit", "commit".into())?;
        self.commit_count += 1;
        Ok(())
    }
}

// ============================================================================
// Logging Mock
// ============================================================================

/// Logger that keeps every record as `"LEVEL target: message"`.
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct CaptureLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureLog {
    /// An empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Log for CaptureLog {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!(
                "{} {}: {}",
                record.level(),
                record.target(),
                record.args()
            ));
    }

    fn flush(&self) {}
}

// ============================================================================
// Upstream Fixtures
// ============================================================================

/// Canned upstream payloads shaped like the real services' responses.
pub mod fixtures {
    use serde_json::{json, Value};

    fn describe(code: u16) -> (&'static str, &'static str) {
        match code {
            200..=232 => ("Thunderstorm", "thunderstorm"),
            300..=321 => ("Drizzle", "light intensity drizzle"),
            500 => ("Rain", "light rain"),
            501..=531 => ("Rain", "moderate rain"),
            600..=622 => ("Snow", "light snow"),
            701..=781 => ("Fog", "fog"),
            800 => ("Clear", "clear sky"),
            801 => ("Clouds", "few clouds"),
            802 => ("Clouds", "scattered clouds"),
            803 => ("Clouds", "broken clouds"),
            804 => ("Clouds", "overcast clouds"),
            _ => ("Unknown", "unknown"),
        }
    }

    fn condition(code: u16) -> Value {
        let (main, description) = describe(code);
        json!([{ "id": code, "main": main, "description": description, "icon": "01d" }])
    }

    /// One Call payload with one daily entry per code.
    ///
    /// `codes[0]` is also the current condition. Current temperature is
    /// 285.15 K; day `d` averages `285.15 - d` K with a 278.15..288.15 K
    /// range.
    pub fn one_call(codes: &[u16]) -> String {
        let current_code = codes.first().copied().unwrap_or(800);
        let daily: Vec<Value> = codes
            .iter()
            .enumerate()
            .map(|(d, &code)| {
                json!({
                    "dt": 1_728_900_000 + 86_400 * d as i64,
                    "temp": {
                        "day": 285.15 - d as f64,
                        "min": 278.15,
                        "max": 288.15,
                        "night": 280.15,
                        "eve": 283.15,
                        "morn": 279.15
                    },
                    "humidity": 71,
                    "weather": condition(code)
                })
            })
            .collect();
        json!({
            "lat": 51.5085,
            "lon": -0.1257,
            "timezone": "Europe/London",
            "current": {
                "dt": 1_728_890_000,
                "temp": 285.15,
                "feels_like": 284.2,
                "weather": condition(current_code)
            },
            "daily": daily
        })
        .to_string()
    }

    /// Huxley2 departures from BHO filtered to London Bridge.
    ///
    /// An empty slice yields `"trainServices": null`, as Huxley2 sends.
    pub fn huxley2_board(services: &[(&str, &str, &str)]) -> String {
        huxley2_board_with_notice(services, None)
    }

    /// Huxley2 board carrying one `nrccMessages` entry when `notice` is set.
    pub fn huxley2_board_with_notice(
        services: &[(&str, &str, &str)],
        notice: Option<&str>,
    ) -> String {
        let nrcc_messages = notice.map_or(Value::Null, |text| json!([{ "value": text }]));
        let train_services: Value = if services.is_empty() {
            Value::Null
        } else {
            services
                .iter()
                .map(|(destination, std, etd)| {
                    json!({
                        "std": std,
                        "etd": etd,
                        "platform": "2",
                        "operator": "Southern",
                        "origin": [{ "locationName": "Blackhorse Road", "crs": "BHO" }],
                        "destination": [{ "locationName": destination, "crs": "XXX" }]
                    })
                })
                .collect()
        };
        json!({
            "generatedAt": "2024-10-14T07:45:00+01:00",
            "locationName": "Blackhorse Road",
            "crs": "BHO",
            "filterLocationName": "London Bridge",
            "filtercrs": "LBG",
            "nrccMessages": nrcc_messages,
            "trainServices": train_services
        })
        .to_string()
    }

    /// OpenLDBWS `GetDepartureBoardResponse` filtered to Walthamstow
    /// Queens Road.
    pub fn open_live_board(services: &[(&str, &str, &str)]) -> String {
        open_live_board_with_notice(services, None)
    }

    /// OpenLDBWS board carrying one `nrccMessages` entry when `notice` is set.
    pub fn open_live_board_with_notice(
        services: &[(&str, &str, &str)],
        notice: Option<&str>,
    ) -> String {
        let nrcc_messages = notice.map_or(String::new(), |text| {
            format!(
                "<lt:nrccMessages><lt:message>{}</lt:message></lt:nrccMessages>",
                quick_xml::escape::escape(text)
            )
        });
        let services_xml: String = services
            .iter()
            .map(|(destination, std, etd)| {
                format!(
                    concat!(
                        "<lt5:service>",
                        "<lt4:std>{std}</lt4:std><lt4:etd>{etd}</lt4:etd>",
                        "<lt4:operator>London Overground</lt4:operator>",
                        "<lt5:origin><lt4:location><lt4:locationName>Barking</lt4:locationName>",
                        "<lt4:crs>BKG</lt4:crs></lt4:location></lt5:origin>",
                        "<lt5:destination><lt4:location><lt4:locationName>{destination}</lt4:locationName>",
                        "<lt4:crs>XXX</lt4:crs></lt4:location></lt5:destination>",
                        "</lt5:service>"
                    ),
                    std = std,
                    etd = etd,
                    destination = destination
                )
            })
            .collect();
        let train_services = if services.is_empty() {
            String::new()
        } else {
            format!("<lt5:trainServices>{services_xml}</lt5:trainServices>")
        };
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "<soap:Body>",
                r#"<GetDepartureBoardResponse xmlns="http://thalesgroup.com/RTTI/2017-10-01/ldb/">"#,
                r#"<GetStationBoardResult xmlns:lt4="http://thalesgroup.com/RTTI/2015-11-27/ldb/types" "#,
                r#"xmlns:lt5="http://thalesgroup.com/RTTI/2016-02-16/ldb/types" "#,
                r#"xmlns:lt="http://thalesgroup.com/RTTI/2012-01-13/ldb/types">"#,
                "<lt4:generatedAt>2024-10-14T07:45:00+01:00</lt4:generatedAt>",
                "<lt4:locationName>Blackhorse Road</lt4:locationName>",
                "<lt4:crs>BHO</lt4:crs>",
                "<lt4:filterLocationName>Walthamstow Queens Road</lt4:filterLocationName>",
                "<lt4:filtercrs>WMW</lt4:filtercrs>",
                "{messages}",
                "{services}",
                "</GetStationBoardResult></GetDepartureBoardResponse>",
                "</soap:Body></soap:Envelope>"
            ),
            messages = nrcc_messages,
            services = train_services
        )
    }
}
