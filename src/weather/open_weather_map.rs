//! OpenWeatherMap One Call provider.
//!
//! One GET per instance. The JSON payload is reduced to a [`Snapshot`]
//! holding raw Kelvin readings and the primary condition of the current
//! block and each daily entry; every accessor reads that snapshot.

use std::sync::{Arc, Mutex, OnceLock};

use serde::Deserialize;

use crate::error::{Error, Result, UpstreamKind};
use crate::telemetry::Telemetry;
use crate::traits::{
    check_day_limit, HttpClient, HttpRequest, IconType, ScaleType, Temperature, WeatherSource,
};
use crate::weather::WeatherObject;

/// One Call endpoint.
pub const ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

const PROVIDER: &str = "open_weather_map";

// ============================================================================
// Payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawOneCall {
    current: Option<RawCurrent>,
    daily: Option<Vec<RawDaily>>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    temp: f64,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct RawDaily {
    temp: RawDailyTemp,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct RawDailyTemp {
    day: f64,
    min: f64,
    max: f64,
}

#[derive(Clone, Debug, Deserialize)]
struct Condition {
    id: u16,
    main: String,
    description: String,
}

/// Cached payload. Temperatures stay in Kelvin.
#[derive(Debug)]
struct Snapshot {
    current_kelvin: f64,
    current: Condition,
    daily: Vec<DailyReading>,
}

#[derive(Debug)]
struct DailyReading {
    day_kelvin: f64,
    min_kelvin: f64,
    max_kelvin: f64,
    condition: Condition,
}

fn kelvin(value: f64, field: &str) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::malformed(
            PROVIDER,
            format!("{field} is not a valid Kelvin reading"),
        ))
    }
}

fn primary(conditions: Vec<Condition>, field: &str) -> Result<Condition> {
    conditions
        .into_iter()
        .next()
        .ok_or_else(|| Error::malformed(PROVIDER, format!("{field} has no weather entry")))
}

impl TryFrom<RawOneCall> for Snapshot {
    type Error = Error;

    fn try_from(raw: RawOneCall) -> Result<Self> {
        let current = raw
            .current
            .ok_or_else(|| Error::malformed(PROVIDER, "missing `current` section"))?;
        let daily = raw
            .daily
            .ok_or_else(|| Error::malformed(PROVIDER, "missing `daily` section"))?;
        if daily.is_empty() {
            return Err(Error::malformed(PROVIDER, "empty `daily` section"));
        }

        let daily = daily
            .into_iter()
            .map(|d| {
                Ok(DailyReading {
                    day_kelvin: kelvin(d.temp.day, "daily.temp.day")?,
                    min_kelvin: kelvin(d.temp.min, "daily.temp.min")?,
                    max_kelvin: kelvin(d.temp.max, "daily.temp.max")?,
                    condition: primary(d.weather, "daily")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Snapshot {
            current_kelvin: kelvin(current.temp, "current.temp")?,
            current: primary(current.weather, "current")?,
            daily,
        })
    }
}

// ============================================================================
// Provider
// ============================================================================

/// OpenWeatherMap weather source.
pub struct OpenWeatherMap {
    object: WeatherObject,
    client: Arc<dyn HttpClient>,
    telemetry: Telemetry,
    cache: OnceLock<Snapshot>,
    fetch: Mutex<()>,
}

impl std::fmt::Debug for OpenWeatherMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMap")
            .field("object", &self.object)
            .field("retrieved", &self.cache.get().is_some())
            .finish()
    }
}

impl OpenWeatherMap {
    /// Build from a validated object. Nothing is fetched yet.
    pub fn new(object: WeatherObject, client: Arc<dyn HttpClient>, telemetry: &Telemetry) -> Self {
        Self {
            object,
            client,
            telemetry: telemetry.scoped("rs_inky::weather"),
            cache: OnceLock::new(),
            fetch: Mutex::new(()),
        }
    }

    /// The object this provider was built from.
    pub fn object(&self) -> &WeatherObject {
        &self.object
    }

    fn request(&self) -> HttpRequest {
        let mut request = HttpRequest::get(ONE_CALL_URL)
            .with_query("lat", self.object.latitude.to_string())
            .with_query("lon", self.object.longitude.to_string());
        if !self.object.exclude_flags.is_empty() {
            request = request.with_query("exclude", self.object.exclude_flags.join(","));
        }
        request.with_query("appid", self.object.api_token.expose())
    }

    fn query(&self) -> Result<Snapshot> {
        let response = self
            .client
            .send(&self.request())
            .map_err(|e| Error::upstream(PROVIDER, UpstreamKind::Transport(e.to_string())))?;
        match response.status {
            401 => return Err(Error::upstream(PROVIDER, UpstreamKind::Unauthorized)),
            status if !response.is_success() => {
                return Err(Error::upstream(PROVIDER, UpstreamKind::Status(status)))
            }
            _ => {}
        }
        let raw: RawOneCall = serde_json::from_slice(&response.body)
            .map_err(|e| Error::malformed(PROVIDER, e.to_string()))?;
        Snapshot::try_from(raw)
    }

    fn snapshot(&self) -> Result<&Snapshot> {
        self.cache
            .get()
            .ok_or(Error::NotRetrieved { provider: PROVIDER })
    }

    fn daily(&self, day: usize) -> Result<&DailyReading> {
        check_day_limit(day)?;
        let daily = &self.snapshot()?.daily;
        daily.get(day).ok_or(Error::OutOfRange {
            what: "forecast day",
            requested: day,
            limit: daily.len().saturating_sub(1),
        })
    }

    fn temperature(&self, kelvin: f64) -> Temperature {
        Temperature::from_kelvin(kelvin, self.object.scale)
    }
}

impl WeatherSource for OpenWeatherMap {
    fn retrieve_data(&self) -> Result<()> {
        if self.cache.get().is_some() {
            return Ok(());
        }
        let _guard = self.fetch.lock().unwrap_or_else(|e| e.into_inner());
        if self.cache.get().is_some() {
            return Ok(());
        }

        self.telemetry.info(format_args!(
            "fetching forecast for {:.4},{:.4}",
            self.object.latitude, self.object.longitude
        ));
        let snapshot = match self.query() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.telemetry.error(format_args!("weather query failed: {err}"));
                return Err(err);
            }
        };
        self.telemetry.debug(format_args!(
            "forecast has {} daily entries",
            snapshot.daily.len()
        ));
        let _ = self.cache.set(snapshot);
        Ok(())
    }

    fn scale(&self) -> ScaleType {
        self.object.scale
    }

    fn get_icon(&self, day: usize) -> Result<IconType> {
        check_day_limit(day)?;
        let condition = if day == 0 {
            &self.snapshot()?.current
        } else {
            &self.daily(day)?.condition
        };
        IconType::from_condition_code(condition.id).ok_or(Error::UnrecognizedCondition {
            code: condition.id,
        })
    }

    fn get_condition(&self, day: usize) -> Result<String> {
        Ok(self.daily(day)?.condition.description.clone())
    }

    fn get_temp_range(&self, day: usize) -> Result<(Temperature, Temperature)> {
        let reading = self.daily(day)?;
        Ok((
            self.temperature(reading.min_kelvin),
            self.temperature(reading.max_kelvin),
        ))
    }

    fn get_current_temperature(&self) -> Result<Temperature> {
        Ok(self.temperature(self.snapshot()?.current_kelvin))
    }

    fn get_current_condition(&self) -> Result<String> {
        Ok(self.snapshot()?.current.main.clone())
    }

    fn get_future_weather(&self, day: usize) -> Result<Temperature> {
        check_day_limit(day)?;
        if day == 0 {
            return self.get_current_temperature();
        }
        Ok(self.temperature(self.daily(day)?.day_kelvin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Secret, WeatherModel};
    use crate::hal::{fixtures, CaptureLog, MockHttp};
    use crate::traits::{HttpResponse, TransportError, TransportErrorKind};

    fn object(scale: ScaleType) -> WeatherObject {
        WeatherObject {
            model: WeatherModel::OpenWeatherMap,
            api_token: Secret::new("owm-secret"),
            latitude: 51.5085,
            longitude: -0.1257,
            exclude_flags: vec!["minutely".into(), "hourly".into()],
            scale,
        }
    }

    fn provider(http: &Arc<MockHttp>, scale: ScaleType) -> OpenWeatherMap {
        OpenWeatherMap::new(object(scale), http.clone(), &Telemetry::silent())
    }

    // =========================================================================
    // Retrieval Tests
    // =========================================================================

    #[test]
    fn request_carries_location_and_key() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500, 801]));
        let weather = provider(&http, ScaleType::Celsius);
        weather.retrieve_data().unwrap();

        let request = &http.requests()[0];
        assert_eq!(request.url, ONE_CALL_URL);
        assert_eq!(request.query_param("lat"), Some("51.5085"));
        assert_eq!(request.query_param("lon"), Some("-0.1257"));
        assert_eq!(request.query_param("exclude"), Some("minutely,hourly"));
        assert_eq!(request.query_param("appid"), Some("owm-secret"));
    }

    #[test]
    fn retrieve_is_memoized() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500]));
        let weather = provider(&http, ScaleType::Celsius);
        weather.retrieve_data().unwrap();
        weather.retrieve_data().unwrap();
        weather.get_icon(1).unwrap();
        weather.get_current_temperature().unwrap();
        assert_eq!(http.call_count(), 1);
    }

    #[test]
    fn concurrent_retrieve_queries_once() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500]));
        let weather = Arc::new(provider(&http, ScaleType::Celsius));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let weather = Arc::clone(&weather);
                std::thread::spawn(move || weather.retrieve_data())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(http.call_count(), 1);
    }

    #[test]
    fn accessor_before_retrieve_fails_without_network() {
        let http = Arc::new(MockHttp::new());
        let weather = provider(&http, ScaleType::Celsius);
        assert_eq!(
            weather.get_current_temperature(),
            Err(Error::NotRetrieved { provider: PROVIDER })
        );
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn unauthorized_is_classified() {
        let http = Arc::new(MockHttp::new());
        http.queue(Ok(HttpResponse::new(
            401,
            r#"{"cod":401,"message":"Invalid API key"}"#,
        )));
        let weather = provider(&http, ScaleType::Celsius);
        assert_eq!(
            weather.retrieve_data(),
            Err(Error::upstream(PROVIDER, UpstreamKind::Unauthorized))
        );
    }

    #[test]
    fn transport_error_propagates() {
        let http = Arc::new(MockHttp::new());
        http.queue(Err(TransportError::new(
            TransportErrorKind::Timeout,
            "timed out",
        )));
        let weather = provider(&http, ScaleType::Celsius);
        assert!(weather.retrieve_data().unwrap_err().is_upstream());
    }

    #[test]
    fn missing_section_is_malformed() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(r#"{"current":{"temp":280.0,"weather":[{"id":800,"main":"Clear","description":"clear sky"}]}}"#);
        let weather = provider(&http, ScaleType::Celsius);
        assert!(matches!(
            weather.retrieve_data(),
            Err(Error::Upstream {
                kind: UpstreamKind::Malformed(_),
                ..
            })
        ));
    }

    #[test]
    fn token_never_logged() {
        let capture = CaptureLog::new();
        let http = Arc::new(MockHttp::new());
        http.queue(Ok(HttpResponse::new(500, "oops")));
        let weather = OpenWeatherMap::new(
            object(ScaleType::Celsius),
            http.clone(),
            &Telemetry::new(capture.clone()),
        );
        let err = weather.retrieve_data().unwrap_err();

        assert!(!err.to_string().contains("owm-secret"));
        assert!(!format!("{weather:?}").contains("owm-secret"));
        assert!(!capture.lines().is_empty());
        assert!(capture.lines().iter().all(|l| !l.contains("owm-secret")));
    }

    // =========================================================================
    // Accessor Tests
    // =========================================================================

    #[test]
    fn icons_by_day() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500, 999]));
        let weather = provider(&http, ScaleType::Celsius);
        weather.retrieve_data().unwrap();

        assert_eq!(weather.get_icon(0), Ok(IconType::ClearSky));
        assert_eq!(weather.get_icon(1), Ok(IconType::Rain));
        assert_eq!(
            weather.get_icon(2),
            Err(Error::UnrecognizedCondition { code: 999 })
        );
    }

    #[test]
    fn day_limits() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500]));
        let weather = provider(&http, ScaleType::Celsius);
        weather.retrieve_data().unwrap();

        // Beyond the provider horizon
        assert!(matches!(
            weather.get_temp_range(8),
            Err(Error::OutOfRange { limit: 7, .. })
        ));
        // Within the horizon but beyond the payload
        assert!(matches!(
            weather.get_condition(3),
            Err(Error::OutOfRange {
                requested: 3,
                limit: 1,
                ..
            })
        ));
    }

    #[test]
    fn conversions_are_lazy() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500]));
        let celsius = provider(&http, ScaleType::Celsius);
        celsius.retrieve_data().unwrap();

        let http_f = Arc::new(MockHttp::new());
        http_f.queue_ok(&fixtures::one_call(&[800, 500]));
        let fahrenheit = provider(&http_f, ScaleType::Fahrenheit);
        fahrenheit.retrieve_data().unwrap();

        let c = celsius.get_current_temperature().unwrap();
        let f = fahrenheit.get_current_temperature().unwrap();
        assert!((c.value - 12.0).abs() < 1e-9);
        assert!((f.value - 53.6).abs() < 1e-9);
        // Reading twice gives the same answer
        assert_eq!(celsius.get_current_temperature().unwrap(), c);
    }

    #[test]
    fn formatted_strings() {
        let http = Arc::new(MockHttp::new());
        http.queue_ok(&fixtures::one_call(&[800, 500]));
        let weather = provider(&http, ScaleType::Celsius);
        weather.retrieve_data().unwrap();

        assert_eq!(weather.get_current_weather().unwrap(), "12.0°C - Clear");
        assert_eq!(weather.get_condition(1).unwrap(), "light rain");
        let (min, max) = weather.get_temp_range(0).unwrap();
        assert_eq!(format!("{min} - {max}"), "5.0°C - 15.0°C");
        assert_eq!(weather.get_future_weather(1).unwrap().to_string(), "11.0°C");
        assert_eq!(weather.get_future_weather(0).unwrap().to_string(), "12.0°C");
    }
}
