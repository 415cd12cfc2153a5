//! Huxley2 JSON proxy for the National Rail departure boards.

use std::sync::{Arc, Mutex, OnceLock};

use serde::Deserialize;

use crate::error::{Error, Result, UpstreamKind};
use crate::telemetry::Telemetry;
use crate::traits::{Departures, HttpClient, HttpRequest, TrainSource};
use crate::train::{settle, RawBoard, RawService, TrainObject};

/// Public Huxley2 instance used when no URL is configured.
pub const HUXLEY2_URL: &str = "https://huxley2.azurewebsites.net";

const PROVIDER: &str = "huxley2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Board {
    #[serde(default)]
    train_services: Option<Vec<Service>>,
    #[serde(default)]
    nrcc_messages: Option<Vec<Message>>,
    #[serde(default)]
    filter_location_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(default)]
    std: Option<String>,
    #[serde(default)]
    etd: Option<String>,
    #[serde(default)]
    destination: Vec<Location>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    location_name: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    value: String,
}

impl From<Board> for RawBoard {
    fn from(board: Board) -> Self {
        let services = board
            .train_services
            .unwrap_or_default()
            .into_iter()
            .map(|s| RawService {
                destination: s
                    .destination
                    .into_iter()
                    .next()
                    .map(|l| l.location_name)
                    .unwrap_or_default(),
                std: s.std.unwrap_or_default(),
                etd: s.etd.unwrap_or_default(),
            })
            .collect();
        RawBoard {
            services,
            messages: board
                .nrcc_messages
                .unwrap_or_default()
                .into_iter()
                .map(|m| m.value.trim().to_string())
                .collect(),
            filter_location: board.filter_location_name,
        }
    }
}

/// Huxley2 departure source.
pub struct Huxley2 {
    object: TrainObject,
    client: Arc<dyn HttpClient>,
    telemetry: Telemetry,
    cache: OnceLock<Departures>,
    fetch: Mutex<()>,
}

impl std::fmt::Debug for Huxley2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Huxley2")
            .field("object", &self.object)
            .field("retrieved", &self.cache.get().is_some())
            .finish()
    }
}

impl Huxley2 {
    /// Build from a validated object. Nothing is fetched yet.
    pub fn new(object: TrainObject, client: Arc<dyn HttpClient>, telemetry: &Telemetry) -> Self {
        Self {
            object,
            client,
            telemetry: telemetry.scoped("rs_inky::train"),
            cache: OnceLock::new(),
            fetch: Mutex::new(()),
        }
    }

    /// The object this provider was built from.
    pub fn object(&self) -> &TrainObject {
        &self.object
    }

    fn request(&self) -> HttpRequest {
        let base = self
            .object
            .url
            .as_deref()
            .unwrap_or(HUXLEY2_URL)
            .trim_end_matches('/');
        let url = format!(
            "{base}/departures/{}/to/{}/{}",
            self.object.station_from,
            self.object.station_to,
            self.object.rows()
        );
        let request = HttpRequest::get(url);
        match &self.object.token {
            Some(token) if !token.is_blank() => request.with_query("accessToken", token.expose()),
            _ => request,
        }
    }

    fn query(&self) -> Result<RawBoard> {
        let response = self
            .client
            .send(&self.request())
            .map_err(|e| Error::upstream(PROVIDER, UpstreamKind::Transport(e.to_string())))?;
        match response.status {
            401 | 403 => return Err(Error::upstream(PROVIDER, UpstreamKind::Unauthorized)),
            status if !response.is_success() => {
                return Err(Error::upstream(PROVIDER, UpstreamKind::Status(status)))
            }
            _ => {}
        }
        let board: Board = serde_json::from_slice(&response.body)
            .map_err(|e| Error::malformed(PROVIDER, e.to_string()))?;
        Ok(board.into())
    }
}

impl TrainSource for Huxley2 {
    fn retrieve_data(&self) -> Departures {
        if let Some(departures) = self.cache.get() {
            return departures.clone();
        }
        let _guard = self.fetch.lock().unwrap_or_else(|e| e.into_inner());
        self.cache
            .get_or_init(|| {
                self.telemetry.info(format_args!(
                    "fetching departures {} -> {}",
                    self.object.station_from, self.object.station_to
                ));
                settle(self.query(), &self.object, &self.telemetry)
            })
            .clone()
    }

    fn number(&self) -> usize {
        self.object.number
    }
}
