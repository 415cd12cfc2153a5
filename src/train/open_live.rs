//! National Rail OpenLDBWS departure board over SOAP.
//!
//! The request is a hand-built `GetDepartureBoard` envelope carrying the
//! token in the `AccessToken/TokenValue` header. The response is walked with
//! the `quick-xml` event reader on local names, so namespace prefixes chosen
//! by the server do not matter.

use std::sync::{Arc, Mutex, OnceLock};

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result, UpstreamKind};
use crate::telemetry::Telemetry;
use crate::traits::{Departures, HttpClient, HttpRequest, TrainSource};
use crate::train::{settle, RawBoard, RawService, TrainObject};

/// Default OpenLDBWS endpoint.
pub const OPEN_LIVE_URL: &str = "https://lite.realtime.nationalrail.co.uk/OpenLDBWS/ldb11.asmx";

const SOAP_ACTION: &str = "http://thalesgroup.com/RTTI/2012-01-13/ldb/GetDepartureBoard";
const TOKEN_NS: &str = "http://thalesgroup.com/RTTI/2013-11-28/Token/types";
const LDB_NS: &str = "http://thalesgroup.com/RTTI/2017-10-01/ldb/";

const PROVIDER: &str = "open_live";

// ============================================================================
// Envelope
// ============================================================================

fn envelope(object: &TrainObject, token: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:typ="{typ}" xmlns:ldb="{ldb}">"#,
            "<soap:Header><typ:AccessToken><typ:TokenValue>{token}</typ:TokenValue></typ:AccessToken></soap:Header>",
            "<soap:Body><ldb:GetDepartureBoardRequest>",
            "<ldb:numRows>{rows}</ldb:numRows>",
            "<ldb:crs>{from}</ldb:crs>",
            "<ldb:filterCrs>{to}</ldb:filterCrs>",
            "<ldb:filterType>to</ldb:filterType>",
            "</ldb:GetDepartureBoardRequest></soap:Body>",
            "</soap:Envelope>"
        ),
        typ = TOKEN_NS,
        ldb = LDB_NS,
        token = escape(token),
        rows = object.rows(),
        from = escape(object.station_from.as_str()),
        to = escape(object.station_to.as_str()),
    )
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Default)]
struct Decoded {
    board: RawBoard,
    fault: Option<String>,
}

/// Walk a `GetDepartureBoardResponse` (or a SOAP fault).
fn decode(xml: &str) -> Result<Decoded> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut decoded = Decoded::default();
    let mut path: Vec<String> = Vec::new();
    let mut service: Option<RawService> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::malformed(PROVIDER, e.to_string()))?;
        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if name == "service" {
                    service = Some(RawService::default());
                }
                if name == "Fault" {
                    decoded.fault.get_or_insert_with(String::new);
                }
                path.push(name);
            }
            Event::End(_) => {
                if path.pop().as_deref() == Some("service") {
                    if let Some(done) = service.take() {
                        decoded.board.services.push(done);
                    }
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::malformed(PROVIDER, e.to_string()))?;
                let within = |name: &str| path.iter().any(|p| p == name);
                let current = path.last().map(String::as_str);

                match (current, service.as_mut()) {
                    (Some("std"), Some(s)) => s.std = text.into_owned(),
                    (Some("etd"), Some(s)) => s.etd = text.into_owned(),
                    (Some("locationName"), Some(s))
                        if within("destination") && s.destination.is_empty() =>
                    {
                        s.destination = text.into_owned()
                    }
                    (Some("filterLocationName"), None) => {
                        decoded.board.filter_location = Some(text.into_owned())
                    }
                    (Some("message"), None) if within("nrccMessages") => {
                        decoded.board.messages.push(text.trim().to_string())
                    }
                    (Some("faultstring"), _) => decoded.fault = Some(text.into_owned()),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(decoded)
}

fn is_auth_fault(fault: &str) -> bool {
    let fault = fault.to_ascii_lowercase();
    fault.contains("401") || fault.contains("unauthori") || fault.contains("token")
}

// ============================================================================
// Provider
// ============================================================================

/// OpenLDBWS departure source.
pub struct OpenLive {
    object: TrainObject,
    client: Arc<dyn HttpClient>,
    telemetry: Telemetry,
    cache: OnceLock<Departures>,
    fetch: Mutex<()>,
}

impl std::fmt::Debug for OpenLive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenLive")
            .field("object", &self.object)
            .field("retrieved", &self.cache.get().is_some())
            .finish()
    }
}

impl OpenLive {
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
        let url = self.object.url.as_deref().unwrap_or(OPEN_LIVE_URL);
        let token = self.object.token.as_ref().map_or("", |t| t.expose());
        HttpRequest::post(url, envelope(&self.object, token))
            .with_header("Content-Type", "text/xml; charset=utf-8")
            .with_header("SOAPAction", SOAP_ACTION)
    }

    fn query(&self) -> Result<RawBoard> {
        let response = self
            .client
            .send(&self.request())
            .map_err(|e| Error::upstream(PROVIDER, UpstreamKind::Transport(e.to_string())))?;
        if matches!(response.status, 401 | 403) {
            return Err(Error::upstream(PROVIDER, UpstreamKind::Unauthorized));
        }

        let body = response
            .body_str()
            .ok_or_else(|| Error::malformed(PROVIDER, "response is not UTF-8"))?;
        let decoded = match decode(body) {
            Ok(decoded) => decoded,
            Err(_) if !response.is_success() => {
                return Err(Error::upstream(
                    PROVIDER,
                    UpstreamKind::Status(response.status),
                ))
            }
            Err(err) => return Err(err),
        };

        if let Some(fault) = decoded.fault {
            self.telemetry.debug(format_args!("SOAP fault: {fault}"));
            if is_auth_fault(&fault) {
                return Err(Error::upstream(PROVIDER, UpstreamKind::Unauthorized));
            }
            return Err(Error::malformed(PROVIDER, "SOAP fault"));
        }
        if !response.is_success() {
            return Err(Error::upstream(
                PROVIDER,
                UpstreamKind::Status(response.status),
            ));
        }
        Ok(decoded.board)
    }
}

impl TrainSource for OpenLive {
    fn retrieve_data(&self) -> Departures {
        if let Some(departures) = self.cache.get() {
            return departures.clone();
        }
        let _guard = self.fetch.lock().unwrap_or_else(|e| e.into_inner());
        self.cache
            .get_or_init(|| {
                self.telemetry.info(format_args!(
                    "requesting departure board {} -> {}",
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
