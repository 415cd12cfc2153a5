//! Departure board providers and their canonical input.
//!
//! | Provider | Transport | Token |
//! |----------|-----------|-------|
//! | [`Huxley2`] | JSON over HTTP GET | optional `accessToken` query |
//! | [`OpenLive`] | SOAP over HTTP POST | required `AccessToken` header |
//!
//! Both reduce their payload to a list of `(destination, std, etd)` entries
//! and hand it to [`settle`], which builds the cached [`Departures`].

mod huxley2;
mod open_live;

pub use huxley2::{Huxley2, HUXLEY2_URL};
pub use open_live::{OpenLive, OPEN_LIVE_URL};

use crate::config::{LongString, Secret, ShortString, TrainModel};
use crate::error::Result;
use crate::telemetry::Telemetry;
use crate::config::bounded;
use crate::traits::{notice_line, Departures, TrainFault, TrainRecord, PROVIDER_MAX_ROWS};

/// Validated train provider input.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainObject {
    /// Provider tag.
    pub model: TrainModel,
    /// Rows to show, at least 1.
    pub number: usize,
    /// Three-character CRS code of the departure station.
    pub station_from: ShortString,
    /// Three-character CRS code the board is filtered to.
    pub station_to: ShortString,
    /// API token, when the provider takes one.
    pub token: Option<Secret>,
    /// Endpoint override.
    pub url: Option<LongString>,
}

impl TrainObject {
    /// Rows actually requested upstream.
    pub fn rows(&self) -> usize {
        self.number.clamp(1, PROVIDER_MAX_ROWS)
    }
}

/// A service as every provider sees it before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RawService {
    pub destination: String,
    pub std: String,
    pub etd: String,
}

/// A decoded board before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RawBoard {
    pub services: Vec<RawService>,
    pub messages: Vec<String>,
    pub filter_location: Option<String>,
}

/// Turn a provider query result into the cached departures.
///
/// Errors are logged and collapsed into a sentinel. An empty board shows its
/// first disruption notice as [`TrainFault::Notice`], or else becomes
/// [`TrainFault::NoServices`] naming the filter location.
pub(crate) fn settle(
    result: Result<RawBoard>,
    object: &TrainObject,
    telemetry: &Telemetry,
) -> Departures {
    let board = match result {
        Ok(board) => board,
        Err(err) => {
            telemetry.warn(format_args!("train query failed: {err}"));
            return Departures::failed(TrainFault::from_error(&err));
        }
    };

    for message in &board.messages {
        telemetry.info(format_args!("service notice: {message}"));
    }

    let records: Vec<TrainRecord> = board
        .services
        .iter()
        .filter(|s| !s.destination.trim().is_empty())
        .take(PROVIDER_MAX_ROWS)
        .map(|s| TrainRecord::from_service(&s.destination, &s.std, &s.etd))
        .collect();

    let destination = board
        .filter_location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(object.station_to.as_str());
    if records.is_empty() {
        telemetry.warn(format_args!("no services to {destination}"));
        if let Some(text) = board.messages.iter().find_map(|m| notice_line(m)) {
            return Departures::failed(TrainFault::Notice {
                text: bounded(&text),
            });
        }
    }
    let departures = Departures::from_records(records, destination);
    if !departures.is_empty() {
        telemetry.debug(format_args!(
            "{} services from {}",
            departures.records.len(),
            object.station_from
        ));
    }
    departures
}
