//! Train departure abstraction.
//!
//! Providers talk to different services but all end up producing the same
//! [`Departures`] value: an ordered list of [`TrainRecord`]s, or an empty
//! list plus one [`TrainFault`] sentinel. Upstream errors stop at the
//! provider; [`TrainSource::retrieve_data`] cannot fail.
//!
//! # Line layout
//!
//! ```text
//! London Bridge    12:30 exp 12:34
//! |<---- 16 ---->| |<---- 15 ---->|
//! ```

use heapless::String as HString;

use crate::config::bounded;
use crate::error::{Error, UpstreamKind};

/// Characters reserved for the destination column.
pub const DESTINATION_WIDTH: usize = 16;

/// Characters reserved for the time column.
pub const TIME_WIDTH: usize = 15;

/// Most rows any provider will request or return.
pub const PROVIDER_MAX_ROWS: usize = 10;

/// Destination name storage (16 characters of up to 4 bytes each).
pub type Destination = HString<64>;

/// Scheduled/estimated time storage.
pub type DepartureTime = HString<24>;

/// Characters in one formatted departure line.
pub const LINE_WIDTH: usize = DESTINATION_WIDTH + 1 + TIME_WIDTH;

/// Service notice storage (one line of up to 4 bytes per character).
pub type NoticeText = HString<128>;

// ============================================================================
// Records
// ============================================================================

/// One departure, ready to format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainRecord {
    /// Abbreviated destination, at most [`DESTINATION_WIDTH`] characters.
    pub destination: Destination,
    /// Scheduled time, with the estimate appended when it differs.
    pub time: DepartureTime,
}

impl TrainRecord {
    /// Build a record, abbreviating the destination to fit its column.
    pub fn new(destination: &str, time: &str) -> Self {
        Self {
            destination: bounded(&abbreviate_stn_name(destination, DESTINATION_WIDTH)),
            time: bounded(time),
        }
    }

    /// Normalize one upstream service entry.
    ///
    /// `std` is the scheduled time, `etd` the estimate ("On time",
    /// "12:34", "Delayed", "Cancelled"); common words in the destination are
    /// shortened before abbreviation.
    pub fn from_service(destination: &str, std: &str, etd: &str) -> Self {
        let time = compose_time(std, etd);
        Self::new(&shorten_station_words(destination), &time)
    }
}

/// Merge scheduled and estimated times into one short string.
pub fn compose_time(std: &str, etd: &str) -> String {
    let std = std.trim();
    let etd = etd.trim();
    if etd.is_empty() || etd.eq_ignore_ascii_case("on time") || etd == std {
        return std.to_string();
    }
    if is_clock_time(etd) {
        return format!("{std} exp {etd}");
    }
    format!("{std} {}", etd.to_ascii_lowercase())
}

fn is_clock_time(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[2] == b':'
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[3..].iter().all(u8::is_ascii_digit)
}

/// Why no departures are shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrainFault {
    /// The service could not be reached or answered with garbage.
    Unavailable,
    /// The service rejected the token.
    Unauthorized,
    /// The board was fetched but lists no matching services.
    NoServices {
        /// Destination the board was filtered to.
        destination: Destination,
    },
    /// The board lists no services and carries a disruption notice.
    Notice {
        /// First notice, already fitted to one line.
        text: NoticeText,
    },
}

impl TrainFault {
    /// Classify a provider error. Only the kind survives.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Upstream {
                kind: UpstreamKind::Unauthorized,
                ..
            } => TrainFault::Unauthorized,
            _ => TrainFault::Unavailable,
        }
    }
}

/// Outcome of one departure board query.
///
/// `records` is empty exactly when `sentinel` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Departures {
    /// Departures in upstream order.
    pub records: Vec<TrainRecord>,
    /// Placeholder for missing data.
    pub sentinel: Option<TrainFault>,
}

impl Departures {
    /// A successful board; an empty one becomes [`TrainFault::NoServices`].
    pub fn from_records(records: Vec<TrainRecord>, destination: &str) -> Self {
        if records.is_empty() {
            return Self::failed(TrainFault::NoServices {
                destination: bounded(destination),
            });
        }
        Self {
            records,
            sentinel: None,
        }
    }

    /// No records, one sentinel.
    pub fn failed(fault: TrainFault) -> Self {
        Self {
            records: Vec::new(),
            sentinel: Some(fault),
        }
    }

    /// Keep the first `number` records without reordering.
    pub fn truncated(mut self, number: usize) -> Self {
        self.records.truncate(number);
        if self.records.is_empty() && self.sentinel.is_none() {
            self.sentinel = Some(TrainFault::Unavailable);
        }
        self
    }

    /// True when there is nothing to list.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display lines: one per record, or the single error line.
    pub fn lines(&self) -> Vec<String> {
        match &self.sentinel {
            Some(fault) if self.records.is_empty() => vec![format_error_msg(fault)],
            _ => self.records.iter().map(format_train_string).collect(),
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Shorten a station name to at most `max_len` characters.
///
/// Names that already fit come back unchanged. Longer names are cut at the
/// last word boundary inside the limit, or hard-truncated when the first
/// word alone is too long. The result is always a prefix of `name`.
pub fn abbreviate_stn_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let cut = name
        .char_indices()
        .nth(max_len)
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    let head = &name[..cut];
    if name[cut..].starts_with(' ') {
        return head.trim_end().to_string();
    }
    match head.rfind(' ') {
        Some(space) if !head[..space].trim_end().is_empty() => head[..space].trim_end().to_string(),
        _ => head.to_string(),
    }
}

/// Common long words in station names and their short forms.
const STATION_WORDS: [(&str, &str); 9] = [
    ("Street", "St"),
    ("Lane", "Ln"),
    ("Court", "Ct"),
    ("Road", "Rd"),
    ("North", "N"),
    ("South", "S"),
    ("East", "E"),
    ("West", "W"),
    ("Thameslink", "TL"),
];

/// Replace whole words from the station dictionary.
pub fn shorten_station_words(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            STATION_WORDS
                .iter()
                .find(|(long, _)| *long == word)
                .map_or(word, |&(_, short)| short)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fixed-width departure line.
pub fn format_train_string(record: &TrainRecord) -> String {
    format!(
        "{:<dw$} {:>tw$}",
        record.destination.as_str(),
        record.time.as_str(),
        dw = DESTINATION_WIDTH,
        tw = TIME_WIDTH
    )
}

/// One-line message shown in place of departures.
pub fn format_error_msg(fault: &TrainFault) -> String {
    match fault {
        TrainFault::Unavailable => "Error retrieving train data.".to_string(),
        TrainFault::Unauthorized => "Train data access denied.".to_string(),
        TrainFault::NoServices { destination } => {
            format!("No train services to {destination}.")
        }
        TrainFault::Notice { text } => text.to_string(),
    }
}

/// Fit an upstream disruption notice onto one departure line.
///
/// Markup is dropped and whitespace collapsed; long notices are cut at a word
/// boundary within [`LINE_WIDTH`]. Returns `None` when nothing readable is
/// left.
pub fn notice_line(message: &str) -> Option<String> {
    let mut plain = String::with_capacity(message.len());
    let mut in_tag = false;
    for c in message.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(c),
            _ => {}
        }
    }
    let plain = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if plain.is_empty() {
        return None;
    }
    Some(abbreviate_stn_name(&plain, LINE_WIDTH))
}

// ============================================================================
// Train Source Trait
// ============================================================================

/// Departure board provider.
pub trait TrainSource {
    /// Fetch the board once and cache it. Upstream failures are absorbed into
    /// a sentinel; later calls return the cached result.
    fn retrieve_data(&self) -> Departures;

    /// Rows requested by configuration.
    fn number(&self) -> usize;

    /// The cached board truncated to [`number`](TrainSource::number) rows.
    fn fetch_train(&self) -> Departures {
        self.retrieve_data().truncated(self.number())
    }

    /// See [`format_train_string`].
    fn format_train_string(&self, record: &TrainRecord) -> String {
        format_train_string(record)
    }

    /// See [`format_error_msg`].
    fn format_error_msg(&self, fault: &TrainFault) -> String {
        format_error_msg(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // Abbreviation Tests
    // =========================================================================

    #[test]
    fn abbreviate_cuts_at_word_boundary() {
        let short = abbreviate_stn_name("London Euston", 10);
        assert_eq!(short, "London");
        assert!(short.chars().count() <= 10);
    }

    #[test]
    fn abbreviate_short_input_unchanged() {
        assert_eq!(abbreviate_stn_name("Abc", 10), "Abc");
        assert_eq!(abbreviate_stn_name("", 10), "");
    }

    #[test]
    fn abbreviate_boundary_right_at_limit() {
        assert_eq!(abbreviate_stn_name("London Bridge Road", 13), "London Bridge");
    }

    #[test]
    fn abbreviate_hard_truncates_single_word() {
        assert_eq!(abbreviate_stn_name("Llanfairpwllgwyngyll", 8), "Llanfair");
    }

    #[test]
    fn abbreviate_counts_characters_not_bytes() {
        assert_eq!(abbreviate_stn_name("Ynys Môn Holyhead", 8), "Ynys Môn");
    }

    proptest! {
        #[test]
        fn abbreviate_is_bounded_prefix(name in "[A-Za-z ]{0,40}", max in 1usize..20) {
            let out = abbreviate_stn_name(&name, max);
            prop_assert!(out.chars().count() <= max);
            prop_assert!(name.starts_with(&out));
            prop_assert_eq!(abbreviate_stn_name(&out, max), out.clone());
        }
    }

    #[test]
    fn station_words_shortened() {
        assert_eq!(shorten_station_words("Kentish Town West"), "Kentish Town W");
        assert_eq!(
            shorten_station_words("London Fenchurch Street"),
            "London Fenchurch St"
        );
    }

    #[test]
    fn station_words_match_whole_words_only() {
        assert_eq!(shorten_station_words("Westbury"), "Westbury");
        assert_eq!(shorten_station_words("Northampton"), "Northampton");
        assert_eq!(shorten_station_words("Eastleigh"), "Eastleigh");
        assert_eq!(shorten_station_words("West Ealing"), "W Ealing");
    }

    // =========================================================================
    // Record Tests
    // =========================================================================

    #[test]
    fn compose_time_variants() {
        assert_eq!(compose_time("12:30", "On time"), "12:30");
        assert_eq!(compose_time("12:30", ""), "12:30");
        assert_eq!(compose_time("12:30", "12:34"), "12:30 exp 12:34");
        assert_eq!(compose_time("12:30", "Cancelled"), "12:30 cancelled");
        assert_eq!(compose_time("12:30", "Delayed"), "12:30 delayed");
    }

    #[test]
    fn record_from_service_fits_column() {
        let record =
            TrainRecord::from_service("Bedford Midland Road Thameslink", "08:02", "08:05");
        assert_eq!(record.destination.as_str(), "Bedford Midland");
        assert_eq!(record.time.as_str(), "08:02 exp 08:05");
    }

    #[test]
    fn format_train_string_is_fixed_width() {
        let line = format_train_string(&TrainRecord::new("Brighton", "09:15"));
        assert_eq!(line, "Brighton                   09:15");
        assert_eq!(line.chars().count(), DESTINATION_WIDTH + 1 + TIME_WIDTH);

        let long = format_train_string(&TrainRecord::new("Brighton", "09:15 exp 09:21"));
        assert_eq!(long.chars().count(), DESTINATION_WIDTH + 1 + TIME_WIDTH);
    }

    // =========================================================================
    // Departures Tests
    // =========================================================================

    #[test]
    fn empty_board_becomes_no_services() {
        let departures = Departures::from_records(Vec::new(), "London Bridge");
        assert!(departures.is_empty());
        assert_eq!(departures.lines(), ["No train services to London Bridge."]);
    }

    #[test]
    fn truncation_keeps_order() {
        let records: Vec<_> = (0..5)
            .map(|i| TrainRecord::new("Brighton", &format!("10:0{i}")))
            .collect();
        let departures = Departures::from_records(records.clone(), "Brighton").truncated(3);
        assert_eq!(departures.records, records[..3]);
        assert!(departures.sentinel.is_none());
    }

    #[test]
    fn fault_classification() {
        let auth = Error::upstream("open_live", UpstreamKind::Unauthorized);
        assert_eq!(TrainFault::from_error(&auth), TrainFault::Unauthorized);
        let down = Error::upstream("open_live", UpstreamKind::Status(503));
        assert_eq!(TrainFault::from_error(&down), TrainFault::Unavailable);
        assert_eq!(
            format_error_msg(&TrainFault::Unavailable),
            "Error retrieving train data."
        );
    }

    // =========================================================================
    // Notice Tests
    // =========================================================================

    #[test]
    fn notice_fits_one_line() {
        let line = notice_line(
            "Disruption between Gospel Oak and Barking due to a broken down train.",
        )
        .unwrap();
        assert_eq!(line, "Disruption between Gospel Oak");
        assert!(line.chars().count() <= LINE_WIDTH);
    }

    #[test]
    fn notice_drops_markup() {
        let line = notice_line("<P>Lines <A href=\"http://nre.co.uk\">closed</A></P>").unwrap();
        assert_eq!(line, "Lines closed");
        assert_eq!(notice_line("  <br/> "), None);
    }

    #[test]
    fn notice_is_the_error_line() {
        let departures = Departures::failed(TrainFault::Notice {
            text: bounded("Engineering works."),
        });
        assert_eq!(departures.lines(), ["Engineering works."]);
    }
}
