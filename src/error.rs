//! Error taxonomy shared by every backend family.
//!
//! Configuration, backend, condition and range errors abort a render before
//! anything is drawn. Upstream errors from a train source never reach this
//! type's callers (the provider turns them into a sentinel), while upstream
//! errors from a weather source propagate unchanged.
//!
//! No variant carries a token. Provider code only ever puts field names,
//! status codes and sanitized transport messages in here.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Every failure the core can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A canonical field is missing or invalid.
    #[error("configuration error in `{field}`: {reason}")]
    Configuration {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The requested display backend cannot run in this environment.
    #[error("display backend `{backend}` is unavailable: {reason}")]
    UnavailableBackend {
        /// Backend tag.
        backend: &'static str,
        /// Why the probe failed.
        reason: String,
    },

    /// A weather condition code outside the icon table.
    #[error("unrecognized weather condition code {code}")]
    UnrecognizedCondition {
        /// Raw upstream condition code.
        code: u16,
    },

    /// A forecast day or record index beyond what the provider offers.
    #[error("{what} {requested} is out of range (limit {limit})")]
    OutOfRange {
        /// What was being indexed.
        what: &'static str,
        /// Requested index.
        requested: usize,
        /// Largest valid index.
        limit: usize,
    },

    /// The upstream service failed or returned something unusable.
    #[error("{provider} upstream failure: {kind}")]
    Upstream {
        /// Provider tag.
        provider: &'static str,
        /// Failure classification.
        kind: UpstreamKind,
    },

    /// An accessor was used before `retrieve_data`.
    #[error("{provider} data has not been retrieved yet")]
    NotRetrieved {
        /// Provider tag.
        provider: &'static str,
    },

    /// The drawing surface could not be flushed.
    #[error("{backend} render failed: {reason}")]
    Render {
        /// Backend tag.
        backend: &'static str,
        /// Failure detail.
        reason: String,
    },
}

/// Classification of upstream failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service rejected our credentials.
    #[error("credentials rejected")]
    Unauthorized,
    /// Any other non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The payload could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for an upstream error.
    pub fn upstream(provider: &'static str, kind: UpstreamKind) -> Self {
        Error::Upstream { provider, kind }
    }

    /// Shorthand for a malformed upstream payload.
    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        Error::Upstream {
            provider,
            kind: UpstreamKind::Malformed(detail.into()),
        }
    }

    /// True for errors coming from the network side.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_field() {
        let err = Error::config("number", "must be a positive integer");
        assert_eq!(
            err.to_string(),
            "configuration error in `number`: must be a positive integer"
        );
    }

    #[test]
    fn out_of_range_message() {
        let err = Error::OutOfRange {
            what: "forecast day",
            requested: 9,
            limit: 7,
        };
        assert_eq!(err.to_string(), "forecast day 9 is out of range (limit 7)");
    }

    #[test]
    fn upstream_classification() {
        let err = Error::upstream("huxley2", UpstreamKind::Status(503));
        assert!(err.is_upstream());
        assert!(err.to_string().contains("503"));
        assert!(!Error::NotRetrieved { provider: "owm" }.is_upstream());
    }
}
