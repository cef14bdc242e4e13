//! Error types for the quote refresh pipeline.
//!
//! One `FetchError` enum covers every failure the pipeline produces, from a
//! single relay attempt up to a whole-batch exhaustion, so callers match on
//! a single type when deciding what to swallow and what to surface.

use thiserror::Error;

/// Crate-wide `Result` alias with `FetchError` as the default error.
pub type Result<T, E = FetchError> = std::result::Result<T, E>;

/// Unified error type for relay fetching and quote normalization.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request never produced a response: connect failure, DNS, or a
    /// per-attempt timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The relay answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The response body could not be decoded into a JSON object.
    #[error("parse error: {0}")]
    Parse(String),

    /// Every relay attempt for one target URL failed; carries the last
    /// observed attempt error.
    #[error("all relays failed (last: {0})")]
    AllRelaysFailed(Box<FetchError>),

    /// The provider answered, but the payload holds no usable price.
    #[error("no usable quote data for '{0}'")]
    NoData(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_relays_failed_carries_last_error() {
        let last = FetchError::HttpStatus(502);
        let err = FetchError::AllRelaysFailed(Box::new(last));
        assert_eq!(err.to_string(), "all relays failed (last: HTTP status 502)");
    }

    #[test]
    fn json_errors_map_to_parse() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}
