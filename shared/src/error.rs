//! Error taxonomy for the retsq crates

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by the session client, the query engine, and the output
/// sinks.
#[derive(Error, Debug)]
pub enum Error {
    /// Login failed on both the initial attempt and the single retry.
    /// Fatal for the whole command.
    #[error("authentication failed after retry: {0}")]
    Authentication(String),

    /// Malformed or unexpected server response, or a call issued while the
    /// session is not logged in. Fatal for the current resource/class;
    /// sibling classes may still be attempted.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server rejected the query string.
    #[error("server rejected query '{query}': {message}")]
    Query { query: String, message: String },

    /// Bucket generation was asked for an empty or inverted range.
    #[error("invalid range: start {start} is not before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Missing key, alias, or required field in the configuration file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A sink was bound to a destination twice. Programming error.
    #[error("{0} sink is already bound to a destination")]
    SinkAlreadyBound(&'static str),

    /// A sink was written to or completed before being bound. Programming
    /// error.
    #[error("{0} sink has not been bound to a destination")]
    SinkNotBound(&'static str),

    /// A sink received a payload kind it cannot persist. Programming error.
    #[error("{sink} sink cannot write a {payload} payload")]
    UnsupportedPayload {
        sink: &'static str,
        payload: &'static str,
    },

    /// Transport-level failure: connection, HTTP status, body decoding.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failure encoding results for an output sink.
    #[error("serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
