//! Output sinks
//!
//! One capability interface over a closed set of strategies:
//!
//! - **stream** — debug representation on stdout, the fallback when no
//!   format is selected; never writes to disk
//! - **csv** — listing rows as a CSV file
//! - **json** / **yaml** — listing rows or metadata payloads
//! - **binary** — media payloads as files under `media/`
//!
//! Every sink is bound to exactly one [`OutputDestination`] for its
//! lifetime, opens its file on first write, captures tabular headers from
//! the first batch only, and releases its resources in `complete`.

pub mod binary;
pub mod csv;
pub mod json;
pub mod stream;
pub mod yaml;

use retsq_shared::error::{Error, Result};
use retsq_shared::{MediaObject, OutputDestination, SearchBatch};

pub use binary::BinarySink;
pub use csv::CsvSink;
pub use json::JsonSink;
pub use stream::StreamSink;
pub use yaml::YamlSink;

/// File output formats selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(Error::Configuration(format!(
                "invalid output format '{}', must be one of: csv, json, yaml",
                other
            ))),
        }
    }
}

/// What a sink is asked to persist.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// A page of listing rows.
    Listings(&'a SearchBatch),
    /// A (deep-sorted) metadata document.
    Metadata(&'a serde_json::Value),
    /// Media objects from an object query.
    Media(&'a [MediaObject]),
}

impl Payload<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Payload::Listings(_) => "listings",
            Payload::Metadata(_) => "metadata",
            Payload::Media(_) => "media",
        }
    }
}

/// Common sink lifecycle: bind once, write any number of times, complete
/// exactly once on every exit path.
pub trait OutputSink {
    /// Attach the sink to its destination. Calling twice is a programming
    /// error.
    fn bind(&mut self, destination: OutputDestination) -> Result<()>;

    /// Append one payload.
    fn write(&mut self, payload: Payload<'_>) -> Result<()>;

    /// Flush and release the underlying resource.
    fn complete(&mut self) -> Result<()>;
}

/// Sink for an explicitly selected format.
pub fn for_format(format: OutputFormat) -> Box<dyn OutputSink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new()),
        OutputFormat::Json => Box::new(JsonSink::new()),
        OutputFormat::Yaml => Box::new(YamlSink::new()),
    }
}
