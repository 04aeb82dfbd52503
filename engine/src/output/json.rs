//! JSON sink for listing rows and metadata documents

use crate::output::{OutputSink, Payload};
use retsq_shared::error::{Error, Result};
use retsq_shared::utils::time::system_time_secs;
use retsq_shared::{OutputDestination, Row, SearchBatch};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Writes listing batches or metadata documents to
/// `{mls}_{resource}_{disambiguator}_{ts}.json`.
///
/// Listing rows are filtered through the header captured from the first
/// batch's first row; fields outside the header are omitted. The document
/// body is assembled in memory and serialized once in `complete`.
pub struct JsonSink {
    destination: Option<OutputDestination>,
    directory: PathBuf,
    file: Option<File>,
    header: Option<Vec<String>>,
    rows: Vec<serde_json::Value>,
    documents: Vec<serde_json::Value>,
}

impl JsonSink {
    pub fn new() -> Self {
        Self {
            destination: None,
            directory: PathBuf::from("."),
            file: None,
            header: None,
            rows: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Write into `directory` instead of the working directory.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::new()
        }
    }

    fn ensure_file(&mut self) -> Result<()> {
        if self.file.is_none() {
            let destination = self
                .destination
                .as_ref()
                .ok_or(Error::SinkNotBound("json"))?;
            let path = self
                .directory
                .join(destination.file_name("json", system_time_secs()));
            info!("writing results to {}", path.display());
            self.file = Some(File::create(&path)?);
        }
        Ok(())
    }

    fn buffer_batch(&mut self, batch: &SearchBatch) -> Result<()> {
        if batch.rows.is_empty() {
            return Ok(());
        }
        self.ensure_file()?;
        if self.header.is_none() {
            self.header = Some(batch.rows[0].names());
        }
        let header = self.header.as_ref().expect("header captured above");
        for row in &batch.rows {
            self.rows.push(row_to_object(row, header));
        }
        Ok(())
    }

    fn body(&mut self) -> Option<serde_json::Value> {
        if !self.rows.is_empty() {
            return Some(serde_json::Value::Array(std::mem::take(&mut self.rows)));
        }
        match self.documents.len() {
            0 => None,
            1 => Some(self.documents.remove(0)),
            _ => Some(serde_json::Value::Array(std::mem::take(&mut self.documents))),
        }
    }
}

/// Row as a JSON object with only the fields named by the header.
pub(crate) fn row_to_object(row: &Row, header: &[String]) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for name in header {
        if let Some(value) = row.get(name) {
            object.insert(name.clone(), serde_json::Value::String(value.to_string()));
        }
    }
    serde_json::Value::Object(object)
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for JsonSink {
    fn bind(&mut self, destination: OutputDestination) -> Result<()> {
        if self.destination.is_some() {
            return Err(Error::SinkAlreadyBound("json"));
        }
        self.destination = Some(destination);
        Ok(())
    }

    fn write(&mut self, payload: Payload<'_>) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("json"));
        }
        match payload {
            Payload::Listings(batch) => self.buffer_batch(batch),
            Payload::Metadata(value) => {
                self.ensure_file()?;
                self.documents.push(value.clone());
                Ok(())
            }
            other => Err(Error::UnsupportedPayload {
                sink: "json",
                payload: other.kind(),
            }),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("json"));
        }
        let body = self.body();
        if let (Some(mut file), Some(body)) = (self.file.take(), body) {
            let text = serde_json::to_string_pretty(&body)?;
            file.write_all(text.as_bytes())?;
            file.flush()?;
        }
        Ok(())
    }
}
