//! YAML sink for listing rows and metadata documents

use crate::output::json::row_to_object;
use crate::output::{OutputSink, Payload};
use retsq_shared::error::{Error, Result};
use retsq_shared::utils::time::system_time_secs;
use retsq_shared::OutputDestination;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// YAML twin of the JSON sink: same header-once row filtering, same
/// buffer-then-serialize-on-complete lifecycle.
pub struct YamlSink {
    destination: Option<OutputDestination>,
    directory: PathBuf,
    file: Option<File>,
    header: Option<Vec<String>>,
    rows: Vec<serde_json::Value>,
    documents: Vec<serde_json::Value>,
}

impl YamlSink {
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
                .ok_or(Error::SinkNotBound("yaml"))?;
            let path = self
                .directory
                .join(destination.file_name("yaml", system_time_secs()));
            info!("writing results to {}", path.display());
            self.file = Some(File::create(&path)?);
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

impl Default for YamlSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for YamlSink {
    fn bind(&mut self, destination: OutputDestination) -> Result<()> {
        if self.destination.is_some() {
            return Err(Error::SinkAlreadyBound("yaml"));
        }
        self.destination = Some(destination);
        Ok(())
    }

    fn write(&mut self, payload: Payload<'_>) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("yaml"));
        }
        match payload {
            Payload::Listings(batch) => {
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
            Payload::Metadata(value) => {
                self.ensure_file()?;
                self.documents.push(value.clone());
                Ok(())
            }
            other => Err(Error::UnsupportedPayload {
                sink: "yaml",
                payload: other.kind(),
            }),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("yaml"));
        }
        let body = self.body();
        if let (Some(mut file), Some(body)) = (self.file.take(), body) {
            let text =
                serde_yaml::to_string(&body).map_err(|e| Error::Serialize(e.to_string()))?;
            file.write_all(text.as_bytes())?;
            file.flush()?;
        }
        Ok(())
    }
}
