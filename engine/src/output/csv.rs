//! CSV sink for listing rows

use crate::output::{OutputSink, Payload};
use retsq_shared::error::{Error, Result};
use retsq_shared::utils::time::system_time_secs;
use retsq_shared::{OutputDestination, SearchBatch};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

/// Writes listing batches to `{mls}_{resource}_{class}_{ts}.csv`.
///
/// The file opens on the first row written; the header comes from the
/// first batch's first row and is never re-derived, so fields that only
/// appear in later rows are written as empty cells rather than new
/// columns.
pub struct CsvSink {
    destination: Option<OutputDestination>,
    directory: PathBuf,
    writer: Option<csv::Writer<File>>,
    header: Option<Vec<String>>,
}

impl CsvSink {
    pub fn new() -> Self {
        Self {
            destination: None,
            directory: PathBuf::from("."),
            writer: None,
            header: None,
        }
    }

    /// Write into `directory` instead of the working directory.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::new()
        }
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>> {
        if self.writer.is_none() {
            let destination = self
                .destination
                .as_ref()
                .ok_or(Error::SinkNotBound("csv"))?;
            let path = self
                .directory
                .join(destination.file_name("csv", system_time_secs()));
            info!("writing listings to {}", path.display());
            self.writer = Some(csv::Writer::from_writer(File::create(&path)?));
        }
        Ok(self.writer.as_mut().expect("writer just created"))
    }

    fn write_batch(&mut self, batch: &SearchBatch) -> Result<()> {
        if batch.rows.is_empty() {
            return Ok(());
        }

        if self.header.is_none() {
            let header = batch.rows[0].names();
            self.writer()?
                .write_record(&header)
                .map_err(csv_err)?;
            self.header = Some(header);
        }

        let header = self.header.clone().expect("header captured above");
        let writer = self.writer()?;
        for row in &batch.rows {
            let record: Vec<&str> = header
                .iter()
                .map(|name| row.get(name).unwrap_or(""))
                .collect();
            writer.write_record(&record).map_err(csv_err)?;
        }
        Ok(())
    }
}

impl Default for CsvSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for CsvSink {
    fn bind(&mut self, destination: OutputDestination) -> Result<()> {
        if self.destination.is_some() {
            return Err(Error::SinkAlreadyBound("csv"));
        }
        self.destination = Some(destination);
        Ok(())
    }

    fn write(&mut self, payload: Payload<'_>) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("csv"));
        }
        match payload {
            Payload::Listings(batch) => self.write_batch(batch),
            other => Err(Error::UnsupportedPayload {
                sink: "csv",
                payload: other.kind(),
            }),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("csv"));
        }
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

fn csv_err(err: csv::Error) -> Error {
    Error::Serialize(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retsq_shared::Row;
    use tempfile::tempdir;

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn written_file(dir: &std::path::Path) -> String {
        let entry = std::fs::read_dir(dir)
            .unwrap()
            .next()
            .expect("one file written")
            .unwrap();
        std::fs::read_to_string(entry.path()).unwrap()
    }

    #[test]
    fn test_header_comes_from_first_batch_only() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::with_directory(dir.path());
        sink.bind(OutputDestination::listing("mls", "Property", "Res"))
            .unwrap();

        let first = SearchBatch::new(
            vec![row(&[("ListingID", "L1"), ("City", "Springfield")])],
            Some(2),
        );
        // The second batch has an extra field and is missing one.
        let second = SearchBatch::new(
            vec![row(&[("ListingID", "L2"), ("Pool", "Y")])],
            Some(2),
        );
        sink.write(Payload::Listings(&first)).unwrap();
        sink.write(Payload::Listings(&second)).unwrap();
        sink.complete().unwrap();

        let content = written_file(dir.path());
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("ListingID,City"));
        assert_eq!(lines.next(), Some("L1,Springfield"));
        // Pool is dropped, City written empty.
        assert_eq!(lines.next(), Some("L2,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_no_file_until_first_row() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::with_directory(dir.path());
        sink.bind(OutputDestination::listing("mls", "Property", "Res"))
            .unwrap();

        let empty = SearchBatch::new(Vec::new(), Some(0));
        sink.write(Payload::Listings(&empty)).unwrap();
        sink.complete().unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_lifecycle_misuse() {
        let mut sink = CsvSink::new();
        let batch = SearchBatch::new(Vec::new(), None);
        assert!(matches!(
            sink.write(Payload::Listings(&batch)),
            Err(Error::SinkNotBound("csv"))
        ));
        assert!(matches!(sink.complete(), Err(Error::SinkNotBound("csv"))));

        sink.bind(OutputDestination::listing("a", "b", "c")).unwrap();
        assert!(matches!(
            sink.bind(OutputDestination::listing("a", "b", "c")),
            Err(Error::SinkAlreadyBound("csv"))
        ));
    }

    #[test]
    fn test_metadata_payload_rejected() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::with_directory(dir.path());
        sink.bind(OutputDestination::listing("a", "b", "c")).unwrap();
        let value = serde_json::json!({});
        assert!(matches!(
            sink.write(Payload::Metadata(&value)),
            Err(Error::UnsupportedPayload { sink: "csv", .. })
        ));
    }
}
