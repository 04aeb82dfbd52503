//! Stream sink: debug output on stdout, the absent-strategy fallback

use crate::output::{OutputSink, Payload};
use retsq_shared::error::{Error, Result};
use retsq_shared::OutputDestination;
use std::io::Write;

/// Writes payloads in a literal debug representation to stdout (or an
/// injected writer). Never touches the filesystem.
pub struct StreamSink {
    destination: Option<OutputDestination>,
    writer: Option<Box<dyn Write>>,
}

impl StreamSink {
    pub fn new() -> Self {
        Self {
            destination: None,
            writer: None,
        }
    }

    /// Redirect output, for tests.
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            destination: None,
            writer: Some(writer),
        }
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        match &mut self.writer {
            Some(writer) => {
                writeln!(writer, "{}", text)?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                writeln!(lock, "{}", text)?;
            }
        }
        Ok(())
    }
}

impl Default for StreamSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for StreamSink {
    fn bind(&mut self, destination: OutputDestination) -> Result<()> {
        if self.destination.is_some() {
            return Err(Error::SinkAlreadyBound("stream"));
        }
        self.destination = Some(destination);
        Ok(())
    }

    fn write(&mut self, payload: Payload<'_>) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("stream"));
        }
        let text = match payload {
            Payload::Listings(batch) => format!("{:#?}", batch.rows),
            Payload::Metadata(value) => serde_json::to_string_pretty(value)?,
            Payload::Media(objects) => format!("{:#?}", objects),
        };
        self.emit(&text)
    }

    fn complete(&mut self) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("stream"));
        }
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retsq_shared::{Row, SearchBatch};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn destination() -> OutputDestination {
        OutputDestination::listing("mls", "Property", "Residential")
    }

    #[test]
    fn test_bind_twice_fails() {
        let mut sink = StreamSink::new();
        sink.bind(destination()).unwrap();
        assert!(matches!(
            sink.bind(destination()),
            Err(Error::SinkAlreadyBound("stream"))
        ));
    }

    #[test]
    fn test_write_before_bind_fails() {
        let buf = SharedBuf::default();
        let mut sink = StreamSink::with_writer(Box::new(buf));
        let batch = SearchBatch::new(Vec::new(), None);
        assert!(matches!(
            sink.write(Payload::Listings(&batch)),
            Err(Error::SinkNotBound("stream"))
        ));
    }

    #[test]
    fn test_writes_debug_rows() {
        let buf = SharedBuf::default();
        let mut sink = StreamSink::with_writer(Box::new(buf.clone()));
        sink.bind(destination()).unwrap();

        let batch = SearchBatch::new(
            vec![Row::from_pairs(vec![(
                "ListingID".to_string(),
                "L1".to_string(),
            )])],
            Some(1),
        );
        sink.write(Payload::Listings(&batch)).unwrap();
        sink.complete().unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("ListingID"));
        assert!(text.contains("L1"));
    }
}
