//! Binary sink for media payloads

use crate::output::{OutputSink, Payload};
use md5::{Digest, Md5};
use retsq_shared::error::{Error, Result};
use retsq_shared::{MediaObject, OutputDestination};
use std::path::PathBuf;
use tracing::{info, warn};

/// Writes fetched media payloads to
/// `media/{mls}/{content_id}/{md5(binary)}.{subtype}`, creating parent
/// directories as needed. Objects without a binary payload (by-location
/// responses) are skipped with a warning.
pub struct BinarySink {
    destination: Option<OutputDestination>,
    root: PathBuf,
}

impl BinarySink {
    pub fn new() -> Self {
        Self {
            destination: None,
            root: PathBuf::from("."),
        }
    }

    /// Write under `root` instead of the working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            destination: None,
            root: root.into(),
        }
    }

    fn write_object(&self, mls_key: &str, object: &MediaObject) -> Result<()> {
        let Some(binary) = &object.binary else {
            warn!(
                "media object {}:{} has no binary payload, skipping",
                object.content_id, object.object_id
            );
            return Ok(());
        };
        let digest = hex::encode(Md5::digest(binary));
        let dir = self
            .root
            .join("media")
            .join(mls_key)
            .join(&object.content_id);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.{}", digest, object.content_subtype()));
        info!("writing media object to {}", path.display());
        std::fs::write(&path, binary)?;
        Ok(())
    }
}

impl Default for BinarySink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for BinarySink {
    fn bind(&mut self, destination: OutputDestination) -> Result<()> {
        if self.destination.is_some() {
            return Err(Error::SinkAlreadyBound("binary"));
        }
        self.destination = Some(destination);
        Ok(())
    }

    fn write(&mut self, payload: Payload<'_>) -> Result<()> {
        let destination = self
            .destination
            .as_ref()
            .ok_or(Error::SinkNotBound("binary"))?;
        match payload {
            Payload::Media(objects) => {
                for object in objects {
                    self.write_object(&destination.mls_key, object)?;
                }
                Ok(())
            }
            other => Err(Error::UnsupportedPayload {
                sink: "binary",
                payload: other.kind(),
            }),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.destination.is_none() {
            return Err(Error::SinkNotBound("binary"));
        }
        Ok(())
    }
}
