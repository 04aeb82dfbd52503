//! Media objects returned by object queries

/// One media object (photo, document, ...) attached to a record.
///
/// `location` is populated only for by-location requests; `binary` only
/// when the payload itself was fetched.
#[derive(Clone, Default)]
pub struct MediaObject {
    pub content_id: String,
    pub content_description: Option<String>,
    pub content_type: String,
    pub object_id: String,
    pub location: Option<String>,
    pub binary: Option<Vec<u8>>,
}

impl MediaObject {
    /// Subtype of the content type, used as a file extension
    /// (`image/jpeg` -> `jpeg`).
    pub fn content_subtype(&self) -> &str {
        self.content_type
            .split('/')
            .nth(1)
            .filter(|s| !s.is_empty())
            .unwrap_or("bin")
    }
}

// Hand-written so dumps show the payload size instead of the raw bytes.
impl std::fmt::Debug for MediaObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaObject")
            .field("content_id", &self.content_id)
            .field("content_description", &self.content_description)
            .field("content_type", &self.content_type)
            .field("object_id", &self.object_id)
            .field("location", &self.location)
            .field("binary", &self.binary.as_ref().map(|b| b.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_subtype() {
        let object = MediaObject {
            content_type: "image/jpeg".to_string(),
            ..Default::default()
        };
        assert_eq!(object.content_subtype(), "jpeg");
    }

    #[test]
    fn test_content_subtype_fallback() {
        let object = MediaObject {
            content_type: "application".to_string(),
            ..Default::default()
        };
        assert_eq!(object.content_subtype(), "bin");
    }

    #[test]
    fn test_debug_hides_binary_bytes() {
        let object = MediaObject {
            content_id: "123".to_string(),
            content_type: "image/png".to_string(),
            binary: Some(vec![0u8; 2048]),
            ..Default::default()
        };
        let dump = format!("{:?}", object);
        assert!(dump.contains("2048"));
        assert!(!dump.contains("0, 0, 0"));
    }
}
