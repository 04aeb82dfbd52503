//! Query targets and output destinations

use crate::types::metadata::MetadataScope;

/// The resource and class list one command invocation runs against.
///
/// Resolved once from CLI overrides or a configuration alias, read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceClassTarget {
    pub resource: String,
    pub classes: Vec<String>,
}

impl ResourceClassTarget {
    pub fn new(resource: impl Into<String>, classes: Vec<String>) -> Self {
        Self {
            resource: resource.into(),
            classes,
        }
    }

    /// A target for a single explicitly-overridden class.
    pub fn single(resource: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            classes: vec![class.into()],
        }
    }
}

/// Identity a sink is bound to; determines the output file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDestination {
    pub mls_key: String,
    pub resource: String,
    pub class: String,
    /// Set for metadata output; changes the file-name disambiguator.
    pub scope: Option<MetadataScope>,
}

impl OutputDestination {
    pub fn listing(
        mls_key: impl Into<String>,
        resource: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            mls_key: mls_key.into(),
            resource: resource.into(),
            class: class.into(),
            scope: None,
        }
    }

    pub fn metadata(
        mls_key: impl Into<String>,
        resource: impl Into<String>,
        class: impl Into<String>,
        scope: MetadataScope,
    ) -> Self {
        Self {
            mls_key: mls_key.into(),
            resource: resource.into(),
            class: class.into(),
            scope: Some(scope),
        }
    }

    /// File name `{mls}_{resource}_{disambiguator}_{unix_ts}.{ext}`.
    ///
    /// Listing output disambiguates by class; metadata output by scope:
    /// `system` -> `all`, `resources`/`classes` -> the resource name,
    /// `table` -> `{resource}_{class}`.
    pub fn file_name(&self, extension: &str, unix_ts: u64) -> String {
        let disambiguator = match self.scope {
            None => self.class.clone(),
            Some(MetadataScope::System) => "all".to_string(),
            Some(MetadataScope::Resources) | Some(MetadataScope::Classes) => {
                self.resource.clone()
            }
            Some(MetadataScope::Table) => format!("{}_{}", self.resource, self.class),
        };
        format!(
            "{}_{}_{}_{}.{}",
            self.mls_key, self.resource, disambiguator, unix_ts, extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_file_name_uses_class() {
        let dest = OutputDestination::listing("mymls", "Property", "Residential");
        assert_eq!(
            dest.file_name("csv", 1700000000),
            "mymls_Property_Residential_1700000000.csv"
        );
    }

    #[test]
    fn test_metadata_file_name_disambiguators() {
        let cases = [
            (MetadataScope::System, "mymls_Property_all_1.json"),
            (MetadataScope::Resources, "mymls_Property_Property_1.json"),
            (MetadataScope::Classes, "mymls_Property_Property_1.json"),
            (MetadataScope::Table, "mymls_Property_Property_Residential_1.json"),
        ];
        for (scope, expected) in cases {
            let dest = OutputDestination::metadata("mymls", "Property", "Residential", scope);
            assert_eq!(dest.file_name("json", 1), expected);
        }
    }
}
