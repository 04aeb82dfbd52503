//! Field metadata types and the metadata request scopes

use crate::error::Error;
use serde::Serialize;

/// Raw table-metadata record as returned by the transport.
#[derive(Debug, Clone, Default)]
pub struct TableField {
    /// Field identifier the table keys its entries by.
    pub name: String,
    pub system_name: Option<String>,
    pub long_name: Option<String>,
    pub data_type: Option<String>,
    /// Non-empty when the field's values come from a server-side lookup.
    pub lookup_name: Option<String>,
}

/// Resolved field metadata, optionally enriched with lookup values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMetadata {
    #[serde(rename = "SystemName", skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(rename = "LongName", skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(rename = "DataType", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(rename = "Values", skip_serializing_if = "Option::is_none")]
    pub lookup_values: Option<Vec<String>>,
}

/// The metadata families the server can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataScope {
    System,
    Resources,
    Classes,
    Table,
}

impl MetadataScope {
    pub const ALL: [MetadataScope; 4] = [
        MetadataScope::System,
        MetadataScope::Resources,
        MetadataScope::Classes,
        MetadataScope::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataScope::System => "system",
            MetadataScope::Resources => "resources",
            MetadataScope::Classes => "classes",
            MetadataScope::Table => "table",
        }
    }
}

impl std::fmt::Display for MetadataScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetadataScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MetadataScope::System),
            "resources" => Ok(MetadataScope::Resources),
            "classes" => Ok(MetadataScope::Classes),
            "table" => Ok(MetadataScope::Table),
            other => Err(Error::Configuration(format!(
                "invalid metadata type '{}', must be one of: system, resources, classes, table",
                other
            ))),
        }
    }
}
