//! Table-metadata resolution and deterministic sorting

use retsq_client::Session;
use retsq_shared::error::Result;
use retsq_shared::FieldMetadata;
use std::collections::BTreeMap;

/// Resolve a resource/class field table, enriching lookup-backed fields.
///
/// Copies system name, long name, and data type when present. Each field
/// declaring a non-empty lookup name costs one extra round trip for its
/// long values. The result is keyed by field name; BTreeMap ordering plus
/// sorted lookup values make the output independent of server response
/// order.
pub async fn resolve_table(
    session: &mut Session,
    resource: &str,
    class: &str,
) -> Result<BTreeMap<String, FieldMetadata>> {
    let table = session.table_metadata(resource, class).await?;

    let mut resolved = BTreeMap::new();
    for field in table {
        let mut metadata = FieldMetadata {
            system_name: field.system_name.clone(),
            long_name: field.long_name.clone(),
            data_type: field.data_type.clone(),
            lookup_values: None,
        };
        if let Some(lookup_name) = field.lookup_name.as_deref().filter(|n| !n.is_empty()) {
            let mut values = session.lookup_values(resource, lookup_name).await?;
            values.sort();
            metadata.lookup_values = Some(values);
        }
        resolved.insert(field.name, metadata);
    }
    Ok(resolved)
}

/// Recursively sort a JSON value: object keys in key order, array elements
/// in natural order, at every nesting level.
///
/// Applied to raw metadata payloads before output so two runs over
/// differently-ordered server responses produce identical files.
pub fn sort_deep(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, nested)| (key, sort_deep(nested)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().map(sort_deep).collect();
            items.sort_by_key(|item| item.to_string());
            Value::Array(items)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use retsq_client::RetsTransport;
    use retsq_shared::error::Error;
    use retsq_shared::{MediaObject, QueryExtras, SearchBatch, TableField};
    use serde_json::json;

    /// Serves a fixed field table and per-lookup value lists.
    struct MetadataTransport {
        fields: Vec<TableField>,
        lookups: Vec<(String, Vec<String>)>,
    }

    fn field(name: &str, lookup: Option<&str>) -> TableField {
        TableField {
            name: name.to_string(),
            system_name: Some(name.to_string()),
            long_name: Some(format!("{} Long", name)),
            data_type: Some("Character".to_string()),
            lookup_name: lookup.map(|l| l.to_string()),
        }
    }

    #[async_trait]
    impl RetsTransport for MetadataTransport {
        async fn login(&mut self) -> Result<()> {
            Ok(())
        }

        async fn search(
            &mut self,
            _resource: &str,
            _class: &str,
            _query: &str,
            _extras: &QueryExtras,
        ) -> Result<SearchBatch> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_object(
            &mut self,
            _resource: &str,
            _field: &str,
            _record_id: &str,
            _object_ids: &str,
            _by_location: bool,
        ) -> Result<Vec<MediaObject>> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_table_metadata(
            &mut self,
            _resource: &str,
            _class: &str,
        ) -> Result<Vec<TableField>> {
            Ok(self.fields.clone())
        }

        async fn get_lookup_values(
            &mut self,
            _resource: &str,
            lookup_name: &str,
        ) -> Result<Vec<String>> {
            self.lookups
                .iter()
                .find(|(name, _)| name == lookup_name)
                .map(|(_, values)| values.clone())
                .ok_or_else(|| Error::Protocol(format!("unknown lookup {}", lookup_name)))
        }

        async fn get_system_metadata(&mut self) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_resources_metadata(&mut self, _resource: &str) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn get_classes_metadata(&mut self, _resource: &str) -> Result<serde_json::Value> {
            Err(Error::Protocol("not scripted".into()))
        }

        async fn logout(&mut self) -> Result<()> {
            Ok(())
        }
    }

    async fn resolve(
        fields: Vec<TableField>,
        lookups: Vec<(String, Vec<String>)>,
    ) -> BTreeMap<String, FieldMetadata> {
        let mut session = Session::new(Box::new(MetadataTransport { fields, lookups }));
        session.login().await.unwrap();
        resolve_table(&mut session, "Property", "Residential")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_fields_are_enriched() {
        let resolved = resolve(
            vec![field("Status", Some("STATUS")), field("City", None)],
            vec![(
                "STATUS".to_string(),
                vec!["Active".to_string(), "Sold".to_string()],
            )],
        )
        .await;

        let status = &resolved["Status"];
        assert_eq!(
            status.lookup_values.as_deref(),
            Some(&["Active".to_string(), "Sold".to_string()][..])
        );
        assert!(resolved["City"].lookup_values.is_none());
    }

    #[tokio::test]
    async fn test_empty_lookup_name_is_not_queried() {
        // An empty lookup name would error in the mock; it must be skipped.
        let mut status = field("Status", None);
        status.lookup_name = Some(String::new());
        let resolved = resolve(vec![status], Vec::new()).await;
        assert!(resolved["Status"].lookup_values.is_none());
    }

    #[tokio::test]
    async fn test_resolution_is_order_independent() {
        let forward = resolve(
            vec![field("A", Some("LA")), field("B", Some("LB"))],
            vec![
                ("LA".to_string(), vec!["x".to_string(), "a".to_string()]),
                ("LB".to_string(), vec!["2".to_string(), "1".to_string()]),
            ],
        )
        .await;
        let reversed = resolve(
            vec![field("B", Some("LB")), field("A", Some("LA"))],
            vec![
                ("LB".to_string(), vec!["1".to_string(), "2".to_string()]),
                ("LA".to_string(), vec!["a".to_string(), "x".to_string()]),
            ],
        )
        .await;
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_sort_deep_orders_keys_and_lists_recursively() {
        let messy = json!({
            "b": [{"z": 1, "a": 2}, {"a": 1}],
            "a": ["c", "a", "b"],
        });
        let tidy = json!({
            "a": ["a", "b", "c"],
            "b": [{"a": 1}, {"a": 2, "z": 1}],
        });
        assert_eq!(sort_deep(messy), tidy);
    }

    #[test]
    fn test_sort_deep_is_deterministic_across_orderings() {
        let one = json!({"k": [3, 1, 2], "m": {"b": 1, "a": 2}});
        let two = json!({"m": {"a": 2, "b": 1}, "k": [2, 3, 1]});
        assert_eq!(sort_deep(one), sort_deep(two));
    }
}
