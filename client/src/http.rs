//! Thin HTTP adapter implementing [`RetsTransport`]
//!
//! Speaks only the narrow request/response subset the engine consumes:
//! the login capability table, COMPACT columns/data/count bodies for
//! search and metadata, and single- or multipart object responses. The
//! parsing helpers are pure functions so they can be tested offline.

use crate::profile::SessionProfile;
use crate::transport::RetsTransport;
use async_trait::async_trait;
use retsq_shared::error::{Error, Result};
use retsq_shared::{MediaObject, QueryExtras, Row, SearchBatch, TableField};
use std::collections::HashMap;
use tracing::debug;

/// Reply code servers send for "no records found".
const REPLY_NO_RECORDS: i64 = 20201;

pub struct HttpTransport {
    profile: SessionProfile,
    http: reqwest::Client,
    capabilities: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new(profile: SessionProfile) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(agent) = &profile.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder.build().map_err(http_err)?;
        Ok(Self {
            profile,
            http,
            capabilities: HashMap::new(),
        })
    }

    /// Absolute URL of a capability announced at login.
    fn capability_url(&self, name: &str) -> Result<String> {
        let value = self
            .capabilities
            .get(name)
            .ok_or_else(|| Error::Protocol(format!("server announced no {} capability", name)))?;
        let base = reqwest::Url::parse(&self.profile.login_url)
            .map_err(|e| Error::Protocol(format!("invalid login URL: {}", e)))?;
        let url = base
            .join(value)
            .map_err(|e| Error::Protocol(format!("invalid {} capability URL: {}", name, e)))?;
        Ok(url.to_string())
    }

    async fn request(&self, url: &str, params: &[(&str, String)]) -> Result<reqwest::Response> {
        let builder = if self.profile.use_post_method {
            self.http.post(url).form(params)
        } else {
            self.http.get(url).query(params)
        };
        let response = builder
            .basic_auth(&self.profile.username, Some(&self.profile.password))
            .header("RETS-Version", self.profile.rets_version())
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP {} from {}", status, url)));
        }
        Ok(response)
    }

    async fn metadata_body(&self, metadata_type: &str, id: &str) -> Result<String> {
        let url = self.capability_url("GetMetadata")?;
        let params = [
            ("Type", metadata_type.to_string()),
            ("ID", id.to_string()),
            ("Format", "COMPACT".to_string()),
        ];
        let response = self.request(&url, &params).await?;
        let body = response.text().await.map_err(http_err)?;
        let (code, text) = reply(&body);
        if code != 0 {
            return Err(Error::Protocol(format!(
                "{} metadata request failed ({}): {}",
                metadata_type, code, text
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl RetsTransport for HttpTransport {
    async fn login(&mut self) -> Result<()> {
        let response = self.request(&self.profile.login_url.clone(), &[]).await?;
        let body = response.text().await.map_err(http_err)?;
        let (code, text) = reply(&body);
        if code != 0 {
            return Err(Error::Transport(format!("login rejected ({}): {}", code, text)));
        }
        self.capabilities = parse_capability_urls(&body);
        debug!("login ok, {} capability URLs", self.capabilities.len());
        Ok(())
    }

    async fn search(
        &mut self,
        resource: &str,
        class: &str,
        query: &str,
        extras: &QueryExtras,
    ) -> Result<SearchBatch> {
        let url = self.capability_url("Search")?;
        let mut params = vec![
            ("SearchType", resource.to_string()),
            ("Class", class.to_string()),
            ("Query", query.to_string()),
            ("QueryType", "DMQL2".to_string()),
            ("Format", extras.format.clone()),
            ("Limit", extras.limit.to_string()),
            ("Offset", extras.offset.to_string()),
            ("Count", (if extras.count_mode { "2" } else { "1" }).to_string()),
            (
                "StandardNames",
                (if extras.standard_names { "1" } else { "0" }).to_string(),
            ),
        ];
        if let Some(select) = &extras.select {
            if !select.is_empty() {
                params.push(("Select", select.clone()));
            }
        }
        let response = self.request(&url, &params).await?;
        let body = response.text().await.map_err(http_err)?;
        parse_search_body(&body, query)
    }

    async fn get_object(
        &mut self,
        resource: &str,
        field: &str,
        record_id: &str,
        object_ids: &str,
        by_location: bool,
    ) -> Result<Vec<MediaObject>> {
        let url = self.capability_url("GetObject")?;
        let params = [
            ("Resource", resource.to_string()),
            ("Type", field.to_string()),
            ("ID", format!("{}:{}", record_id, object_ids)),
            ("Location", (if by_location { "1" } else { "0" }).to_string()),
        ];
        let response = self.request(&url, &params).await?;

        let content_type = header(&response, "content-type").unwrap_or_default();
        if let Some(boundary) = multipart_boundary(&content_type) {
            let bytes = response.bytes().await.map_err(http_err)?;
            return parse_multipart(&bytes, &boundary, by_location);
        }

        // Single-object response: metadata in the HTTP headers, payload in
        // the body.
        let object = MediaObject {
            content_id: header(&response, "content-id").unwrap_or_default(),
            content_description: header(&response, "content-description"),
            content_type,
            object_id: header(&response, "object-id").unwrap_or_default(),
            location: if by_location {
                header(&response, "location")
            } else {
                None
            },
            binary: if by_location {
                None
            } else {
                Some(response.bytes().await.map_err(http_err)?.to_vec())
            },
        };
        Ok(vec![object])
    }

    async fn get_table_metadata(
        &mut self,
        resource: &str,
        class: &str,
    ) -> Result<Vec<TableField>> {
        let body = self
            .metadata_body("METADATA-TABLE", &format!("{}:{}", resource, class))
            .await?;
        let delim = delimiter(&body);
        let columns = parse_columns(&body, delim);
        let rows = parse_data_rows(&body, delim);
        Ok(rows
            .into_iter()
            .map(|values| table_field(&columns, &values))
            .collect())
    }

    async fn get_lookup_values(
        &mut self,
        resource: &str,
        lookup_name: &str,
    ) -> Result<Vec<String>> {
        let body = self
            .metadata_body("METADATA-LOOKUP_TYPE", &format!("{}:{}", resource, lookup_name))
            .await?;
        let delim = delimiter(&body);
        let columns = parse_columns(&body, delim);
        let long_value = columns.iter().position(|c| c == "LongValue");
        let Some(index) = long_value else {
            return Err(Error::Protocol(format!(
                "lookup {} has no LongValue column",
                lookup_name
            )));
        };
        Ok(parse_data_rows(&body, delim)
            .into_iter()
            .filter_map(|values| values.get(index).cloned())
            .collect())
    }

    async fn get_system_metadata(&mut self) -> Result<serde_json::Value> {
        let body = self.metadata_body("METADATA-SYSTEM", "0").await?;
        Ok(compact_to_value(&body))
    }

    async fn get_resources_metadata(&mut self, _resource: &str) -> Result<serde_json::Value> {
        let body = self.metadata_body("METADATA-RESOURCE", "0").await?;
        Ok(compact_to_value(&body))
    }

    async fn get_classes_metadata(&mut self, resource: &str) -> Result<serde_json::Value> {
        let body = self.metadata_body("METADATA-CLASS", resource).await?;
        Ok(compact_to_value(&body))
    }

    async fn logout(&mut self) -> Result<()> {
        // Servers without a Logout capability just let the session expire.
        if !self.capabilities.contains_key("Logout") {
            return Ok(());
        }
        let url = self.capability_url("Logout")?;
        self.request(&url, &[]).await?;
        Ok(())
    }
}

fn http_err(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    if !content_type.starts_with("multipart/") {
        return None;
    }
    content_type.split(';').find_map(|part| {
        part.trim()
            .strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

/// Reply code and text from the `<RETS ...>` envelope. Missing attributes
/// read as success, matching lenient servers.
fn reply(body: &str) -> (i64, String) {
    let code = attr_value(body, "RETS", "ReplyCode")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let text = attr_value(body, "RETS", "ReplyText").unwrap_or_default();
    (code, text.to_string())
}

fn attr_value<'a>(body: &'a str, tag: &str, attr: &str) -> Option<&'a str> {
    let open = format!("<{}", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find('>')? + start;
    let element = &body[start..end];
    let marker = format!("{}=\"", attr);
    let value_start = element.find(&marker)? + marker.len();
    let value_end = element[value_start..].find('"')? + value_start;
    Some(&element[value_start..value_end])
}

fn tag_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

/// Capability name/URL pairs from the `<RETS-RESPONSE>` block of the login
/// body.
fn parse_capability_urls(body: &str) -> HashMap<String, String> {
    let mut capabilities = HashMap::new();
    let Some(block) = tag_text(body, "RETS-RESPONSE") else {
        return capabilities;
    };
    for line in block.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            if !key.is_empty() && !value.is_empty() {
                capabilities.insert(key.to_string(), value.to_string());
            }
        }
    }
    capabilities
}

/// Column delimiter declared by the body (`<DELIMITER value="09"/>`,
/// decimal ASCII). Defaults to tab.
fn delimiter(body: &str) -> char {
    attr_value(body, "DELIMITER", "value")
        .and_then(|v| v.parse::<u32>().ok())
        .and_then(char::from_u32)
        .unwrap_or('\t')
}

/// Split one COMPACT line. Lines are delimiter-wrapped
/// (`\tA\tB\t`), so the empty leading/trailing cells are dropped.
fn split_compact(line: &str, delim: char) -> Vec<String> {
    let mut cells: Vec<&str> = line.split(delim).collect();
    if cells.first() == Some(&"") {
        cells.remove(0);
    }
    if cells.last() == Some(&"") {
        cells.pop();
    }
    cells.into_iter().map(|c| c.to_string()).collect()
}

fn parse_columns(body: &str, delim: char) -> Vec<String> {
    tag_text(body, "COLUMNS")
        .map(|line| split_compact(line.trim_matches(&['\r', '\n'][..]), delim))
        .unwrap_or_default()
}

fn parse_data_rows(body: &str, delim: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("<DATA>") {
        let after = &rest[start + "<DATA>".len()..];
        let Some(end) = after.find("</DATA>") else {
            break;
        };
        rows.push(split_compact(after[..end].trim_matches(&['\r', '\n'][..]), delim));
        rest = &after[end + "</DATA>".len()..];
    }
    rows
}

fn record_count(body: &str) -> Option<u64> {
    attr_value(body, "COUNT", "Records").and_then(|v| v.parse().ok())
}

fn parse_search_body(body: &str, query: &str) -> Result<SearchBatch> {
    let (code, text) = reply(body);
    if code != 0 && code != REPLY_NO_RECORDS {
        return Err(Error::Query {
            query: query.to_string(),
            message: format!("{} ({})", text, code),
        });
    }

    let total = record_count(body);
    if code == REPLY_NO_RECORDS {
        return Ok(SearchBatch::new(Vec::new(), total.or(Some(0))));
    }

    let delim = delimiter(body);
    let columns = parse_columns(body, delim);
    let rows = parse_data_rows(body, delim)
        .into_iter()
        .map(|values| {
            Row::from_pairs(
                columns
                    .iter()
                    .cloned()
                    .zip(values)
                    .collect(),
            )
        })
        .collect();
    Ok(SearchBatch::new(rows, total))
}

fn table_field(columns: &[String], values: &[String]) -> TableField {
    let cell = |name: &str| -> Option<String> {
        columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| values.get(i))
            .filter(|v| !v.is_empty())
            .cloned()
    };
    let system_name = cell("SystemName");
    TableField {
        name: system_name
            .clone()
            .or_else(|| values.first().cloned())
            .unwrap_or_default(),
        system_name,
        long_name: cell("LongName"),
        data_type: cell("DataType"),
        lookup_name: cell("LookupName"),
    }
}

/// COMPACT metadata rows as a JSON array of objects, one per row.
fn compact_to_value(body: &str) -> serde_json::Value {
    let delim = delimiter(body);
    let columns = parse_columns(body, delim);
    let rows = parse_data_rows(body, delim);
    let objects: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|values| {
            let mut object = serde_json::Map::new();
            for (column, value) in columns.iter().zip(values) {
                object.insert(column.clone(), serde_json::Value::String(value));
            }
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(objects)
}

fn parse_multipart(data: &[u8], boundary: &str, by_location: bool) -> Result<Vec<MediaObject>> {
    let marker = format!("--{}", boundary);
    let text_safe = |bytes: &[u8]| String::from_utf8_lossy(bytes).to_string();

    let mut objects = Vec::new();
    let mut parts: Vec<&[u8]> = Vec::new();
    let mut rest = data;
    while let Some(pos) = find_subslice(rest, marker.as_bytes()) {
        let (before, after) = rest.split_at(pos);
        if !before.is_empty() {
            parts.push(before);
        }
        rest = &after[marker.len()..];
    }
    if !rest.is_empty() {
        parts.push(rest);
    }

    for part in parts {
        // Strip the leading CRLF left over from the boundary line and skip
        // the closing "--" marker.
        let part = trim_leading_crlf(part);
        if part.is_empty() || part.starts_with(b"--") {
            continue;
        }
        let Some(split) = find_subslice(part, b"\r\n\r\n") else {
            continue;
        };
        let header_text = text_safe(&part[..split]);
        let body = trim_trailing_crlf(&part[split + 4..]);

        let part_header = |name: &str| -> Option<String> {
            header_text.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                if key.trim().eq_ignore_ascii_case(name) {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            })
        };

        objects.push(MediaObject {
            content_id: part_header("Content-ID").unwrap_or_default(),
            content_description: part_header("Content-Description"),
            content_type: part_header("Content-Type").unwrap_or_default(),
            object_id: part_header("Object-ID").unwrap_or_default(),
            location: if by_location {
                part_header("Location")
            } else {
                None
            },
            binary: if by_location {
                None
            } else {
                Some(body.to_vec())
            },
        });
    }

    if objects.is_empty() {
        return Err(Error::Protocol("empty multipart object response".into()));
    }
    Ok(objects)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn trim_leading_crlf(data: &[u8]) -> &[u8] {
    let mut data = data;
    while data.starts_with(b"\r\n") {
        data = &data[2..];
    }
    data
}

fn trim_trailing_crlf(data: &[u8]) -> &[u8] {
    let mut data = data;
    while data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_BODY: &str = "<RETS ReplyCode=\"0\" ReplyText=\"Operation Successful\">\n\
        <RETS-RESPONSE>\n\
        MemberName = Test Agent\n\
        Search = /rets/search\n\
        GetMetadata = /rets/getmetadata\n\
        GetObject = /rets/getobject\n\
        Logout = /rets/logout\n\
        </RETS-RESPONSE>\n\
        </RETS>";

    const SEARCH_BODY: &str = "<RETS ReplyCode=\"0\" ReplyText=\"Operation Successful\">\n\
        <COUNT Records=\"237\"/>\n\
        <DELIMITER value=\"09\"/>\n\
        <COLUMNS>\tListingID\tListPrice\tCity\t</COLUMNS>\n\
        <DATA>\tL1\t100000\tSpringfield\t</DATA>\n\
        <DATA>\tL2\t250000\tShelbyville\t</DATA>\n\
        </RETS>";

    #[test]
    fn test_parse_capability_urls() {
        let capabilities = parse_capability_urls(LOGIN_BODY);
        assert_eq!(capabilities.get("Search").unwrap(), "/rets/search");
        assert_eq!(capabilities.get("Logout").unwrap(), "/rets/logout");
        assert_eq!(capabilities.len(), 5);
    }

    #[test]
    fn test_reply_parsing() {
        assert_eq!(reply(LOGIN_BODY), (0, "Operation Successful".to_string()));
        let (code, text) = reply("<RETS ReplyCode=\"20203\" ReplyText=\"Misc error\"></RETS>");
        assert_eq!(code, 20203);
        assert_eq!(text, "Misc error");
    }

    #[test]
    fn test_parse_search_body() {
        let batch = parse_search_body(SEARCH_BODY, "(City=*)").unwrap();
        assert_eq!(batch.row_count, 2);
        assert_eq!(batch.total_count, Some(237));
        assert_eq!(batch.rows[0].get("ListingID"), Some("L1"));
        assert_eq!(batch.rows[1].get("City"), Some("Shelbyville"));
        // Column order preserved
        assert_eq!(
            batch.rows[0].names(),
            vec!["ListingID".to_string(), "ListPrice".to_string(), "City".to_string()]
        );
    }

    #[test]
    fn test_search_rejection_maps_to_query_error() {
        let body = "<RETS ReplyCode=\"20206\" ReplyText=\"Invalid query\"></RETS>";
        let err = parse_search_body(body, "(Bogus=1)").unwrap_err();
        match err {
            Error::Query { query, message } => {
                assert_eq!(query, "(Bogus=1)");
                assert!(message.contains("Invalid query"));
            }
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_records_is_an_empty_batch() {
        let body = "<RETS ReplyCode=\"20201\" ReplyText=\"No records found\"></RETS>";
        let batch = parse_search_body(body, "(City=Nowhere)").unwrap();
        assert_eq!(batch.row_count, 0);
        assert_eq!(batch.total_count, Some(0));
    }

    #[test]
    fn test_table_field_mapping() {
        let columns: Vec<String> = ["SystemName", "LongName", "DataType", "LookupName"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: Vec<String> = ["Status", "Listing Status", "Character", "STATUS_LOOKUP"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let field = table_field(&columns, &values);
        assert_eq!(field.name, "Status");
        assert_eq!(field.lookup_name.as_deref(), Some("STATUS_LOOKUP"));

        let no_lookup: Vec<String> = ["Status", "Listing Status", "Character", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table_field(&columns, &no_lookup).lookup_name, None);
    }

    #[test]
    fn test_compact_to_value() {
        let body = "<RETS ReplyCode=\"0\">\n\
            <COLUMNS>\tResourceID\tStandardName\t</COLUMNS>\n\
            <DATA>\tProperty\tProperty\t</DATA>\n\
            </RETS>";
        let value = compact_to_value(body);
        assert_eq!(value[0]["ResourceID"], "Property");
    }

    #[test]
    fn test_multipart_binaries() {
        let body = b"--AAAA\r\n\
            Content-ID: 123\r\n\
            Object-ID: 1\r\n\
            Content-Type: image/jpeg\r\n\
            \r\n\
            jpegbytes\r\n\
            --AAAA\r\n\
            Content-ID: 123\r\n\
            Object-ID: 2\r\n\
            Content-Type: image/png\r\n\
            \r\n\
            pngbytes\r\n\
            --AAAA--\r\n";
        let objects = parse_multipart(body, "AAAA", false).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].binary.as_deref(), Some(&b"jpegbytes"[..]));
        assert_eq!(objects[1].object_id, "2");
        assert_eq!(objects[1].content_subtype(), "png");
    }

    #[test]
    fn test_multipart_by_location_carries_no_binary() {
        let body = b"--BB\r\n\
            Content-ID: 9\r\n\
            Object-ID: 1\r\n\
            Content-Type: image/jpeg\r\n\
            Location: http://cdn.example.com/9/1.jpg\r\n\
            \r\n\
            \r\n\
            --BB--\r\n";
        let objects = parse_multipart(body, "BB", true).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].location.as_deref(),
            Some("http://cdn.example.com/9/1.jpg")
        );
        assert!(objects[0].binary.is_none());
    }

    #[test]
    fn test_multipart_boundary_extraction() {
        assert_eq!(
            multipart_boundary("multipart/parallel; boundary=\"xyz\""),
            Some("xyz".to_string())
        );
        assert_eq!(
            multipart_boundary("multipart/parallel; boundary=abc"),
            Some("abc".to_string())
        );
        assert_eq!(multipart_boundary("image/jpeg"), None);
    }

    #[test]
    fn test_delimiter_default_and_declared() {
        assert_eq!(delimiter("<RETS></RETS>"), '\t');
        assert_eq!(delimiter("<DELIMITER value=\"44\"/>"), ',');
    }
}
