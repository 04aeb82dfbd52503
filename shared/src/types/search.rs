//! Search request extras and result batches

/// Wire format requested for search results.
pub const FORMAT_COMPACT_DECODED: &str = "COMPACT-DECODED";

/// Per-call search parameters.
///
/// Built once per round trip and never mutated after being handed to the
/// session.
#[derive(Debug, Clone)]
pub struct QueryExtras {
    pub format: String,
    pub limit: u64,
    pub offset: u64,
    /// When true the server is asked for a count only (no rows).
    pub count_mode: bool,
    pub standard_names: bool,
    pub select: Option<String>,
}

impl QueryExtras {
    pub fn new(
        limit: u64,
        offset: u64,
        count_mode: bool,
        standard_names: bool,
        select: Option<String>,
    ) -> Self {
        Self {
            format: FORMAT_COMPACT_DECODED.to_string(),
            limit,
            offset,
            count_mode,
            standard_names,
            select,
        }
    }
}

/// One result row: field/value pairs in the server's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value for `name`, if the row carries that field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Field names in column order.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|(field, _)| field.clone()).collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchBatch {
    pub rows: Vec<Row>,
    /// Total matching records, when the server was asked to count them.
    pub total_count: Option<u64>,
    pub row_count: u64,
}

impl SearchBatch {
    pub fn new(rows: Vec<Row>, total_count: Option<u64>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            rows,
            total_count,
            row_count,
        }
    }

    /// A batch carrying only the total count, as emitted in count-only mode.
    pub fn count_only(total_count: Option<u64>) -> Self {
        Self {
            rows: Vec::new(),
            total_count,
            row_count: 0,
        }
    }
}
