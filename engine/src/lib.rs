//! Query execution engine for retsq
//!
//! The non-trivial control flow of the client lives here: date-range
//! bucketing for histogram aggregation, the paginated search loop with its
//! offset/limit/early-stop semantics, table-metadata resolution with
//! lookup enrichment, and the output-sink family that persists result
//! batches.

pub mod bucket;
pub mod metadata;
pub mod output;
pub mod paginate;

pub use bucket::generate_buckets;
pub use output::{OutputFormat, OutputSink, Payload};
pub use paginate::{PageQuery, PageRunner};
