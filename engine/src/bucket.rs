//! Date-range bucketing for histogram queries

use chrono::{DateTime, Duration, Utc};
use retsq_shared::error::{Error, Result};
use retsq_shared::TimeRange;

/// Partition `[start, end]` into contiguous buckets of `interval` width.
///
/// Every bucket except the last is exactly `interval` wide; the last
/// bucket's end is forced to exactly `end`, so it absorbs any remainder.
/// The sequence is built eagerly because callers size progress reporting
/// from the bucket count before issuing any query.
///
/// `start >= end` is an error, not an empty sequence — callers never
/// expect to silently skip work.
pub fn generate_buckets(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: Duration,
) -> Result<Vec<TimeRange>> {
    if start >= end {
        return Err(Error::InvalidRange { start, end });
    }
    if interval <= Duration::zero() {
        return Err(Error::Configuration(
            "bucket interval must be positive".into(),
        ));
    }

    let mut buckets = Vec::new();
    let mut cursor = start;
    loop {
        let next = cursor + interval;
        if next >= end {
            buckets.push(TimeRange::new(cursor, end)?);
            break;
        }
        buckets.push(TimeRange::new(cursor, next)?);
        cursor = next;
    }
    Ok(buckets)
}
