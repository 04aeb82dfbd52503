//! Contiguous time ranges used for histogram bucketing

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// A half-open time range `[start, end)`.
///
/// Constructed fully or not at all: `new` enforces `start < end` and the
/// value is never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}
