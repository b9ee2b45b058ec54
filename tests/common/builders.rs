//! Test builders for records and batches.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use chainfeed::{EventBatch, RawEventRecord};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`RawEventRecord`] fixtures.
///
/// ```rust
/// let record = RecordBuilder::new("balances", "Transfer")
///     .data(json!(["alice", "bob", 100]))
///     .build();
/// ```
pub struct RecordBuilder {
    section: String,
    method: String,
    data: Value,
}

impl RecordBuilder {
    pub fn new(section: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            data: json!([]),
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn build(self) -> RawEventRecord {
        RawEventRecord::new(self.section, self.method, self.data)
    }
}

/// `system:ExtrinsicSuccess`, the record the feed always drops.
pub fn success_record() -> RawEventRecord {
    RecordBuilder::new("system", "ExtrinsicSuccess")
        .data(json!([{"weight": 1000, "class": "Normal"}]))
        .build()
}

// ---------------------------------------------------------------------------
// BatchBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`EventBatch`] fixtures with a fixed receive time.
pub struct BatchBuilder {
    origin: Option<String>,
    received_at: DateTime<Utc>,
    records: Vec<RawEventRecord>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            origin: None,
            received_at: fixed_time(0),
            records: Vec::new(),
        }
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn record(mut self, record: RawEventRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn event(self, section: &str, method: &str) -> Self {
        self.record(RecordBuilder::new(section, method).build())
    }

    pub fn success(self) -> Self {
        self.record(success_record())
    }

    pub fn build(self) -> EventBatch {
        let batch = EventBatch::new(self.records).with_received_at(self.received_at);
        match self.origin {
            Some(origin) => batch.with_origin(origin),
            None => batch,
        }
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic timestamp `secs` seconds after a fixed epoch.
pub fn fixed_time(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .expect("valid timestamp")
}

/// Labels of a feed, newest first.
pub fn labels(state: &chainfeed::FeedState) -> Vec<&str> {
    state.entries().iter().map(|e| e.label()).collect()
}
