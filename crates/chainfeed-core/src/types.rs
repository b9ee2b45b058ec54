//! Core types for chainfeed-core.
//!
//! This module defines the data structures shared across all layers: the
//! [`RawEventRecord`] delivered by a source, the [`EventBatch`] that groups
//! records from one delivery, the immutable [`FeedEntry`] kept by the store,
//! and the [`DisplayItem`] shape handed to renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Presentation hint attached to every [`DisplayItem`].
pub const FEED_ICON: &str = "bell";

/// One event notification as projected by the chain client.
///
/// Records are not validated: a record missing `section` or `method`
/// deserialises with an empty string in that position and is displayed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Module namespace that emitted the event (`balances`, `system`, …).
    #[serde(default)]
    pub section: String,
    /// Event name within the section (`Transfer`, `ExtrinsicSuccess`, …).
    #[serde(default)]
    pub method: String,
    /// Arbitrary event payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawEventRecord {
    pub fn new(
        section: impl Into<String>,
        method: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            section: section.into(),
            method: method.into(),
            data,
        }
    }

    /// `"{section}:{method}"`.
    pub fn label(&self) -> String {
        format!("{}:{}", self.section, self.method)
    }

    /// The payload serialised as compact JSON.
    pub fn detail(&self) -> String {
        // Serialising a `Value` cannot fail: every key is already a string.
        serde_json::to_string(&self.data).unwrap_or_else(|_| "null".to_string())
    }
}

/// A group of records delivered together by one subscription delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch {
    /// Optional source-supplied identifier (block number, block hash, …).
    /// When present it is folded into every entry key of the batch.
    pub origin: Option<String>,
    /// Arrival time, stamped by the source.
    pub received_at: DateTime<Utc>,
    /// Records in source delivery order.
    pub records: Vec<RawEventRecord>,
}

impl EventBatch {
    pub fn new(records: Vec<RawEventRecord>) -> Self {
        Self {
            origin: None,
            received_at: Utc::now(),
            records,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl From<Vec<RawEventRecord>> for EventBatch {
    fn from(records: Vec<RawEventRecord>) -> Self {
        Self::new(records)
    }
}

/// A display-ready, deduplicated event projection. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    key: String,
    label: String,
    detail: String,
    received_at: DateTime<Utc>,
}

impl FeedEntry {
    pub(crate) fn new(
        key: String,
        label: String,
        detail: String,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            label,
            detail,
            received_at,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Project this entry into the list-item shape consumed by renderers.
    pub fn to_display_item(&self) -> DisplayItem {
        DisplayItem {
            key: self.key.clone(),
            icon: FEED_ICON,
            summary: self.label.clone(),
            content: self.detail.clone(),
        }
    }
}

/// `{key, icon, summary, content}` list item for the output boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    pub key: String,
    pub icon: &'static str,
    pub summary: String,
    pub content: String,
}
