//! JSON shapes accepted for one batch.
//!
//! A batch is either a bare array of records:
//!
//! ```json
//! [{"section": "balances", "method": "Transfer", "data": ["A", "B", 100]}]
//! ```
//!
//! or an object carrying an origin (`origin` or `block`, string or number)
//! alongside the records:
//!
//! ```json
//! {"block": 1024, "events": [{"section": "system", "method": "NewAccount", "data": ["A"]}]}
//! ```

use chainfeed_core::{EventBatch, RawEventRecord};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireBatch {
    Records(Vec<RawEventRecord>),
    Tagged {
        #[serde(default, alias = "block")]
        origin: Option<WireOrigin>,
        events: Vec<RawEventRecord>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireOrigin {
    Number(u64),
    Text(String),
}

impl From<WireOrigin> for String {
    fn from(origin: WireOrigin) -> Self {
        match origin {
            WireOrigin::Number(n) => n.to_string(),
            WireOrigin::Text(s) => s,
        }
    }
}

impl WireBatch {
    fn into_batch(self, received_at: DateTime<Utc>) -> EventBatch {
        let (origin, records) = match self {
            WireBatch::Records(records) => (None, records),
            WireBatch::Tagged { origin, events } => (origin.map(String::from), events),
        };
        EventBatch {
            origin,
            received_at,
            records,
        }
    }
}

/// Parse one batch from a JSON value.
pub fn batch_from_value(
    value: serde_json::Value,
    received_at: DateTime<Utc>,
) -> Result<EventBatch, serde_json::Error> {
    serde_json::from_value::<WireBatch>(value).map(|w| w.into_batch(received_at))
}

/// Parse one batch from a line of text.
pub fn batch_from_str(line: &str, received_at: DateTime<Utc>) -> Result<EventBatch, serde_json::Error> {
    serde_json::from_str::<WireBatch>(line).map(|w| w.into_batch(received_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bare_array() {
        let batch = batch_from_str(
            r#"[{"section":"balances","method":"Transfer","data":["A","B",100]}]"#,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(batch.origin, None);
        assert_eq!(
            batch.records,
            vec![RawEventRecord::new("balances", "Transfer", json!(["A", "B", 100]))]
        );
    }

    #[test]
    fn numeric_block_origin() {
        let batch = batch_from_str(
            r#"{"block":1024,"events":[{"section":"system","method":"NewAccount"}]}"#,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(batch.origin.as_deref(), Some("1024"));
        assert_eq!(batch.records[0].label(), "system:NewAccount");
    }

    #[test]
    fn string_origin() {
        let batch = batch_from_value(
            json!({"origin": "0xabc", "events": []}),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(batch.origin.as_deref(), Some("0xabc"));
        assert!(batch.is_empty());
    }

    #[test]
    fn object_without_events_is_rejected() {
        assert!(batch_from_str(r#"{"block": 1}"#, Utc::now()).is_err());
        assert!(batch_from_str("not json", Utc::now()).is_err());
    }
}
