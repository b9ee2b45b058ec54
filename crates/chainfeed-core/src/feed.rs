//! Feed state and the pure batch-merge function.
//!
//! [`merge`] folds one [`EventBatch`] into a [`FeedState`]: project every
//! record to `label`/`detail`, drop excluded labels, key each survivor with a
//! batch-local counter, drop keys that were already seen, and prepend what is
//! left. When nothing survives the input `Arc` is returned untouched so
//! subscribers can skip redundant redraws with [`Arc::ptr_eq`].
//!
//! Keys only depend on the batch itself, so a batch that is delivered twice
//! (e.g. by a second subscription racing the first) collides with its own
//! keys on the second delivery and is dropped.

use std::collections::HashSet;
use std::sync::Arc;

use crate::types::{EventBatch, FeedEntry};

/// Routine success acknowledgement emitted for every extrinsic.
pub const EXTRINSIC_SUCCESS: &str = "system:ExtrinsicSuccess";

/// Labels that are never shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    labels: HashSet<String>,
}

impl ExclusionSet {
    /// An exclusion set that lets every label through.
    pub fn empty() -> Self {
        Self {
            labels: HashSet::new(),
        }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::from_labels([EXTRINSIC_SUCCESS])
    }
}

/// Cumulative feed: entries newest first plus every key ever merged since the
/// last clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    entries: Vec<FeedEntry>,
    seen_keys: HashSet<String>,
}

impl FeedState {
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn seen_keys(&self) -> &HashSet<String> {
        &self.seen_keys
    }

    pub fn has_seen(&self, key: &str) -> bool {
        self.seen_keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The empty initial state.
pub fn clear() -> Arc<FeedState> {
    Arc::new(FeedState::default())
}

/// Candidate key for the `idx`-th surviving entry of a batch.
fn entry_key(origin: Option<&str>, idx: usize, label: &str) -> String {
    match origin {
        Some(origin) => format!("{origin}/{idx}-{label}"),
        None => format!("{idx}-{label}"),
    }
}

/// Merge `batch` into `state`, returning the new state.
///
/// Returns `Arc::clone(state)` when no entry survives filtering and
/// deduplication.
pub fn merge(
    state: &Arc<FeedState>,
    batch: &EventBatch,
    exclusions: &ExclusionSet,
) -> Arc<FeedState> {
    let origin = batch.origin.as_deref();

    let mut batch_keys: HashSet<String> = HashSet::new();
    let survivors: Vec<FeedEntry> = batch
        .records
        .iter()
        .map(|record| (record.label(), record))
        .filter(|(label, _)| !exclusions.contains(label))
        .enumerate()
        .map(|(idx, (label, record))| {
            FeedEntry::new(
                entry_key(origin, idx, &label),
                label,
                record.detail(),
                batch.received_at,
            )
        })
        .filter(|entry| !state.seen_keys.contains(entry.key()))
        .filter(|entry| batch_keys.insert(entry.key().to_string()))
        .collect();

    if survivors.is_empty() {
        return Arc::clone(state);
    }

    let mut seen_keys = state.seen_keys.clone();
    seen_keys.extend(batch_keys);

    let mut entries = Vec::with_capacity(survivors.len() + state.entries.len());
    entries.extend(survivors);
    entries.extend(state.entries.iter().cloned());

    Arc::new(FeedState { entries, seen_keys })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawEventRecord;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn record(section: &str, method: &str) -> RawEventRecord {
        RawEventRecord::new(section, method, json!([]))
    }

    fn labels(state: &FeedState) -> Vec<&str> {
        state.entries().iter().map(|e| e.label()).collect()
    }

    #[test]
    fn transfer_is_prepended() {
        let s0 = merge(
            &clear(),
            &vec![record("staking", "Rewarded")].into(),
            &ExclusionSet::default(),
        );
        let batch = EventBatch::new(vec![RawEventRecord::new(
            "balances",
            "Transfer",
            json!(["A", "B", 100]),
        )])
        .with_origin("7");
        let s1 = merge(&s0, &batch, &ExclusionSet::default());

        assert_eq!(labels(&s1), vec!["balances:Transfer", "staking:Rewarded"]);
        assert_eq!(s1.entries()[0].detail(), r#"["A","B",100]"#);
    }

    #[test]
    fn extrinsic_success_alone_is_a_no_op() {
        let s0 = clear();
        let s1 = merge(
            &s0,
            &vec![record("system", "ExtrinsicSuccess")].into(),
            &ExclusionSet::default(),
        );
        assert!(Arc::ptr_eq(&s0, &s1));
    }

    #[test]
    fn empty_batch_is_reference_stable() {
        let s0 = merge(
            &clear(),
            &vec![record("a", "b")].into(),
            &ExclusionSet::default(),
        );
        let s1 = merge(&s0, &EventBatch::new(vec![]), &ExclusionSet::default());
        assert!(Arc::ptr_eq(&s0, &s1));
    }

    #[test]
    fn redelivery_adds_nothing() {
        let batch: EventBatch = vec![record("a", "X"), record("b", "Y")].into();
        let once = merge(&clear(), &batch, &ExclusionSet::default());
        let twice = merge(&once, &batch, &ExclusionSet::default());
        assert!(Arc::ptr_eq(&once, &twice));
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn keys_count_survivors_only() {
        let batch: EventBatch = vec![
            record("system", "ExtrinsicSuccess"),
            record("balances", "Transfer"),
            record("balances", "Transfer"),
        ]
        .into();
        let s = merge(&clear(), &batch, &ExclusionSet::default());
        let keys: Vec<&str> = s.entries().iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["0-balances:Transfer", "1-balances:Transfer"]);
    }

    #[rstest]
    #[case(None, "0-balances:Transfer")]
    #[case(Some("1024"), "1024/0-balances:Transfer")]
    fn key_format(#[case] origin: Option<&str>, #[case] expected: &str) {
        let mut batch = EventBatch::new(vec![record("balances", "Transfer")]);
        batch.origin = origin.map(str::to_string);
        let s = merge(&clear(), &batch, &ExclusionSet::default());
        assert_eq!(s.entries()[0].key(), expected);
    }

    #[test]
    fn distinct_origins_do_not_collide() {
        let b1 = EventBatch::new(vec![record("balances", "Transfer")]).with_origin("1");
        let b2 = EventBatch::new(vec![record("balances", "Transfer")]).with_origin("2");
        let s = merge(&clear(), &b1, &ExclusionSet::default());
        let s = merge(&s, &b2, &ExclusionSet::default());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn seen_keys_cover_entries() {
        let s = merge(
            &clear(),
            &vec![record("a", "b"), record("c", "d")].into(),
            &ExclusionSet::default(),
        );
        for entry in s.entries() {
            assert!(s.has_seen(entry.key()));
        }
        assert_eq!(s.seen_keys().len(), s.len());
    }

    #[test]
    fn empty_exclusion_set_keeps_success_events() {
        let s = merge(
            &clear(),
            &vec![record("system", "ExtrinsicSuccess")].into(),
            &ExclusionSet::empty(),
        );
        assert_eq!(labels(&s), vec![EXTRINSIC_SUCCESS]);
    }

    #[test]
    fn clear_accepts_previously_seen_keys() {
        let batch: EventBatch = vec![record("a", "b")].into();
        let s = merge(&clear(), &batch, &ExclusionSet::default());
        assert_eq!(s.len(), 1);

        let reset = clear();
        assert!(reset.is_empty());
        assert!(reset.seen_keys().is_empty());

        let again = merge(&reset, &batch, &ExclusionSet::default());
        assert_eq!(again.len(), 1);
    }
}
