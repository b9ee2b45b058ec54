//! Feed data model, merge and store.
//!
//! This crate holds the feed data model, the pure batch merge and the store
//! that owns the live feed.
//!
//! # Architecture
//!
//! ```text
//! Source ──mpsc──► Store ──watch──► UI
//!                    ▲
//!                    └── Clear
//! ```
//!
//! Sources push [`EventBatch`] values onto a `tokio` channel; the store loop
//! merges them one at a time and publishes immutable snapshots.

pub mod config;
pub mod feed;
pub mod store;
pub mod types;

pub use feed::{ExclusionSet, FeedState};
pub use store::{FeedStore, StoreCommand};
pub use types::{DisplayItem, EventBatch, FeedEntry, RawEventRecord};
