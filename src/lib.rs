//! chainfeed — live feed of chain-node system events.
//!
//! Terminal dashboard that subscribes to a node's event stream, deduplicates
//! and filters the delivered batches, and shows them newest first. This crate
//! wires the layers together and re-exports them so integration tests can
//! import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! EventSource ──mpsc──► FeedStore::run ──watch──► TUI / headless
//!                              ▲
//!                              └── StoreCommand::Clear
//! ```
//!
//! Sources and the store loop run on the tokio runtime; the TUI drives the
//! main thread.

pub mod headless;
pub mod pipeline;

pub use chainfeed_core::{
    config, feed, store, DisplayItem, EventBatch, ExclusionSet, FeedEntry, FeedState, FeedStore,
    RawEventRecord, StoreCommand,
};
pub use chainfeed_sources::{
    ChannelSource, EventSource, JsonLinesSource, SourceError, SubscriptionBridge,
    SubscriptionHandle, WsSource, WsSourceConfig,
};
pub use pipeline::Pipeline;
