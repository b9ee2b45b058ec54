//! Event source adapters and the subscription bridge.
//!
//! Each source connects to something that emits chain events, reads record
//! batches, and pushes [`chainfeed_core::EventBatch`] values onto an async
//! channel for the store. The [`SubscriptionBridge`] makes sure exactly one
//! source is running at a time and that releasing it is idempotent.

pub mod bridge;
pub mod channel;
pub mod error;
pub mod jsonl;
pub mod wire;
pub mod ws;

use async_trait::async_trait;
use chainfeed_core::EventBatch;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use bridge::{SubscriptionBridge, SubscriptionHandle};
pub use channel::ChannelSource;
pub use error::SourceError;
pub use jsonl::JsonLinesSource;
pub use ws::{WsSource, WsSourceConfig};

/// Trait implemented by each event source.
///
/// `run` pushes batches onto `tx` until the source is exhausted, fails, or
/// `cancel` fires. Sources must return promptly after cancellation.
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Short name used in logs and the UI title.
    fn name(&self) -> &str;

    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<EventBatch>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError>;
}

/// Forward a batch downstream. Empty batches are dropped here so that every
/// delivery the store sees carries at least one record.
pub(crate) async fn forward(
    tx: &mpsc::Sender<EventBatch>,
    batch: EventBatch,
) -> Result<(), SourceError> {
    if batch.is_empty() {
        tracing::trace!("dropping empty batch");
        return Ok(());
    }
    tx.send(batch).await.map_err(|_| SourceError::ChannelClosed)
}
