//! In-process source fed through an `mpsc` sender.
//!
//! Useful for embedding chainfeed in a program that already holds decoded
//! events, and as the workhorse of the bridge and store tests.

use async_trait::async_trait;
use chainfeed_core::EventBatch;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{forward, EventSource, SourceError};

pub struct ChannelSource {
    rx: mpsc::Receiver<EventBatch>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<EventBatch>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    fn name(&self) -> &str {
        "channel"
    }

    async fn run(
        mut self: Box<Self>,
        tx: mpsc::Sender<EventBatch>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                batch = self.rx.recv() => match batch {
                    Some(batch) => forward(&tx, batch).await?,
                    // Every sender is gone: the source is exhausted.
                    None => return Ok(()),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_core::RawEventRecord;
    use serde_json::json;

    #[tokio::test]
    async fn empty_batches_are_not_forwarded() {
        let (input, source) = ChannelSource::new(4);
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(Box::new(source).run(tx, CancellationToken::new()));

        input.send(EventBatch::new(vec![])).await.unwrap();
        input
            .send(EventBatch::new(vec![RawEventRecord::new("a", "b", json!(1))]))
            .await
            .unwrap();
        drop(input);

        assert_eq!(rx.recv().await.unwrap().len(), 1);
        assert!(rx.recv().await.is_none());
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn closed_downstream_is_an_error() {
        let (input, source) = ChannelSource::new(4);
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let task = tokio::spawn(Box::new(source).run(tx, CancellationToken::new()));

        input
            .send(EventBatch::new(vec![RawEventRecord::new("a", "b", json!(1))]))
            .await
            .unwrap();

        assert!(matches!(task.await.unwrap(), Err(SourceError::ChannelClosed)));
    }
}
