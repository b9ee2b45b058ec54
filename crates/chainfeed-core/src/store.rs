//! The store: owner of the single mutable feed slot.
//!
//! The store is the single source of truth; renderers read published
//! [`FeedState`] snapshots from a `watch` channel, never from a source
//! directly. All mutation goes through [`FeedStore::apply`] and
//! [`FeedStore::clear`], which only call the pure functions in
//! [`crate::feed`] and publish the result.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::feed::{self, ExclusionSet, FeedState};
use crate::types::EventBatch;

/// Control messages accepted by [`FeedStore::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCommand {
    /// Reset the feed to its empty initial state.
    Clear,
}

pub struct FeedStore {
    state: Arc<FeedState>,
    exclusions: ExclusionSet,
    publisher: watch::Sender<Arc<FeedState>>,
}

impl FeedStore {
    pub fn new(exclusions: ExclusionSet) -> Self {
        let state = feed::clear();
        let (publisher, _) = watch::channel(Arc::clone(&state));
        Self {
            state,
            exclusions,
            publisher,
        }
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe_state(&self) -> watch::Receiver<Arc<FeedState>> {
        self.publisher.subscribe()
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<FeedState> {
        Arc::clone(&self.state)
    }

    /// Merge one batch. Publishes and returns `true` only when the feed changed.
    pub fn apply(&mut self, batch: &EventBatch) -> bool {
        let next = feed::merge(&self.state, batch, &self.exclusions);
        if Arc::ptr_eq(&next, &self.state) {
            tracing::trace!(records = batch.len(), "batch produced no new entries");
            return false;
        }

        let added = next.len() - self.state.len();
        tracing::debug!(
            records = batch.len(),
            added,
            total = next.len(),
            origin = batch.origin.as_deref().unwrap_or("-"),
            "merged batch"
        );
        self.publish(next);
        true
    }

    /// Drop every entry and every seen key.
    pub fn clear(&mut self) {
        tracing::debug!(dropped = self.state.len(), "feed cleared");
        self.publish(feed::clear());
    }

    fn publish(&mut self, next: Arc<FeedState>) {
        self.state = next;
        // `send_replace` keeps the value even when no receiver is alive.
        self.publisher.send_replace(Arc::clone(&self.state));
    }

    /// Processing loop: merge batches and handle commands until the batch
    /// channel closes.
    ///
    /// A pending command is handled before any queued batch, so a `Clear`
    /// takes effect ahead of batches that were already waiting; those merge
    /// into the emptied feed. The command channel closing is not fatal; the
    /// loop keeps draining batches without it.
    pub async fn run(
        mut self,
        mut batches: mpsc::Receiver<EventBatch>,
        mut commands: mpsc::Receiver<StoreCommand>,
    ) -> Arc<FeedState> {
        let mut commands_open = true;
        loop {
            tokio::select! {
                biased;

                cmd = commands.recv(), if commands_open => match cmd {
                    Some(StoreCommand::Clear) => self.clear(),
                    None => commands_open = false,
                },
                batch = batches.recv() => match batch {
                    Some(batch) => {
                        self.apply(&batch);
                    }
                    None => {
                        tracing::debug!("batch channel closed, store loop exiting");
                        break;
                    }
                },
            }
        }
        self.state
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new(ExclusionSet::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
