//! Subscription bridge — one live source per bridge, released exactly once.
//!
//! [`SubscriptionBridge::subscribe`] spawns the source on the tokio runtime
//! and stores its [`SubscriptionHandle`]. A second call while a handle is
//! stored does nothing and returns the existing handle, so an initialisation
//! path that runs twice still ends up with a single subscription.
//!
//! Dropping the bridge releases the subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chainfeed_core::EventBatch;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{EventSource, SourceError};

type SourceTask = JoinHandle<Result<(), SourceError>>;

/// Cloneable handle to a running subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
    source: Arc<str>,
    cancel: CancellationToken,
    finished: Arc<AtomicBool>,
    task: Arc<Mutex<Option<SourceTask>>>,
}

impl SubscriptionHandle {
    /// Name of the source behind this subscription.
    pub fn source_name(&self) -> &str {
        &self.source
    }

    /// `true` until the subscription is released or the source ends.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && !self.finished.load(Ordering::Acquire)
    }

    /// Release the subscription. Safe to call any number of times, from any clone.
    pub fn unsubscribe(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::info!(source = %self.source, "unsubscribing");
        self.cancel.cancel();
    }

    /// Wait for the source task and return its result.
    ///
    /// Only the first caller across all clones receives the result; later
    /// calls return `None`.
    pub async fn join(&self) -> Option<Result<(), SourceError>> {
        let task = self.task.lock().await.take()?;
        Some(match task.await {
            Ok(result) => result,
            Err(e) => Err(SourceError::Task(e.to_string())),
        })
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("source", &self.source)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns at most one subscription.
#[derive(Debug, Default)]
pub struct SubscriptionBridge {
    handle: Option<SubscriptionHandle>,
}

impl SubscriptionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `source`, pushing its batches onto `tx`.
    ///
    /// No-op while a subscription is held: the existing handle is returned
    /// and `source` is dropped unstarted.
    pub fn subscribe(
        &mut self,
        source: Box<dyn EventSource>,
        tx: mpsc::Sender<EventBatch>,
    ) -> SubscriptionHandle {
        if let Some(handle) = &self.handle {
            tracing::debug!(
                source = %handle.source,
                ignored = source.name(),
                "already subscribed, ignoring subscribe"
            );
            return handle.clone();
        }

        let name: Arc<str> = Arc::from(source.name());
        let cancel = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));

        tracing::info!(source = %name, "subscribing");

        let task = tokio::spawn({
            let name = Arc::clone(&name);
            let cancel = cancel.clone();
            let finished = Arc::clone(&finished);
            async move {
                let result = source.run(tx, cancel).await;
                finished.store(true, Ordering::Release);
                match &result {
                    Ok(()) => tracing::info!(source = %name, "source ended"),
                    Err(e) => tracing::error!(source = %name, error = %e, "source failed"),
                }
                result
            }
        });

        let handle = SubscriptionHandle {
            source: name,
            cancel,
            finished,
            task: Arc::new(Mutex::new(Some(task))),
        };
        self.handle = Some(handle.clone());
        handle
    }

    /// `true` while a subscription is held (even if its source has ended).
    pub fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&SubscriptionHandle> {
        self.handle.as_ref()
    }

    /// Release the held subscription, if any, and allow a new `subscribe`.
    pub fn unsubscribe(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.unsubscribe();
        }
    }
}

impl Drop for SubscriptionBridge {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
