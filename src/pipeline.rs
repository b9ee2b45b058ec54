//! Pipeline: one source, one bridge, one store loop.
//!
//! [`Pipeline::start`] creates the channels, subscribes the source through a
//! [`SubscriptionBridge`] and spawns [`FeedStore::run`]. Shutting down
//! releases the subscription; the store loop ends once the source has
//! dropped its sender.

use std::sync::Arc;

use chainfeed_core::config::{SourceConfig, SourceKind};
use chainfeed_core::{EventBatch, ExclusionSet, FeedState, FeedStore, StoreCommand};
use chainfeed_sources::{
    EventSource, JsonLinesSource, SourceError, SubscriptionBridge, SubscriptionHandle, WsSource,
    WsSourceConfig,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Capacity of the source → store channel.
pub const BATCH_CHANNEL_CAPACITY: usize = 256;
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Build the source described by `[source]`.
pub async fn source_from_config(cfg: &SourceConfig) -> anyhow::Result<Box<dyn EventSource>> {
    let source: Box<dyn EventSource> = match cfg.kind {
        SourceKind::Stdin => Box::new(JsonLinesSource::stdin()),
        SourceKind::File => {
            let path = cfg
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("source kind \"file\" needs a path"))?;
            Box::new(JsonLinesSource::open(path).await?)
        }
        SourceKind::Ws => Box::new(WsSource::new(WsSourceConfig::new(&cfg.url, &cfg.method))),
    };
    Ok(source)
}

/// The TUI reads keys from the terminal. When stdin is that terminal a
/// stdin source would steal keystrokes from it, so the pair is refused.
pub fn check_tui_source(cfg: &SourceConfig, stdin_is_terminal: bool) -> anyhow::Result<()> {
    if cfg.kind == SourceKind::Stdin && stdin_is_terminal {
        anyhow::bail!(
            "stdin is a terminal; pipe JSON lines in, or pick another source \
             (--source file --path <FILE>, --source ws --url <URL>), or use --headless"
        );
    }
    Ok(())
}

pub struct Pipeline {
    bridge: SubscriptionBridge,
    handle: SubscriptionHandle,
    state: watch::Receiver<Arc<FeedState>>,
    commands: mpsc::Sender<StoreCommand>,
    store_task: JoinHandle<Arc<FeedState>>,
}

impl Pipeline {
    /// Subscribe `source` and start the store loop. Must be called inside a
    /// tokio runtime.
    pub fn start(source: Box<dyn EventSource>, exclusions: ExclusionSet) -> Self {
        let store = FeedStore::new(exclusions);
        let state = store.subscribe_state();

        let (batch_tx, batch_rx) = mpsc::channel::<EventBatch>(BATCH_CHANNEL_CAPACITY);
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let mut bridge = SubscriptionBridge::new();
        let handle = bridge.subscribe(source, batch_tx);
        let store_task = tokio::spawn(store.run(batch_rx, command_rx));

        Self {
            bridge,
            handle,
            state,
            commands,
            store_task,
        }
    }

    pub fn state(&self) -> watch::Receiver<Arc<FeedState>> {
        self.state.clone()
    }

    pub fn commands(&self) -> mpsc::Sender<StoreCommand> {
        self.commands.clone()
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Release the subscription, wait for the source and the store loop, and
    /// return the source's result with the final feed.
    pub async fn shutdown(mut self) -> (Result<(), SourceError>, Arc<FeedState>) {
        self.bridge.unsubscribe();
        self.finish().await
    }

    /// Wait for the source to end on its own (EOF, disconnect), then for the
    /// store loop to drain.
    pub async fn finish(self) -> (Result<(), SourceError>, Arc<FeedState>) {
        let source_result = self.handle.join().await.unwrap_or(Ok(()));
        // Keep the bridge (and the subscription) alive until the source is done.
        drop(self.bridge);
        drop(self.commands);
        let final_state = match self.store_task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "store loop failed");
                self.state.borrow().clone()
            }
        };
        (source_result, final_state)
    }
}
