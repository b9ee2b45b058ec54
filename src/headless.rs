//! Headless mode — print each newly merged entry to a writer.
//!
//! Runs the store in-line instead of on its own task so every merged batch
//! is printed exactly once, in arrival order, even when batches arrive faster
//! than the writer drains.

use std::io::Write;

use chainfeed_core::{EventBatch, ExclusionSet, FeedEntry, FeedStore};
use chainfeed_sources::{EventSource, SubscriptionBridge};
use clap::ValueEnum;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::pipeline::BATCH_CHANNEL_CAPACITY;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `label detail`
    #[default]
    Text,
    /// One JSON object per entry.
    Jsonl,
}

fn write_entry(out: &mut impl Write, entry: &FeedEntry, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{} {}", entry.label(), entry.detail())?,
        OutputFormat::Jsonl => {
            serde_json::to_writer(&mut *out, entry)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Subscribe `source` and print entries until it ends or `cancel` fires.
/// Returns the number of entries printed.
pub async fn run(
    source: Box<dyn EventSource>,
    exclusions: ExclusionSet,
    format: OutputFormat,
    out: &mut impl Write,
    cancel: CancellationToken,
) -> anyhow::Result<usize> {
    let mut store = FeedStore::new(exclusions);
    let (tx, mut rx) = mpsc::channel::<EventBatch>(BATCH_CHANNEL_CAPACITY);

    let mut bridge = SubscriptionBridge::new();
    let handle = bridge.subscribe(source, tx);
    let mut printed = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("headless run cancelled");
                bridge.unsubscribe();
                break;
            }
            batch = rx.recv() => {
                let Some(batch) = batch else { break };
                let before = store.state().len();
                if !store.apply(&batch) {
                    continue;
                }
                let state = store.state();
                let added = state.len() - before;
                // Within a batch, feed order is delivery order.
                for entry in &state.entries()[..added] {
                    write_entry(out, entry, format)?;
                }
                out.flush()?;
                printed += added;
            }
        }
    }

    if let Some(Err(e)) = handle.join().await {
        return Err(e.into());
    }
    Ok(printed)
}
