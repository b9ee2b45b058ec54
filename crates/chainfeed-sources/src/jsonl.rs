//! Newline-delimited JSON source (stdin or a file).
//!
//! Every non-blank line is one batch in one of the shapes described in
//! [`crate::wire`]. Lines that do not parse are logged and skipped; EOF ends
//! the source cleanly.

use std::path::Path;

use async_trait::async_trait;
use chainfeed_core::EventBatch;
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{forward, wire, EventSource, SourceError};

pub struct JsonLinesSource {
    name: String,
    reader: Box<dyn AsyncBufRead + Send + Unpin>,
}

impl JsonLinesSource {
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl AsyncBufRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// Read batches from the process's standard input.
    ///
    /// The read itself runs on tokio's blocking pool. Cancelling ends the
    /// source, but a read already in flight stays parked until a line or EOF.
    pub fn stdin() -> Self {
        Self::from_reader("stdin", BufReader::new(tokio::io::stdin()))
    }

    /// Read batches from a file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }
}

#[async_trait]
impl EventSource for JsonLinesSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<EventBatch>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        let name = self.name;
        let mut lines = self.reader.lines();
        let mut line_no: u64 = 0;

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                tracing::debug!(source = %name, lines = line_no, "reached end of input");
                return Ok(());
            };
            line_no += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match wire::batch_from_str(line, Utc::now()) {
                Ok(batch) => forward(&tx, batch).await?,
                Err(e) => {
                    tracing::warn!(source = %name, line = line_no, error = %e, "skipping malformed line");
                }
            }
        }
    }
}
