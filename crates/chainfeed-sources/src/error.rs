//! Error types for event sources.

use thiserror::Error;

/// Errors a source can end with. The bridge does not retry on any of them.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("connection closed by remote")]
    Disconnected,

    #[error("batch channel closed")]
    ChannelClosed,

    #[error("source task failed: {0}")]
    Task(String),
}
