//! WebSocket JSON-RPC source.
//!
//! Sends one subscribe request, then treats every notification for the
//! returned subscription id as a batch (see [`crate::wire`] for the accepted
//! `result` shapes). On cancellation the matching unsubscribe request is sent
//! best-effort before the socket is closed. A dropped connection ends the
//! source with [`SourceError::Disconnected`]; it is not re-established.

use async_trait::async_trait;
use chainfeed_core::EventBatch;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::{forward, wire, EventSource, SourceError};

const SUBSCRIBE_ID: u64 = 1;
const UNSUBSCRIBE_ID: u64 = 2;

/// Configuration for [`WsSource`].
#[derive(Debug, Clone)]
pub struct WsSourceConfig {
    /// Endpoint, e.g. `ws://127.0.0.1:9944`.
    pub url: String,
    /// Subscribe method, e.g. `chainfeed_subscribeEvents`.
    pub method: String,
    pub params: Vec<Value>,
    /// Unsubscribe method. Defaults to `method` with its first `subscribe`
    /// replaced by `unsubscribe`.
    pub unsubscribe_method: Option<String>,
}

impl WsSourceConfig {
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            params: Vec::new(),
            unsubscribe_method: None,
        }
    }

    fn unsubscribe_method(&self) -> String {
        self.unsubscribe_method
            .clone()
            .unwrap_or_else(|| self.method.replacen("subscribe", "unsubscribe", 1))
    }
}

pub struct WsSource {
    config: WsSourceConfig,
}

impl WsSource {
    pub fn new(config: WsSourceConfig) -> Self {
        Self { config }
    }
}

/// A classified server message.
#[derive(Debug, PartialEq)]
enum Incoming {
    /// Response to our subscribe request. The id is kept as sent so the
    /// unsubscribe request can echo it back unchanged.
    Subscribed(Value),
    /// Error response to one of our requests.
    RpcError { code: i64, message: String },
    /// Subscription notification.
    Notification { subscription: Value, result: Value },
    /// Anything else (unsubscribe ack, unrelated responses).
    Other,
}

/// Subscription ids are strings or numbers. Anything else is not an id.
fn subscription_id(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) | Value::Number(_) => Some(value.clone()),
        _ => None,
    }
}

fn unsubscribe_request(config: &WsSourceConfig, id: Value) -> Message {
    request(UNSUBSCRIBE_ID, &config.unsubscribe_method(), vec![id])
}

fn classify(text: &str) -> Incoming {
    let Ok(val) = serde_json::from_str::<Value>(text) else {
        tracing::debug!("failed to parse WS message as JSON");
        return Incoming::Other;
    };

    if let Some(params) = val.get("params") {
        if val.get("method").is_some() {
            let Some(subscription) = params.get("subscription").and_then(subscription_id) else {
                return Incoming::Other;
            };
            return Incoming::Notification {
                subscription,
                result: params.get("result").cloned().unwrap_or(Value::Null),
            };
        }
    }

    if let Some(err) = val.get("error") {
        return Incoming::RpcError {
            code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
    }

    if val.get("id").and_then(Value::as_u64) == Some(SUBSCRIBE_ID) {
        if let Some(id) = val.get("result").and_then(subscription_id) {
            return Incoming::Subscribed(id);
        }
    }

    Incoming::Other
}

fn request(id: u64, method: &str, params: Vec<Value>) -> Message {
    let req = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });
    Message::Text(req.to_string().into())
}

#[async_trait]
impl EventSource for WsSource {
    fn name(&self) -> &str {
        &self.config.url
    }

    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<EventBatch>,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        let config = self.config;
        tracing::info!(url = %config.url, method = %config.method, "connecting via WebSocket");

        let (ws_stream, _) = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            conn = tokio_tungstenite::connect_async(config.url.as_str()) => conn?,
        };
        let (mut sink, mut stream) = ws_stream.split();

        sink.send(request(SUBSCRIBE_ID, &config.method, config.params.clone()))
            .await?;

        let mut subscription: Option<Value> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Some(id) = subscription.take() {
                        if let Err(e) = sink.send(unsubscribe_request(&config, id)).await {
                            tracing::debug!(error = %e, "unsubscribe request failed");
                        }
                    }
                    let _ = sink.close().await;
                    return Ok(());
                }
                msg = stream.next() => match msg {
                    None | Some(Ok(Message::Close(_))) => {
                        tracing::warn!(url = %config.url, "WS disconnected");
                        return Err(SourceError::Disconnected);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(Message::Text(text))) => match classify(text.as_str()) {
                        Incoming::Subscribed(id) => {
                            tracing::info!(subscription = %id, "subscribed");
                            subscription = Some(id);
                        }
                        Incoming::RpcError { code, message } => {
                            return Err(SourceError::Rpc { code, message });
                        }
                        Incoming::Notification { subscription: id, result } => {
                            if subscription.as_ref() != Some(&id) {
                                tracing::debug!(subscription = %id, "notification for unknown subscription");
                                continue;
                            }
                            match wire::batch_from_value(result, Utc::now()) {
                                Ok(batch) => forward(&tx, batch).await?,
                                Err(e) => tracing::warn!(error = %e, "skipping malformed notification"),
                            }
                        }
                        Incoming::Other => {}
                    },
                    Some(Ok(_)) => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unsubscribe_method_is_derived() {
        let cfg = WsSourceConfig::new("ws://x", "chainfeed_subscribeEvents");
        assert_eq!(cfg.unsubscribe_method(), "chainfeed_unsubscribeEvents");

        let mut cfg = WsSourceConfig::new("ws://x", "state_subscribeStorage");
        assert_eq!(cfg.unsubscribe_method(), "state_unsubscribeStorage");
        cfg.unsubscribe_method = Some("custom_stop".into());
        assert_eq!(cfg.unsubscribe_method(), "custom_stop");
    }

    #[test]
    fn classify_subscribe_ack() {
        assert_eq!(
            classify(r#"{"jsonrpc":"2.0","id":1,"result":"abc"}"#),
            Incoming::Subscribed(json!("abc"))
        );
        assert_eq!(
            classify(r#"{"jsonrpc":"2.0","id":1,"result":42}"#),
            Incoming::Subscribed(json!(42))
        );
    }

    #[test]
    fn classify_notification() {
        let msg = r#"{"jsonrpc":"2.0","method":"chainfeed_events","params":{"subscription":"abc","result":[{"section":"a","method":"b"}]}}"#;
        match classify(msg) {
            Incoming::Notification { subscription, result } => {
                assert_eq!(subscription, json!("abc"));
                assert!(result.is_array());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_error_and_other() {
        assert_eq!(
            classify(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#),
            Incoming::RpcError {
                code: -32601,
                message: "Method not found".into()
            }
        );
        assert_eq!(classify(r#"{"jsonrpc":"2.0","id":2,"result":true}"#), Incoming::Other);
        assert_eq!(classify("not json"), Incoming::Other);
    }

    #[test]
    fn unsubscribe_echoes_numeric_id() {
        let cfg = WsSourceConfig::new("ws://x", "chainfeed_subscribeEvents");
        let Message::Text(body) = unsubscribe_request(&cfg, json!(42)) else {
            panic!("expected a text frame");
        };
        let sent: Value = serde_json::from_str(body.as_str()).unwrap();
        assert_eq!(sent["method"], "chainfeed_unsubscribeEvents");
        assert_eq!(sent["params"], json!([42]));
    }
}
