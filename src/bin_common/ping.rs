//! Exchange heartbeat replies
//!
//! Some feeds (Huobi among them) send `{"ping":1700000000000}` as a text
//! message and drop the connection unless `{"pong":1700000000000}` comes
//! back.

use async_trait::async_trait;
use tether::{MessageHandler, WsWriter};
use tracing::info;

const PING_KEY: &str = r#""ping""#;
const PONG_KEY: &str = r#""pong""#;

/// Reply for a heartbeat message, `None` for anything else
///
/// A heartbeat is either the bare text `ping` or a JSON object carrying a
/// `"ping"` key; only that first key is rewritten.
pub fn pong_reply(text: &str) -> Option<String> {
    if text.trim() == "ping" {
        return Some("pong".to_string());
    }
    text.contains(PING_KEY)
        .then(|| text.replacen(PING_KEY, PONG_KEY, 1))
}

/// Message handler that answers heartbeats and logs everything else
pub struct PingReplier {
    writer: WsWriter,
}

impl PingReplier {
    pub fn new(writer: WsWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl MessageHandler for PingReplier {
    async fn on_message(&self, payload: &[u8]) -> tether::Result<()> {
        let text = String::from_utf8_lossy(payload);
        match pong_reply(&text) {
            Some(reply) => self.writer.write_text(reply).await,
            None => {
                info!("[tail] {}", text);
                Ok(())
            }
        }
    }
}
