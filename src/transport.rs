//! Chat-transport contract: inbound queries, outbound replies, reply sinks.
//!
//! The transport itself (message delivery, button rendering, session polling)
//! is an opaque collaborator — only its contract is modeled here. Replies can
//! be rendered by different sinks: terminal, newline-delimited JSON, or
//! collected in memory for testing.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Inbound ─────────────────────────────────────────────────────────────

/// One inbound chat message. Ephemeral: lives for the duration of a single
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Submitter identifier; scopes the history log.
    pub user_id: String,
    /// Conversation identifier, echoed back to the transport.
    pub chat_id: String,
    /// Raw request text.
    pub text: String,
    /// Receipt time.
    pub received_at: DateTime<Utc>,
}

impl Query {
    pub fn new(
        user_id: impl Into<String>,
        chat_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: chat_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

// ── Outbound ────────────────────────────────────────────────────────────

/// One outbound reply: formatted text plus labeled quick-reply actions for
/// the transport to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_quick_replies(text: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            text: text.into(),
            quick_replies: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

// ── ReplySink trait ─────────────────────────────────────────────────────

/// A destination for outbound replies.
pub trait ReplySink: Send + Sync {
    /// Signal an ephemeral "composing" indicator. Default: no-op.
    fn composing(&self, _chat_id: &str) {}

    /// Deliver a single reply.
    fn send(&self, chat_id: &str, reply: &Reply);
}

// ── StdoutSink ──────────────────────────────────────────────────────────

/// Renders replies as plain terminal output.
pub struct StdoutSink;

impl ReplySink for StdoutSink {
    fn composing(&self, chat_id: &str) {
        tracing::debug!(chat_id, "composing");
    }

    fn send(&self, _chat_id: &str, reply: &Reply) {
        println!("{}", reply.text);
        if !reply.quick_replies.is_empty() {
            let labels: Vec<String> = reply
                .quick_replies
                .iter()
                .map(|label| format!("[{label}]"))
                .collect();
            println!("{}", labels.join(" "));
        }
    }
}

// ── JsonSink ────────────────────────────────────────────────────────────

/// Emits replies as newline-delimited JSON (for a streaming transport).
pub struct JsonSink;

impl ReplySink for JsonSink {
    fn send(&self, chat_id: &str, reply: &Reply) {
        let line = serde_json::json!({ "chat_id": chat_id, "reply": reply });
        if let Ok(json) = serde_json::to_string(&line) {
            println!("{json}");
        }
    }
}

// ── VecSink ─────────────────────────────────────────────────────────────

/// Collects replies in memory for testing.
pub struct VecSink {
    replies: Mutex<Vec<(String, Reply)>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
        }
    }

    /// All collected `(chat_id, reply)` pairs.
    pub fn replies(&self) -> Vec<(String, Reply)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplySink for VecSink {
    fn send(&self, chat_id: &str, reply: &Reply) {
        self.replies
            .lock()
            .unwrap()
            .push((chat_id.to_string(), reply.clone()));
    }
}
