//! Per-user bounded history of successful solves.
//!
//! An explicitly owned, injected store rather than module-level shared state:
//! the formatter receives a `&HistoryStore` and appends on success only, so
//! per-user isolation and the bound are testable in isolation. Entries live
//! for the process lifetime; nothing is persisted.
//!
//! Concurrent writes from different users land on disjoint map keys. Rapid
//! double-submit by the same user keeps whatever ordering the surrounding
//! scheduler provides.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::solve::SolutionKind;

/// Default per-user bound on stored entries.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// How many entries the rendered history view shows.
pub const HISTORY_VIEW_LIMIT: usize = 5;

/// Result strings longer than this are truncated in the history view.
const RESULT_PREVIEW_CHARS: usize = 50;

/// One successful solve, scoped to one user.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    /// Original query text, before normalization.
    pub query: String,
    /// String projection of the result.
    pub result: String,
    pub kind: SolutionKind,
}

/// Mapping from user identifier to a bounded, insertion-ordered log.
///
/// Invariant: every per-user log holds at most `cap` entries, most-recent
/// last; the oldest entry is evicted on overflow. Logs are created lazily on
/// a user's first recorded solve.
#[derive(Debug)]
pub struct HistoryStore {
    entries: DashMap<String, VecDeque<HistoryEntry>>,
    cap: usize,
}

impl HistoryStore {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: DashMap::new(),
            cap: cap.max(1),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Append an entry for the user, evicting the oldest past the bound.
    pub fn record(&self, user_id: &str, entry: HistoryEntry) {
        let mut log = self.entries.entry(user_id.to_string()).or_default();
        log.push_back(entry);
        while log.len() > self.cap {
            log.pop_front();
        }
    }

    /// Snapshot of a user's log, oldest first.
    pub fn entries(&self, user_id: &str) -> Vec<HistoryEntry> {
        self.entries
            .get(user_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, user_id: &str) -> usize {
        self.entries.get(user_id).map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, user_id: &str) -> bool {
        self.len(user_id) == 0
    }

    /// Render the most recent entries, newest first, results truncated.
    pub fn render_recent(&self, user_id: &str, limit: usize) -> String {
        let entries = self.entries(user_id);
        if entries.is_empty() {
            return "No solved examples yet. Send a math request and it will show up here."
                .to_string();
        }
        let mut out = String::from("Recent solutions:\n");
        for (i, entry) in entries.iter().rev().take(limit).enumerate() {
            out.push_str(&format!(
                "{}. `{}`\n   Result: `{}`\n",
                i + 1,
                entry.query,
                preview(&entry.result)
            ));
        }
        out
    }
}

/// First [`RESULT_PREVIEW_CHARS`] characters, with an ellipsis when cut.
fn preview(result: &str) -> String {
    if result.chars().count() <= RESULT_PREVIEW_CHARS {
        return result.to_string();
    }
    let cut: String = result.chars().take(RESULT_PREVIEW_CHARS).collect();
    format!("{cut}...")
}
