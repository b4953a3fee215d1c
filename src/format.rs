//! Reply formatting and history recording.
//!
//! The formatter turns a dispatch [`Outcome`] into one outbound [`Reply`] and
//! appends a [`HistoryEntry`] on success only — failed queries never touch
//! history. Failures render a single generic message with fixed suggestions;
//! the underlying error detail stays in the tracing log and is never shown to
//! the user.

use crate::engine::CalcEngine;
use crate::history::{HistoryEntry, HistoryStore, HISTORY_VIEW_LIMIT};
use crate::solve::Outcome;
use crate::transport::{Query, Reply};

/// Quick-reply labels attached to every reply, for the transport to render.
pub const QUICK_REPLIES: &[&str] = &["Solve another", "History", "Help"];

const SUGGESTIONS: &[&str] = &[
    "2 + 3 * 4",
    "diff(x**2, x)",
    "integrate(x**2, x)",
    "limit(sin(x)/x, x, 0)",
    "solve(x**2 - 4, x)",
];

/// Renders solutions and failures into chat replies.
#[derive(Debug, Clone)]
pub struct Formatter {
    decorated: bool,
}

impl Formatter {
    pub fn new(decorated: bool) -> Self {
        Self { decorated }
    }

    /// Render an outcome; on success, record a history entry for the user.
    pub fn format_reply(
        &self,
        outcome: &Outcome,
        query: &Query,
        engine: &CalcEngine,
        history: &HistoryStore,
    ) -> Reply {
        match outcome {
            Outcome::Solved(solution) => {
                let rendered = solution.value.render(engine);

                let mut text = String::new();
                if self.decorated {
                    text.push_str("Solution\n--------\n");
                }
                for step in &solution.steps {
                    text.push_str(step);
                    text.push('\n');
                }
                if self.decorated {
                    text.push_str(&format!("\nFinal answer:\n```\n{rendered}\n```"));
                } else {
                    text.push_str(&format!("\nFinal answer: {rendered}"));
                }

                history.record(
                    &query.user_id,
                    HistoryEntry {
                        timestamp: query.received_at,
                        query: query.text.clone(),
                        result: rendered,
                        kind: solution.kind,
                    },
                );

                Reply::with_quick_replies(text, QUICK_REPLIES)
            }
            Outcome::Failed => {
                let mut text =
                    String::from("I could not work that one out. Try a request like:\n");
                for suggestion in SUGGESTIONS {
                    text.push_str(&format!("- `{suggestion}`\n"));
                }
                Reply::with_quick_replies(text, QUICK_REPLIES)
            }
        }
    }

    /// Render the user's recent history for the "History" quick reply.
    pub fn format_history(&self, user_id: &str, history: &HistoryStore) -> Reply {
        Reply::with_quick_replies(
            history.render_recent(user_id, HISTORY_VIEW_LIMIT),
            QUICK_REPLIES,
        )
    }
}
