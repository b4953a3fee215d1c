//! End-to-end request pipeline.
//!
//! Control flow for one inbound message:
//! text → normalizer → task classifier → dispatcher (one solver invocation)
//! → response formatter → history update → reply.
//!
//! One logical handler per message, no locking here: the history store's
//! sharded map keeps different users on disjoint keys. Engine calls are
//! synchronous and CPU-bound; no timeout bounds a solver invocation and no
//! failure is ever retried — each request is solved once or reported failed
//! once.

use crate::classify::classify;
use crate::config::BotConfig;
use crate::engine::CalcEngine;
use crate::format::Formatter;
use crate::history::HistoryStore;
use crate::normalize::normalize;
use crate::solve::{SolveContext, SolverRegistry};
use crate::transport::{Query, Reply};

/// The assembled request pipeline. Owns the engine, the solver registry, the
/// history store, and the formatter.
#[derive(Debug)]
pub struct MathPipeline {
    engine: CalcEngine,
    registry: SolverRegistry,
    history: HistoryStore,
    formatter: Formatter,
    default_var: String,
}

impl MathPipeline {
    pub fn new(config: BotConfig) -> Self {
        Self {
            engine: CalcEngine::with_max_lhopital(config.max_lhopital),
            registry: SolverRegistry::with_builtins(),
            history: HistoryStore::new(config.history_cap),
            formatter: Formatter::new(config.decorated_replies),
            default_var: config.default_variable,
        }
    }

    /// Handle one inbound query and produce the reply.
    pub fn handle(&self, query: &Query) -> Reply {
        let normalized = normalize(&query.text);
        let task = classify(&query.text);
        tracing::info!(
            user = %query.user_id,
            %task,
            normalized = %normalized,
            "dispatching query"
        );

        let ctx = SolveContext {
            engine: &self.engine,
            default_var: &self.default_var,
        };
        let outcome = self.registry.dispatch(task, normalized.as_str(), &ctx);

        self.formatter
            .format_reply(&outcome, query, &self.engine, &self.history)
    }

    /// Render the user's recent history (the "History" quick reply).
    pub fn history_reply(&self, user_id: &str) -> Reply {
        self.formatter.format_history(user_id, &self.history)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn engine(&self) -> &CalcEngine {
        &self.engine
    }
}

impl Default for MathPipeline {
    fn default() -> Self {
        Self::new(BotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(pipeline: &MathPipeline, text: &str) -> Reply {
        pipeline.handle(&Query::new("tester", "chat", text))
    }

    #[test]
    fn numeric_request_round_trips() {
        let pipeline = MathPipeline::default();
        let reply = ask(&pipeline, "2 + 3 * 4");
        assert!(reply.text.contains("14"));
        assert_eq!(pipeline.history().len("tester"), 1);
    }

    #[test]
    fn symbolic_request_round_trips() {
        let pipeline = MathPipeline::default();
        let reply = ask(&pipeline, "diff(x**2, x)");
        assert!(reply.text.contains("2*x"));
    }

    #[test]
    fn failed_request_reports_once_and_skips_history() {
        let pipeline = MathPipeline::default();
        let reply = ask(&pipeline, "???");
        assert!(reply.text.contains("could not work that one out"));
        assert!(pipeline.history().is_empty("tester"));
    }

    #[test]
    fn config_default_variable_reaches_solvers() {
        let config = BotConfig {
            default_variable: "t".to_string(),
            ..BotConfig::default()
        };
        let pipeline = MathPipeline::new(config);
        // Bare derivative request differentiates with respect to t.
        let reply = pipeline.handle(&Query::new("tester", "chat", "diff(t**2)"));
        assert!(reply.text.contains("2*t"));
    }

    #[test]
    fn history_reply_reflects_solves() {
        let pipeline = MathPipeline::default();
        ask(&pipeline, "2 + 2");
        let view = pipeline.history_reply("tester");
        assert!(view.text.contains("2 + 2"));
    }
}
