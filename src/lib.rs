//! # seshat
//!
//! A conversational math assistant core: free-form natural-language and
//! symbolic math requests are normalized into a canonical algebraic form,
//! classified, dispatched to a task-specific solver, and answered with a
//! step-annotated explanation.
//!
//! ## Architecture
//!
//! - **Normalizer** (`normalize`): ordered pipeline of pure string rewrite
//!   stages — localized keywords, glyphs, and superscripts become canonical
//!   ASCII notation
//! - **Task classifier** (`classify`): keyword cues over the original text,
//!   fixed priority order, six categories plus a general default
//! - **Solver dispatch** (`solve`): a numeric fast path plus one solver per
//!   task type, each invoking the computation engine and logging steps
//! - **Computation engine** (`engine`): restricted-vocabulary parser, exact
//!   rational arithmetic, calculus and polynomial algebra, e-graph
//!   canonicalization via `egg`
//! - **History** (`history`): injected per-user bounded log of successful
//!   solves
//! - **Transport seam** (`transport`): the chat collaborator's contract only
//!
//! ## Library usage
//!
//! ```
//! use seshat::config::BotConfig;
//! use seshat::pipeline::MathPipeline;
//! use seshat::transport::Query;
//!
//! let pipeline = MathPipeline::new(BotConfig::default());
//! let reply = pipeline.handle(&Query::new("alice", "chat-1", "2 + 3 * 4"));
//! assert!(reply.text.contains("14"));
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod normalize;
pub mod pipeline;
pub mod solve;
pub mod transport;
