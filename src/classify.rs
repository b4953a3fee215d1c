//! Task-type detection for incoming math requests.
//!
//! Keyword-membership classification that works without any language model.
//! The cue sets are checked against the **original, pre-normalization** text
//! (lowercased), so localized keywords are still visible — normalization
//! rewrites them away before the solvers run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The recognized problem categories, each routed to a dedicated solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Derivative,
    Integral,
    Limit,
    Equation,
    Factor,
    Expand,
    /// Default when no cue set matches: a plain simplify pass.
    General,
}

impl TaskType {
    /// Human-readable label for tracing and history rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Derivative => "derivative",
            Self::Integral => "integral",
            Self::Limit => "limit",
            Self::Equation => "equation",
            Self::Factor => "factor",
            Self::Expand => "expand",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Cue sets carry English stems, Russian stems, and explicit call prefixes.
// Stems rather than full words so inflected forms ("производную",
// "уравнения") still match.
const DERIVATIVE_CUES: &[&str] = &["производн", "дифференцир", "derivative", "differentiate", "diff("];
const INTEGRAL_CUES: &[&str] = &["интеграл", "первообразн", "integral", "integrate", "∫"];
const LIMIT_CUES: &[&str] = &["предел", "limit", "lim("];
const EQUATION_CUES: &[&str] = &["уравнен", "equation", "solve", "="];
const FACTOR_CUES: &[&str] = &["разлож", "множител", "factor"];
const EXPAND_CUES: &[&str] = &["раскр", "скобк", "expand"];

/// Classify a raw query into exactly one [`TaskType`].
///
/// Cue sets are evaluated in fixed priority order — derivative > integral >
/// limit > equation > factor > expand — and the first set with any substring
/// match wins. An input carrying both "derivative" and "solve" cues is a
/// derivative task. No match at all resolves silently to [`TaskType::General`].
pub fn classify(original: &str) -> TaskType {
    let lower = original.to_lowercase();
    let sets: [(TaskType, &[&str]); 6] = [
        (TaskType::Derivative, DERIVATIVE_CUES),
        (TaskType::Integral, INTEGRAL_CUES),
        (TaskType::Limit, LIMIT_CUES),
        (TaskType::Equation, EQUATION_CUES),
        (TaskType::Factor, FACTOR_CUES),
        (TaskType::Expand, EXPAND_CUES),
    ];
    for (task, cues) in sets {
        if cues.iter().any(|cue| lower.contains(cue)) {
            return task;
        }
    }
    TaskType::General
}
