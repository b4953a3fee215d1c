//! End-to-end integration tests for the seshat pipeline.
//!
//! These tests exercise the full request path — normalization, task
//! classification, solver dispatch, reply formatting, and history recording —
//! through the public `MathPipeline` API.

use seshat::classify::{classify, TaskType};
use seshat::config::BotConfig;
use seshat::engine::CalcEngine;
use seshat::normalize::normalize;
use seshat::pipeline::MathPipeline;
use seshat::solve::{GeneralSolver, Outcome, SolveContext, Solver};
use seshat::transport::{Query, Reply};

fn pipeline() -> MathPipeline {
    MathPipeline::new(BotConfig::default())
}

fn ask(pipeline: &MathPipeline, user: &str, text: &str) -> Reply {
    pipeline.handle(&Query::new(user, "chat", text))
}

#[test]
fn numeric_fast_path_solves_arithmetic() {
    let p = pipeline();
    let reply = ask(&p, "alice", "2 + 3 * 4");
    assert!(reply.text.contains("Numeric evaluation: `2 + 3 * 4 = 14`"));
    assert!(reply.text.contains("14"));

    let entries = p.history().entries("alice");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].result, "14");
}

#[test]
fn derivative_call_form_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "diff(x**2, x)");
    assert!(reply.text.contains("Derivative: `2*x`"));
}

#[test]
fn localized_derivative_request_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "производная x^2 + 3x");
    assert!(reply.text.contains("2*x + 3"));
}

#[test]
fn equation_with_bare_equals_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "x**2 - 4 = 0");
    assert!(reply.text.contains("Solutions: `[-2, 2]`"));
}

#[test]
fn limit_call_form_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "limit(sin(x)/x, x, 0)");
    assert!(reply.text.contains("Limit: `1`"));
}

#[test]
fn localized_limit_with_arrow_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "предел sin(x)/x при x->0");
    assert!(reply.text.contains("Limit: `1`"));
}

#[test]
fn localized_integral_with_differential_solves() {
    let p = pipeline();
    let reply = ask(&p, "alice", "интеграл x^2 dx");
    assert!(reply.text.contains("x**3/3"));
}

#[test]
fn nonsense_input_fails_generically_without_history() {
    let p = pipeline();
    let reply = ask(&p, "alice", "???");
    assert!(reply.text.contains("could not work that one out"));
    assert!(reply.text.contains("diff(x**2, x)"));
    assert!(p.history().is_empty("alice"));
}

#[test]
fn history_bound_keeps_the_most_recent_entries() {
    let p = pipeline();
    for i in 0..25 {
        let reply = ask(&p, "alice", &format!("{i} + 1"));
        assert!(reply.text.contains("Numeric evaluation"), "query {i} failed");
    }

    let entries = p.history().entries("alice");
    assert_eq!(entries.len(), 20);
    // Oldest five were evicted; the log is insertion-ordered, newest last.
    assert_eq!(entries[0].query, "5 + 1");
    assert_eq!(entries[19].query, "24 + 1");
}

#[test]
fn failure_does_not_mutate_history() {
    let p = pipeline();
    ask(&p, "alice", "2 + 2");
    assert_eq!(p.history().len("alice"), 1);

    ask(&p, "alice", "???");
    assert_eq!(p.history().len("alice"), 1);
}

#[test]
fn history_is_scoped_per_user() {
    let p = pipeline();
    ask(&p, "alice", "2 + 2");
    ask(&p, "bob", "3 + 3");
    assert_eq!(p.history().len("alice"), 1);
    assert_eq!(p.history().len("bob"), 1);
    assert_eq!(p.history().entries("bob")[0].result, "6");
}

#[test]
fn classifier_priority_prefers_derivative_over_equation() {
    assert_eq!(
        classify("solve the derivative of x**2 = 0"),
        TaskType::Derivative
    );
}

#[test]
fn numeric_fast_path_agrees_with_the_general_path() {
    let engine = CalcEngine::new();
    let ctx = SolveContext {
        engine: &engine,
        default_var: "x",
    };
    for input in ["2 + 3 * 4", "2*(3+5)/4", "10 - 3*3", "2**10 / 4"] {
        let fast = engine.render(&engine.eval_numeric(input).unwrap());
        let Ok(solution) = GeneralSolver.solve(input, &ctx) else {
            panic!("general path failed for {input}");
        };
        assert_eq!(
            solution.value.render(&engine),
            fast,
            "paths disagree for {input}"
        );
    }
}

#[test]
fn normalizer_is_idempotent_on_scenario_inputs() {
    let inputs = [
        "2 + 3 * 4",
        "diff(x**2, x)",
        "производная x^2 + 3x",
        "x**2 - 4 = 0",
        "limit(sin(x)/x, x, 0)",
        "предел sin(x)/x при x->0",
        "интеграл x^2 dx",
        "???",
    ];
    for input in inputs {
        let once = normalize(input);
        assert_eq!(normalize(once.as_str()), once, "not idempotent for {input:?}");
    }
}

#[test]
fn history_view_shows_recent_solves_newest_first() {
    let p = pipeline();
    for i in 0..7 {
        ask(&p, "alice", &format!("{i} + 0"));
    }
    let view = p.history_reply("alice");
    assert!(view.text.contains("1. `6 + 0`"));
    assert!(view.text.contains("5. `2 + 0`"));
    assert!(!view.text.contains("`1 + 0`"));
}

#[test]
fn replies_carry_quick_reply_labels() {
    let p = pipeline();
    let ok = ask(&p, "alice", "2 + 2");
    let failed = ask(&p, "alice", "???");
    for reply in [ok, failed] {
        assert_eq!(reply.quick_replies, ["Solve another", "History", "Help"]);
    }
}

#[test]
fn dispatch_failure_is_terminal_per_request() {
    // The same bad request fails identically twice: no retry state anywhere.
    let p = pipeline();
    let first = ask(&p, "alice", "diff(nope, x)");
    let second = ask(&p, "alice", "diff(nope, x)");
    assert_eq!(first.text, second.text);
    assert!(p.history().is_empty("alice"));
}

#[test]
fn general_task_falls_back_to_simplification() {
    let p = pipeline();
    let reply = ask(&p, "alice", "x + x + 0");
    assert!(reply.text.contains("Simplified: `2*x`"));
}

#[test]
fn outcome_reflects_dispatch_result() {
    let engine = CalcEngine::new();
    let ctx = SolveContext {
        engine: &engine,
        default_var: "x",
    };
    let registry = seshat::solve::SolverRegistry::with_builtins();
    assert!(matches!(
        registry.dispatch(TaskType::General, "???", &ctx),
        Outcome::Failed
    ));
    assert!(registry
        .dispatch(TaskType::Derivative, "diff(x**2, x)", &ctx)
        .is_solved());
}
