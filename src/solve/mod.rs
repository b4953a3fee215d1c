//! Task solver dispatch: one solver per task type, plus a numeric fast path.
//!
//! # Architecture
//!
//! - [`Solver`] trait: `handles(TaskType) -> bool`, `solve(&str, &SolveContext) -> Result<Solution>`
//! - [`SolverRegistry`]: holds the registered solvers, runs the numeric fast
//!   path, executes the matching solver, converts any failure into
//!   [`Outcome::Failed`]
//! - Built-in solvers: `DerivativeSolver`, `IntegralSolver`, `LimitSolver`,
//!   `EquationSolver`, `FactorSolver`, `ExpandSolver`, `GeneralSolver`
//!
//! Every solver extracts its parameters from the canonical string (call-form
//! extraction first, a bare-expression fallback second), parses the pieces
//! through the engine's restricted-vocabulary parser, invokes one engine
//! operation, and logs one human-readable step per meaningful transformation.
//! Failures never carry a partial result: the registry boundary converts any
//! parse or engine fault into `Outcome::Failed` and the detail goes to the
//! tracing log only.

use std::fmt;

use serde::Serialize;

use crate::classify::TaskType;
use crate::engine::{CalcEngine, Expr};
use crate::error::{SeshatError, SeshatResult, SolveError};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What produced a solution: the numeric fast path or a task solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolutionKind {
    Numeric,
    Task(TaskType),
}

impl fmt::Display for SolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => f.write_str("numeric"),
            Self::Task(task) => f.write_str(task.label()),
        }
    }
}

/// The engine-owned value of a solution. Opaque to the pipeline; the
/// formatter only ever consumes its string projection.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionValue {
    Single(Expr),
    /// A solution set from equation solving; may be empty.
    Set(Vec<Expr>),
}

impl SolutionValue {
    pub fn render(&self, engine: &CalcEngine) -> String {
        match self {
            Self::Single(e) => engine.render(e),
            Self::Set(items) => engine.render_solutions(items),
        }
    }
}

/// One successful solver invocation: the value plus the ordered step log.
#[derive(Debug, Clone)]
pub struct Solution {
    pub kind: SolutionKind,
    pub value: SolutionValue,
    pub steps: Vec<String>,
}

/// Outcome of dispatching one request. Failure carries no partial result;
/// the error detail has already been logged at the solver boundary.
#[derive(Debug)]
pub enum Outcome {
    Solved(Solution),
    Failed,
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }
}

/// Shared per-request context handed to every solver.
pub struct SolveContext<'a> {
    pub engine: &'a CalcEngine,
    /// Variable assumed when a request names none.
    pub default_var: &'a str,
}

// ---------------------------------------------------------------------------
// Solver trait
// ---------------------------------------------------------------------------

/// A task-specific solving strategy.
pub trait Solver: Send + Sync {
    /// Human-readable name for tracing.
    fn name(&self) -> &'static str;

    /// Whether this solver handles the given task type.
    fn handles(&self, task: TaskType) -> bool;

    /// Solve the canonical input, appending one step per transformation.
    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution>;
}

impl fmt::Debug for dyn Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Solver({})", self.name())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of task solvers with fast-path-first dispatch.
pub struct SolverRegistry {
    solvers: Vec<Box<dyn Solver>>,
}

impl fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.solvers.iter().map(|s| s.name()).collect();
        f.debug_struct("SolverRegistry").field("solvers", &names).finish()
    }
}

impl SolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { solvers: Vec::new() }
    }

    /// Create a registry pre-populated with all built-in solvers.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(Box::new(DerivativeSolver));
        reg.register(Box::new(IntegralSolver));
        reg.register(Box::new(LimitSolver));
        reg.register(Box::new(EquationSolver));
        reg.register(Box::new(FactorSolver));
        reg.register(Box::new(ExpandSolver));
        reg.register(Box::new(GeneralSolver));
        reg
    }

    pub fn register(&mut self, solver: Box<dyn Solver>) {
        self.solvers.push(solver);
    }

    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }

    pub fn solver_names(&self) -> Vec<&str> {
        self.solvers.iter().map(|s| s.name()).collect()
    }

    /// Dispatch one request: numeric fast path first, then the task solver.
    ///
    /// Any parse or engine failure is caught here, logged, and converted to
    /// [`Outcome::Failed`] — nothing propagates to the formatter as a fault.
    pub fn dispatch(&self, task: TaskType, input: &str, ctx: &SolveContext<'_>) -> Outcome {
        if let Some(solution) = numeric_fast_path(input, ctx.engine) {
            return Outcome::Solved(solution);
        }

        let Some(solver) = self.solvers.iter().find(|s| s.handles(task)) else {
            tracing::warn!(%task, "no solver registered for task");
            return Outcome::Failed;
        };

        match solver.solve(input, ctx) {
            Ok(solution) => Outcome::Solved(solution),
            Err(err) => {
                tracing::debug!(solver = solver.name(), %err, input, "solver failed");
                Outcome::Failed
            }
        }
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Numeric fast path
// ---------------------------------------------------------------------------

/// Restricted numeric evaluation for letter-free input.
///
/// Runs before symbolic dispatch. Declines (returns `None`) on any alphabetic
/// character or when evaluation does not fold to a plain number, letting the
/// symbolic solvers take over.
fn numeric_fast_path(input: &str, engine: &CalcEngine) -> Option<Solution> {
    if input.is_empty() || input.chars().any(char::is_alphabetic) {
        return None;
    }
    let value = engine.eval_numeric(input).ok()?;
    value.as_number()?;
    let rendered = engine.render(&value);
    Some(Solution {
        kind: SolutionKind::Numeric,
        steps: vec![
            format!("Input: `{input}`"),
            format!("Numeric evaluation: `{input} = {rendered}`"),
        ],
        value: SolutionValue::Single(value),
    })
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

/// Arguments of a `name(…)` call, split at top-level commas.
///
/// The call name must sit on a word boundary so `sqrt(diff(x, y))` never
/// misfires on an inner `f(`. `None` when the call is absent or unbalanced.
fn extract_call(input: &str, name: &str) -> Option<Vec<String>> {
    let args_start = find_call(input, name)? + 1;
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut start = args_start;
    for (i, b) in bytes.iter().enumerate().skip(args_start) {
        match *b {
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    args.push(input[start..i].trim().to_string());
                    return Some(args);
                }
                depth -= 1;
            }
            b',' if depth == 0 => {
                args.push(input[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    None
}

/// Byte position of the `(` in a word-boundary occurrence of `name(`.
fn find_call(input: &str, name: &str) -> Option<usize> {
    let needle = format!("{name}(");
    let mut search = 0;
    while let Some(rel) = input[search..].find(&needle) {
        let at = search + rel;
        if at == 0 || !input.as_bytes()[at - 1].is_ascii_alphanumeric() {
            return Some(at + name.len());
        }
        search = at + 1;
    }
    None
}

/// Strip a leading bare token (e.g. `diff ` in `diff x**2 + 3*x`).
///
/// `None` when the token is absent, glued to an identifier, or nothing
/// follows it.
fn strip_prefix_token<'a>(input: &'a str, token: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(token)?;
    let boundary = rest.chars().next().is_some_and(|c| !c.is_ascii_alphanumeric());
    boundary.then(|| rest.trim_start()).filter(|r| !r.is_empty())
}

/// Validate an extracted variable name against the engine's allow-list.
fn variable_arg(name: &str, ctx: &SolveContext<'_>, task: &'static str) -> Result<String, SolveError> {
    let trimmed = name.trim();
    if ctx.engine.symbol_table().is_variable(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(SolveError::MalformedCall {
            task,
            input: name.to_string(),
        })
    }
}

fn malformed(task: &'static str, input: &str) -> SeshatError {
    SolveError::MalformedCall {
        task,
        input: input.to_string(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// Derivative
// ---------------------------------------------------------------------------

/// Handles `diff(f, v)` calls and bare `diff f` requests.
pub struct DerivativeSolver;

impl Solver for DerivativeSolver {
    fn name(&self) -> &'static str {
        "derivative"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Derivative
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let (func_text, var) = match extract_call(input, "diff") {
            Some(args) => match args.as_slice() {
                [f] => (f.clone(), ctx.default_var.to_string()),
                [f, v] => (f.clone(), variable_arg(v, ctx, "derivative")?),
                _ => return Err(malformed("derivative", input)),
            },
            None => {
                let rest = strip_prefix_token(input, "diff").unwrap_or(input);
                (rest.to_string(), ctx.default_var.to_string())
            }
        };

        let f = ctx.engine.parse(&func_text)?;
        steps.push(format!("Function: `{}`", ctx.engine.render(&f)));
        steps.push(format!("Variable: `{var}`"));

        let derivative = ctx.engine.differentiate(&f, &var)?;
        steps.push(format!("Derivative: `{}`", ctx.engine.render(&derivative)));

        let simplified = ctx.engine.simplify(&derivative);
        let result = if simplified != derivative {
            steps.push(format!("Simplified: `{}`", ctx.engine.render(&simplified)));
            simplified
        } else {
            derivative
        };

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Derivative),
            value: SolutionValue::Single(result),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Integral
// ---------------------------------------------------------------------------

/// Handles `integrate(f, v)` calls and bare `integrate f dx` requests, with
/// the trailing differential token stripped in the fallback path.
pub struct IntegralSolver;

impl Solver for IntegralSolver {
    fn name(&self) -> &'static str {
        "integral"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Integral
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let (func_text, var) = match extract_call(input, "integrate") {
            Some(args) => match args.as_slice() {
                [f] => (f.clone(), ctx.default_var.to_string()),
                [f, v] => (f.clone(), variable_arg(v, ctx, "integral")?),
                _ => return Err(malformed("integral", input)),
            },
            None => {
                let rest = strip_prefix_token(input, "integrate").unwrap_or(input);
                match rest.rsplit_once(' ') {
                    Some((head, tail))
                        if tail.len() == 2
                            && tail.starts_with('d')
                            && ctx.engine.symbol_table().is_variable(&tail[1..]) =>
                    {
                        (head.trim().to_string(), tail[1..].to_string())
                    }
                    _ => (rest.to_string(), ctx.default_var.to_string()),
                }
            }
        };

        let f = ctx.engine.parse(&func_text)?;
        steps.push(format!("Function: `{}`", ctx.engine.render(&f)));
        steps.push(format!("Variable: `{var}`"));

        let integral = ctx.engine.integrate(&f, &var)?;
        steps.push(format!("Integral: `{}`", ctx.engine.render(&integral)));

        let simplified = ctx.engine.simplify(&integral);
        let result = if simplified != integral {
            steps.push(format!("Simplified: `{}`", ctx.engine.render(&simplified)));
            simplified
        } else {
            integral
        };

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Integral),
            value: SolutionValue::Single(result),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Limit
// ---------------------------------------------------------------------------

/// Handles `limit(f, v, point)` — exactly three arguments. Natural-language
/// arrow phrasings reach this form through the normalizer's arrow collapse.
pub struct LimitSolver;

impl Solver for LimitSolver {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Limit
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let args = extract_call(input, "limit").ok_or_else(|| malformed("limit", input))?;
        let [f_text, var_text, point_text] = args.as_slice() else {
            return Err(malformed("limit", input));
        };

        let f = ctx.engine.parse(f_text)?;
        let var = variable_arg(var_text, ctx, "limit")?;
        let point = ctx.engine.parse(point_text)?;
        steps.push(format!("Function: `{}`", ctx.engine.render(&f)));
        steps.push(format!("Variable: `{var}`"));
        steps.push(format!("Point: `{}`", ctx.engine.render(&point)));

        let value = ctx.engine.limit(&f, &var, &point)?;
        steps.push(format!("Limit: `{}`", ctx.engine.render(&value)));

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Limit),
            value: SolutionValue::Single(value),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Equation
// ---------------------------------------------------------------------------

/// Handles `solve(expr, v)` calls, bare `lhs = rhs` equations (rewritten to
/// `lhs - rhs = 0`), and bare expressions (implicitly `= 0`).
pub struct EquationSolver;

impl EquationSolver {
    /// Turn an equation text into the `= 0` form the engine solves.
    fn equation_expr(text: &str, ctx: &SolveContext<'_>) -> Result<Expr, SeshatError> {
        match text.split_once('=') {
            Some((lhs, rhs)) => {
                let l = ctx.engine.parse(lhs.trim())?;
                let r = ctx.engine.parse(rhs.trim())?;
                Ok(ctx.engine.simplify(&Expr::sub(l, r)))
            }
            None => Ok(ctx.engine.parse(text)?),
        }
    }
}

impl Solver for EquationSolver {
    fn name(&self) -> &'static str {
        "equation"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Equation
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let (equation, var) = match extract_call(input, "solve") {
            Some(args) => match args.as_slice() {
                [e] => (Self::equation_expr(e, ctx)?, ctx.default_var.to_string()),
                [e, v] => (Self::equation_expr(e, ctx)?, variable_arg(v, ctx, "equation")?),
                _ => return Err(malformed("equation", input)),
            },
            None => {
                // A bare "solve" token may remain from phrase rewriting.
                let rest = strip_prefix_token(input, "solve").unwrap_or(input);
                (Self::equation_expr(rest, ctx)?, ctx.default_var.to_string())
            }
        };

        steps.push(format!("Equation: `{} = 0`", ctx.engine.render(&equation)));
        steps.push(format!("Variable: `{var}`"));

        let solutions = ctx.engine.solve(&equation, &var)?;
        steps.push(format!(
            "Solutions: `{}`",
            ctx.engine.render_solutions(&solutions)
        ));

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Equation),
            value: SolutionValue::Set(solutions),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Factor
// ---------------------------------------------------------------------------

/// Handles `factor(expr)` calls and bare `factor expr` requests.
pub struct FactorSolver;

impl Solver for FactorSolver {
    fn name(&self) -> &'static str {
        "factor"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Factor
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let expr_text = match extract_call(input, "factor") {
            Some(args) => match args.as_slice() {
                [e] => e.clone(),
                _ => return Err(malformed("factor", input)),
            },
            None => strip_prefix_token(input, "factor").unwrap_or(input).to_string(),
        };

        let expr = ctx.engine.parse(&expr_text)?;
        steps.push(format!("Expression: `{}`", ctx.engine.render(&expr)));

        let factored = ctx.engine.factor(&expr)?;
        steps.push(format!("Factored: `{}`", ctx.engine.render(&factored)));

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Factor),
            value: SolutionValue::Single(factored),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Expand
// ---------------------------------------------------------------------------

/// Handles `expand(expr)` calls and bare `expand expr` requests.
pub struct ExpandSolver;

impl Solver for ExpandSolver {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::Expand
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        let expr_text = match extract_call(input, "expand") {
            Some(args) => match args.as_slice() {
                [e] => e.clone(),
                _ => return Err(malformed("expand", input)),
            },
            None => strip_prefix_token(input, "expand").unwrap_or(input).to_string(),
        };

        let expr = ctx.engine.parse(&expr_text)?;
        steps.push(format!("Expression: `{}`", ctx.engine.render(&expr)));

        let expanded = ctx.engine.expand(&expr)?;
        steps.push(format!("Expanded: `{}`", ctx.engine.render(&expanded)));

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::Expand),
            value: SolutionValue::Single(expanded),
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

/// Fallback for unclassified requests: a simplify-then-factor pass over the
/// whole expression.
pub struct GeneralSolver;

impl Solver for GeneralSolver {
    fn name(&self) -> &'static str {
        "general"
    }

    fn handles(&self, task: TaskType) -> bool {
        task == TaskType::General
    }

    fn solve(&self, input: &str, ctx: &SolveContext<'_>) -> SeshatResult<Solution> {
        let mut steps = vec![format!("Input: `{input}`")];

        // A bare "simplify" token may remain from phrase rewriting.
        let rest = strip_prefix_token(input, "simplify").unwrap_or(input);

        let expr = ctx.engine.parse(rest)?;
        steps.push(format!("Expression: `{}`", ctx.engine.render(&expr)));

        let simplified = ctx.engine.simplify(&expr);
        steps.push(format!("Simplified: `{}`", ctx.engine.render(&simplified)));

        let result = match ctx.engine.factor(&simplified) {
            Ok(factored) if factored != simplified => {
                steps.push(format!("Factored: `{}`", ctx.engine.render(&factored)));
                factored
            }
            _ => simplified,
        };

        Ok(Solution {
            kind: SolutionKind::Task(TaskType::General),
            value: SolutionValue::Single(result),
            steps,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_engine() -> CalcEngine {
        CalcEngine::new()
    }

    fn dispatch(task: TaskType, input: &str) -> Outcome {
        let engine = ctx_engine();
        let ctx = SolveContext {
            engine: &engine,
            default_var: "x",
        };
        SolverRegistry::with_builtins().dispatch(task, input, &ctx)
    }

    fn solved_value(outcome: Outcome) -> String {
        let engine = ctx_engine();
        match outcome {
            Outcome::Solved(solution) => solution.value.render(&engine),
            Outcome::Failed => panic!("expected a solution"),
        }
    }

    // --- Registry ---

    #[test]
    fn registry_with_builtins_has_all_solvers() {
        let reg = SolverRegistry::with_builtins();
        let names = reg.solver_names();
        for expected in ["derivative", "integral", "limit", "equation", "factor", "expand", "general"] {
            assert!(names.contains(&expected), "missing solver {expected}");
        }
        assert_eq!(reg.len(), 7);
    }

    #[test]
    fn empty_registry_fails_cleanly() {
        let engine = ctx_engine();
        let ctx = SolveContext {
            engine: &engine,
            default_var: "x",
        };
        let reg = SolverRegistry::new();
        assert!(!reg.dispatch(TaskType::General, "x + 1", &ctx).is_solved());
    }

    // --- Numeric fast path ---

    #[test]
    fn numeric_fast_path_short_circuits() {
        let outcome = dispatch(TaskType::General, "2 + 3 * 4");
        let Outcome::Solved(solution) = outcome else {
            panic!("expected numeric solution");
        };
        assert_eq!(solution.kind, SolutionKind::Numeric);
        assert_eq!(solution.value.render(&ctx_engine()), "14");
    }

    #[test]
    fn numeric_fast_path_declines_symbolic_input() {
        let outcome = dispatch(TaskType::General, "x + 1");
        let Outcome::Solved(solution) = outcome else {
            panic!("expected general solution");
        };
        assert_eq!(solution.kind, SolutionKind::Task(TaskType::General));
    }

    #[test]
    fn numeric_fast_path_runs_regardless_of_task() {
        // Classification noise cannot defeat a pure-arithmetic input.
        let outcome = dispatch(TaskType::Equation, "2*(3+5)/4");
        let Outcome::Solved(solution) = outcome else {
            panic!("expected numeric solution");
        };
        assert_eq!(solution.kind, SolutionKind::Numeric);
    }

    // --- Derivative ---

    #[test]
    fn derivative_call_form() {
        assert_eq!(solved_value(dispatch(TaskType::Derivative, "diff(x**2, x)")), "2*x");
    }

    #[test]
    fn derivative_bare_token_fallback() {
        assert_eq!(
            solved_value(dispatch(TaskType::Derivative, "diff x**2 + 3*x")),
            "2*x + 3"
        );
    }

    #[test]
    fn derivative_single_argument_uses_default_variable() {
        assert_eq!(solved_value(dispatch(TaskType::Derivative, "diff(x**3)")), "3*x**2");
    }

    #[test]
    fn derivative_rejects_unknown_variable() {
        assert!(!dispatch(TaskType::Derivative, "diff(x**2, q)").is_solved());
    }

    // --- Integral ---

    #[test]
    fn integral_call_form() {
        assert_eq!(
            solved_value(dispatch(TaskType::Integral, "integrate(x**2, x)")),
            "x**3/3"
        );
    }

    #[test]
    fn integral_fallback_strips_differential() {
        assert_eq!(
            solved_value(dispatch(TaskType::Integral, "integrate x**2 dx")),
            "x**3/3"
        );
    }

    // --- Limit ---

    #[test]
    fn limit_call_form() {
        assert_eq!(
            solved_value(dispatch(TaskType::Limit, "limit(sin(x)/x, x, 0)")),
            "1"
        );
    }

    #[test]
    fn limit_requires_exactly_three_arguments() {
        assert!(!dispatch(TaskType::Limit, "limit(sin(x)/x, x)").is_solved());
        assert!(!dispatch(TaskType::Limit, "limit sin(x)/x").is_solved());
    }

    // --- Equation ---

    #[test]
    fn equation_call_form() {
        assert_eq!(
            solved_value(dispatch(TaskType::Equation, "solve(x**2 - 4, x)")),
            "[-2, 2]"
        );
    }

    #[test]
    fn equation_bare_equals_form() {
        assert_eq!(
            solved_value(dispatch(TaskType::Equation, "x**2 - 4 = 0")),
            "[-2, 2]"
        );
    }

    #[test]
    fn equation_moves_rhs_across() {
        assert_eq!(
            solved_value(dispatch(TaskType::Equation, "x**2 = 4")),
            "[-2, 2]"
        );
    }

    #[test]
    fn equation_bare_expression_is_implicitly_zero() {
        assert_eq!(
            solved_value(dispatch(TaskType::Equation, "2*x - 6")),
            "[3]"
        );
    }

    #[test]
    fn equation_without_real_roots_still_solves() {
        assert_eq!(
            solved_value(dispatch(TaskType::Equation, "x**2 + 1 = 0")),
            "[]"
        );
    }

    // --- Factor / Expand ---

    #[test]
    fn factor_call_and_bare_forms() {
        assert_eq!(
            solved_value(dispatch(TaskType::Factor, "factor(x**2 - 4)")),
            "(x - 2)*(x + 2)"
        );
        assert_eq!(
            solved_value(dispatch(TaskType::Factor, "factor x**2 - 4")),
            "(x - 2)*(x + 2)"
        );
    }

    #[test]
    fn expand_call_form() {
        assert_eq!(
            solved_value(dispatch(TaskType::Expand, "expand((x + 2)**2)")),
            "x**2 + 4*x + 4"
        );
    }

    // --- General ---

    #[test]
    fn general_simplifies_and_logs_both_forms() {
        let Outcome::Solved(solution) = dispatch(TaskType::General, "x + x + 0") else {
            panic!("expected solution");
        };
        assert_eq!(solution.value.render(&ctx_engine()), "2*x");
        assert!(solution.steps.iter().any(|s| s.starts_with("Expression:")));
        assert!(solution.steps.iter().any(|s| s.starts_with("Simplified:")));
    }

    #[test]
    fn general_strips_bare_simplify_token() {
        assert_eq!(
            solved_value(dispatch(TaskType::General, "simplify x + x")),
            "2*x"
        );
    }

    // --- Failure conversion ---

    #[test]
    fn parse_failure_becomes_failed_outcome() {
        assert!(!dispatch(TaskType::General, "???").is_solved());
        assert!(!dispatch(TaskType::Derivative, "diff(unknown_name, x)").is_solved());
    }

    #[test]
    fn engine_failure_becomes_failed_outcome() {
        // No closed-form antiderivative in the table.
        assert!(!dispatch(TaskType::Integral, "integrate(x*sin(x), x)").is_solved());
    }

    // --- Extraction helpers ---

    #[test]
    fn extract_call_splits_top_level_commas_only() {
        let args = extract_call("limit(f(x, y), x, 0)", "limit").unwrap();
        assert_eq!(args, vec!["f(x, y)", "x", "0"]);
    }

    #[test]
    fn extract_call_requires_word_boundary() {
        assert!(extract_call("undiff(x)", "diff").is_none());
        assert!(extract_call("diff(x)", "diff").is_some());
    }

    #[test]
    fn extract_call_rejects_unbalanced_input() {
        assert!(extract_call("diff(x**2, x", "diff").is_none());
    }

    #[test]
    fn strip_prefix_token_respects_boundaries() {
        assert_eq!(strip_prefix_token("diff x**2", "diff"), Some("x**2"));
        assert_eq!(strip_prefix_token("diffuse x", "diff"), None);
        assert_eq!(strip_prefix_token("diff", "diff"), None);
    }
}
