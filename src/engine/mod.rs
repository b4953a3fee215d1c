//! Symbolic computation engine facade.
//!
//! `CalcEngine` owns the restricted symbol vocabulary and exposes the full
//! operation contract the task solvers consume: parse, differentiate,
//! integrate, limit, solve, factor, expand, simplify, and render. Everything
//! below this facade is deterministic, synchronous, and CPU-bound.

pub mod algebra;
pub mod ast;
pub mod calculus;
pub mod parser;
pub mod render;
pub mod rewrite;
pub mod simplify;

pub use ast::{Expr, FuncKind, MathConst, Rational};
pub use parser::SymbolTable;

use crate::error::{EngineError, ExprError};

/// Default bound on L'Hôpital iterations for 0/0 limits.
pub const DEFAULT_MAX_LHOPITAL: usize = 4;

/// The symbolic computation engine.
///
/// Owns the allow-listed [`SymbolTable`]; every string that reaches an engine
/// operation goes through the restricted parser, so user text can only ever
/// resolve to the fixed vocabulary.
#[derive(Debug, Clone)]
pub struct CalcEngine {
    table: SymbolTable,
    max_lhopital: usize,
}

impl Default for CalcEngine {
    fn default() -> Self {
        Self {
            table: SymbolTable::default(),
            max_lhopital: DEFAULT_MAX_LHOPITAL,
        }
    }
}

impl CalcEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom L'Hôpital budget (from [`crate::config::BotConfig`]).
    pub fn with_max_lhopital(max_lhopital: usize) -> Self {
        Self {
            table: SymbolTable::default(),
            max_lhopital,
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    /// Parse a canonical string against the allow-listed vocabulary.
    pub fn parse(&self, text: &str) -> Result<Expr, ExprError> {
        parser::parse_expression(text, &self.table)
    }

    /// Numeric fast-path evaluation: parse and reduce a pure-arithmetic string.
    ///
    /// Callers are expected to have checked that the text contains no
    /// alphabetic characters; the restricted parser enforces it regardless.
    pub fn eval_numeric(&self, text: &str) -> Result<Expr, ExprError> {
        let expr = self.parse(text)?;
        Ok(self.simplify(&expr))
    }

    pub fn differentiate(&self, expr: &Expr, var: &str) -> Result<Expr, EngineError> {
        tracing::debug!(var, "differentiate");
        calculus::differentiate(expr, var)
    }

    pub fn integrate(&self, expr: &Expr, var: &str) -> Result<Expr, EngineError> {
        tracing::debug!(var, "integrate");
        calculus::integrate(expr, var)
    }

    pub fn limit(&self, expr: &Expr, var: &str, point: &Expr) -> Result<Expr, EngineError> {
        tracing::debug!(var, "limit");
        calculus::limit(expr, var, point, self.max_lhopital)
    }

    /// Solve `equation = 0` for `var`; solutions sorted ascending when numeric.
    pub fn solve(&self, equation: &Expr, var: &str) -> Result<Vec<Expr>, EngineError> {
        tracing::debug!(var, "solve");
        algebra::solve_equation(equation, var)
    }

    pub fn factor(&self, expr: &Expr) -> Result<Expr, EngineError> {
        algebra::factor(expr)
    }

    pub fn expand(&self, expr: &Expr) -> Result<Expr, EngineError> {
        algebra::expand(expr)
    }

    /// Canonical simplification: structural fold plus the e-graph pass.
    pub fn simplify(&self, expr: &Expr) -> Expr {
        let folded = simplify::simplify(expr);
        let canonical = rewrite::canonicalize(&folded);
        simplify::fold(&canonical)
    }

    /// Pretty-print an expression.
    pub fn render(&self, expr: &Expr) -> String {
        render::render(expr)
    }

    /// Pretty-print a solution set.
    pub fn render_solutions(&self, solutions: &[Expr]) -> String {
        render::render_list(solutions)
    }
}
