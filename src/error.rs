//! Rich diagnostic error types for the seshat pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. The solver registry converts all of
//! these into [`crate::solve::Outcome::Failed`]; nothing below the formatter
//! ever surfaces a raw fault to the end user.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the seshat core.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum SeshatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used across the crate.
pub type SeshatResult<T> = std::result::Result<T, SeshatError>;

// ---------------------------------------------------------------------------
// Expression parsing errors
// ---------------------------------------------------------------------------

/// Errors from the restricted-vocabulary expression parser.
#[derive(Debug, Error, Diagnostic)]
pub enum ExprError {
    #[error("empty expression")]
    #[diagnostic(
        code(seshat::expr::empty),
        help("Provide a non-empty algebraic expression, e.g. `2 + 3 * 4` or `x**2 - 4`.")
    )]
    Empty,

    #[error("unexpected character '{found}' at byte {position}")]
    #[diagnostic(
        code(seshat::expr::unexpected_char),
        help(
            "Only digits, identifiers, and the operators + - * / ** ( ) , \
             are recognized in canonical form. Re-check the input for stray symbols."
        )
    )]
    UnexpectedChar { found: char, position: usize },

    #[error("unexpected token '{found}' at byte {position}")]
    #[diagnostic(
        code(seshat::expr::unexpected_token),
        help("The expression is malformed at this point. Check operator placement and parentheses.")
    )]
    UnexpectedToken { found: String, position: usize },

    #[error("expression ended unexpectedly")]
    #[diagnostic(
        code(seshat::expr::unexpected_end),
        help("The expression is incomplete — likely a missing operand or unbalanced parenthesis.")
    )]
    UnexpectedEnd,

    #[error("trailing input '{rest}' after a complete expression")]
    #[diagnostic(
        code(seshat::expr::trailing_input),
        help("The parser consumed a full expression but input remained. Check for a missing operator.")
    )]
    TrailingInput { rest: String },

    #[error("unknown symbol '{name}'")]
    #[diagnostic(
        code(seshat::expr::unknown_symbol),
        help(
            "Only the allow-listed vocabulary is resolvable: variables x, y, z, t; \
             functions sin, cos, tan, log, exp, sqrt, abs; constants pi, e, oo. \
             Arbitrary identifiers are rejected by design."
        )
    )]
    UnknownSymbol { name: String },

    #[error("invalid numeric literal '{literal}'")]
    #[diagnostic(
        code(seshat::expr::invalid_number),
        help("Numeric literals must be integers or simple decimals like 3.14.")
    )]
    InvalidNumber { literal: String },
}

// ---------------------------------------------------------------------------
// Computation engine errors
// ---------------------------------------------------------------------------

/// Errors raised by the symbolic computation operations.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("cannot differentiate '{expr}'")]
    #[diagnostic(
        code(seshat::engine::unsupported_derivative),
        help("Differentiation of this form is not implemented (e.g. abs at a corner point).")
    )]
    UnsupportedDerivative { expr: String },

    #[error("no closed-form antiderivative found for '{expr}'")]
    #[diagnostic(
        code(seshat::engine::unsupported_integral),
        help(
            "The integrator handles sums of monomials and the standard table \
             (sin, cos, tan, exp, log, sqrt, 1/x) with linear inner arguments. \
             Rewrite the integrand or split it into supported pieces."
        )
    )]
    UnsupportedIntegral { expr: String },

    #[error("limit of '{expr}' could not be determined")]
    #[diagnostic(
        code(seshat::engine::unsupported_limit),
        help(
            "Direct substitution and repeated L'Hôpital both failed to resolve \
             the limit. The expression may oscillate or need techniques beyond \
             this engine."
        )
    )]
    UnsupportedLimit { expr: String },

    #[error("'{expr}' is not a polynomial in {variable}")]
    #[diagnostic(
        code(seshat::engine::non_polynomial),
        help(
            "Equation solving, factoring over roots, and degree analysis require \
             a polynomial with numeric coefficients in the solve variable."
        )
    )]
    NonPolynomial { expr: String, variable: String },

    #[error("polynomial degree {degree} exceeds the solvable range")]
    #[diagnostic(
        code(seshat::engine::degree_too_high),
        help("Closed-form solving is implemented up to quadratics (after extracting zero roots).")
    )]
    DegreeTooHigh { degree: usize },

    #[error("division by zero while evaluating '{expr}'")]
    #[diagnostic(
        code(seshat::engine::division_by_zero),
        help("A denominator evaluated to exactly zero. The expression is undefined at this point.")
    )]
    DivisionByZero { expr: String },

    #[error("exponent {exponent} is too large for exact expansion")]
    #[diagnostic(
        code(seshat::engine::exponent_too_large),
        help("Exact expansion folds integer powers only up to a small bound to keep results readable.")
    )]
    ExponentTooLarge { exponent: i64 },
}

// ---------------------------------------------------------------------------
// Solver extraction errors
// ---------------------------------------------------------------------------

/// Errors from task-solver parameter extraction, before the engine is invoked.
#[derive(Debug, Error, Diagnostic)]
pub enum SolveError {
    #[error("malformed {task} request: '{input}'")]
    #[diagnostic(
        code(seshat::solve::malformed_call),
        help(
            "The solver could not extract its parameters from the canonical form. \
             Use an explicit call like diff(x**2, x) or a plain expression."
        )
    )]
    MalformedCall { task: &'static str, input: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading the bot configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    #[diagnostic(
        code(seshat::config::io),
        help("Check that the path exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {message}")]
    #[diagnostic(
        code(seshat::config::parse),
        help("The config must be valid TOML; see BotConfig for the recognized keys.")
    )]
    Parse { message: String },
}
