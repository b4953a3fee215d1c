//! Calculus operations: differentiation, integration, limits.
//!
//! Differentiation is fully mechanical. Integration is table-driven over
//! expanded sums of monomials plus the standard function table with linear
//! inner arguments. Limits use direct substitution with a numerator/denominator
//! split and bounded L'Hôpital iteration for the 0/0 case.

use crate::engine::algebra::{expand, poly_coeffs};
use crate::engine::ast::{Expr, FuncKind, Rational};
use crate::engine::render::render;
use crate::engine::simplify::simplify;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Replace every occurrence of `var` with `replacement`.
pub fn subst(e: &Expr, var: &str, replacement: &Expr) -> Expr {
    match e {
        Expr::Num(_) | Expr::Const(_) => e.clone(),
        Expr::Sym(s) => {
            if s == var {
                replacement.clone()
            } else {
                e.clone()
            }
        }
        Expr::Add(items) => Expr::Add(items.iter().map(|i| subst(i, var, replacement)).collect()),
        Expr::Mul(items) => Expr::Mul(items.iter().map(|i| subst(i, var, replacement)).collect()),
        Expr::Pow(base, exp) => Expr::pow(
            subst(base, var, replacement),
            subst(exp, var, replacement),
        ),
        Expr::Func(kind, arg) => Expr::func(*kind, subst(arg, var, replacement)),
    }
}

// ---------------------------------------------------------------------------
// Differentiation
// ---------------------------------------------------------------------------

/// Differentiate `e` with respect to `var` and simplify the result.
pub fn differentiate(e: &Expr, var: &str) -> Result<Expr, EngineError> {
    Ok(simplify(&diff(e, var)?))
}

fn diff(e: &Expr, var: &str) -> Result<Expr, EngineError> {
    match e {
        Expr::Num(_) | Expr::Const(_) => Ok(Expr::zero()),
        Expr::Sym(s) => Ok(if s == var { Expr::one() } else { Expr::zero() }),
        Expr::Add(items) => {
            let terms = items
                .iter()
                .map(|i| diff(i, var))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Add(terms))
        }
        Expr::Mul(items) => {
            // Generalized product rule: Σᵢ fᵢ' · Πⱼ≠ᵢ fⱼ
            let mut terms = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let d = diff(item, var)?;
                let mut factors = vec![d];
                for (j, other) in items.iter().enumerate() {
                    if i != j {
                        factors.push(other.clone());
                    }
                }
                terms.push(Expr::Mul(factors));
            }
            Ok(Expr::Add(terms))
        }
        Expr::Pow(base, exp) => diff_pow(base, exp, var),
        Expr::Func(kind, arg) => {
            let outer = func_derivative(*kind, arg)
                .ok_or_else(|| EngineError::UnsupportedDerivative { expr: render(e) })?;
            let inner = diff(arg, var)?;
            Ok(Expr::Mul(vec![outer, inner]))
        }
    }
}

fn diff_pow(base: &Expr, exp: &Expr, var: &str) -> Result<Expr, EngineError> {
    let base_dep = base.contains_sym(var);
    let exp_dep = exp.contains_sym(var);

    if !base_dep && !exp_dep {
        return Ok(Expr::zero());
    }

    if !exp_dep {
        // d(f^n) = n · f^(n-1) · f'
        let n_minus_one = Expr::sub(exp.clone(), Expr::one());
        return Ok(Expr::Mul(vec![
            exp.clone(),
            Expr::pow(base.clone(), n_minus_one),
            diff(base, var)?,
        ]));
    }

    if !base_dep {
        // d(a^g) = a^g · log(a) · g'
        return Ok(Expr::Mul(vec![
            Expr::pow(base.clone(), exp.clone()),
            Expr::func(FuncKind::Log, base.clone()),
            diff(exp, var)?,
        ]));
    }

    // Full logarithmic derivative: f^g · (g'·log f + g·f'/f)
    let g_prime = diff(exp, var)?;
    let f_prime = diff(base, var)?;
    Ok(Expr::Mul(vec![
        Expr::pow(base.clone(), exp.clone()),
        Expr::Add(vec![
            Expr::Mul(vec![g_prime, Expr::func(FuncKind::Log, base.clone())]),
            Expr::Mul(vec![
                exp.clone(),
                f_prime,
                Expr::pow(base.clone(), Expr::num(-1)),
            ]),
        ]),
    ]))
}

/// Derivative of the outer function evaluated at its argument.
///
/// `None` for functions with no smooth derivative in the table (abs).
fn func_derivative(kind: FuncKind, arg: &Expr) -> Option<Expr> {
    let u = arg.clone();
    Some(match kind {
        FuncKind::Sin => Expr::func(FuncKind::Cos, u),
        FuncKind::Cos => Expr::neg(Expr::func(FuncKind::Sin, u)),
        FuncKind::Tan => Expr::pow(Expr::func(FuncKind::Cos, u), Expr::num(-2)),
        FuncKind::Log => Expr::pow(u, Expr::num(-1)),
        FuncKind::Exp => Expr::func(FuncKind::Exp, u),
        FuncKind::Sqrt => Expr::Mul(vec![
            Expr::Num(Rational::new(1, 2).unwrap_or(Rational::ONE)),
            Expr::pow(Expr::func(FuncKind::Sqrt, u), Expr::num(-1)),
        ]),
        FuncKind::Abs => return None,
    })
}

// ---------------------------------------------------------------------------
// Integration
// ---------------------------------------------------------------------------

/// Integrate `e` with respect to `var` and simplify the result.
///
/// The integrand is expanded first so polynomial products reduce to sums of
/// monomials the power rule can handle.
pub fn integrate(e: &Expr, var: &str) -> Result<Expr, EngineError> {
    let prepared = simplify(&expand(e)?);
    Ok(simplify(&integ(&prepared, var)?))
}

fn integ(e: &Expr, var: &str) -> Result<Expr, EngineError> {
    if !e.contains_sym(var) {
        return Ok(Expr::Mul(vec![e.clone(), Expr::sym(var)]));
    }

    match e {
        Expr::Sym(_) => {
            // ∫ x dx = x²/2 — the power rule's n = 1 case.
            Ok(Expr::Mul(vec![
                Expr::Num(Rational::new(1, 2).unwrap_or(Rational::ONE)),
                Expr::pow(Expr::sym(var), Expr::num(2)),
            ]))
        }
        Expr::Add(items) => {
            let terms = items
                .iter()
                .map(|i| integ(i, var))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Add(terms))
        }
        Expr::Mul(items) => {
            let (dependent, constant): (Vec<&Expr>, Vec<&Expr>) =
                items.iter().partition(|i| i.contains_sym(var));
            if dependent.len() != 1 {
                return Err(EngineError::UnsupportedIntegral { expr: render(e) });
            }
            let inner = integ(dependent[0], var)?;
            let mut factors: Vec<Expr> = constant.into_iter().cloned().collect();
            factors.push(inner);
            Ok(Expr::Mul(factors))
        }
        Expr::Pow(base, exp) => integ_pow(base, exp, var).ok_or_else(|| {
            EngineError::UnsupportedIntegral { expr: render(e) }
        }),
        Expr::Func(kind, arg) => {
            // Linear inner argument: ∫ f(a·x + b) dx = F(a·x + b) / a
            let slope = linear_slope(arg, var)
                .ok_or_else(|| EngineError::UnsupportedIntegral { expr: render(e) })?;
            let antiderivative = func_antiderivative(*kind, arg)
                .ok_or_else(|| EngineError::UnsupportedIntegral { expr: render(e) })?;
            let inv = slope
                .recip()
                .ok_or_else(|| EngineError::UnsupportedIntegral { expr: render(e) })?;
            Ok(Expr::Mul(vec![Expr::Num(inv), antiderivative]))
        }
        _ => Err(EngineError::UnsupportedIntegral { expr: render(e) }),
    }
}

fn integ_pow(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    // Power rule: base is exactly the variable, numeric exponent.
    if matches!(base, Expr::Sym(s) if s == var) {
        let n = exp.as_number()?;
        if n == Rational::integer(-1) {
            return Some(Expr::func(FuncKind::Log, Expr::sym(var)));
        }
        let next = n.add(&Rational::ONE);
        let inv = next.recip()?;
        return Some(Expr::Mul(vec![
            Expr::Num(inv),
            Expr::pow(Expr::sym(var), Expr::Num(next)),
        ]));
    }

    // Exponential rule: ∫ a^x dx = a^x / log(a), for constant a.
    if !base.contains_sym(var) && matches!(exp, Expr::Sym(s) if s == var) {
        return Some(Expr::Mul(vec![
            Expr::pow(base.clone(), exp.clone()),
            Expr::pow(Expr::func(FuncKind::Log, base.clone()), Expr::num(-1)),
        ]));
    }

    None
}

/// Slope `a` when `arg` is linear in `var` (its derivative is a constant).
fn linear_slope(arg: &Expr, var: &str) -> Option<Rational> {
    let d = differentiate(arg, var).ok()?;
    let a = d.as_number()?;
    (!a.is_zero()).then_some(a)
}

/// Antiderivative table, evaluated at the (linear) inner argument.
fn func_antiderivative(kind: FuncKind, arg: &Expr) -> Option<Expr> {
    let u = arg.clone();
    Some(match kind {
        FuncKind::Sin => Expr::neg(Expr::func(FuncKind::Cos, u)),
        FuncKind::Cos => Expr::func(FuncKind::Sin, u),
        FuncKind::Tan => Expr::neg(Expr::func(FuncKind::Log, Expr::func(FuncKind::Cos, u))),
        FuncKind::Exp => Expr::func(FuncKind::Exp, u),
        FuncKind::Log => Expr::sub(
            Expr::Mul(vec![u.clone(), Expr::func(FuncKind::Log, u)]),
            arg.clone(),
        ),
        FuncKind::Sqrt => Expr::Mul(vec![
            Expr::Num(Rational::new(2, 3)?),
            Expr::pow(u, Expr::Num(Rational::new(3, 2)?)),
        ]),
        FuncKind::Abs => return None,
    })
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Take the limit of `e` as `var` approaches `point`.
///
/// `max_lhopital` bounds the 0/0 differentiation passes.
pub fn limit(
    e: &Expr,
    var: &str,
    point: &Expr,
    max_lhopital: usize,
) -> Result<Expr, EngineError> {
    let f = simplify(e);
    if !f.contains_sym(var) {
        return Ok(f);
    }

    match infinity_sign(point) {
        Some(sign) => limit_at_infinity(&f, var, sign),
        None => limit_finite(&f, var, point, max_lhopital),
    }
}

/// `Some(1)` for +oo, `Some(-1)` for -oo, `None` for finite points.
fn infinity_sign(point: &Expr) -> Option<i64> {
    match simplify(point) {
        Expr::Const(crate::engine::ast::MathConst::Infinity) => Some(1),
        Expr::Mul(factors) => {
            let mut sign = 1i64;
            let mut infinite = false;
            for f in factors {
                match f {
                    Expr::Num(r) => sign *= r.signum(),
                    Expr::Const(crate::engine::ast::MathConst::Infinity) => infinite = true,
                    _ => return None,
                }
            }
            infinite.then_some(sign)
        }
        _ => None,
    }
}

fn limit_finite(
    f: &Expr,
    var: &str,
    point: &Expr,
    budget: usize,
) -> Result<Expr, EngineError> {
    let (num, den) = split_fraction(f);
    let num_val = simplify(&subst(&num, var, point));

    let Some(den) = den else {
        if is_defined(&num_val) {
            return Ok(num_val);
        }
        return Err(EngineError::UnsupportedLimit { expr: render(f) });
    };

    let den_val = simplify(&subst(&den, var, point));
    let num_zero = num_val.as_number().is_some_and(|r| r.is_zero());
    let den_zero = den_val.as_number().is_some_and(|r| r.is_zero());

    if num_zero && den_zero {
        if budget == 0 {
            return Err(EngineError::UnsupportedLimit { expr: render(f) });
        }
        let num_d = differentiate(&num, var)?;
        let den_d = differentiate(&den, var)?;
        let next = simplify(&Expr::div(num_d, den_d));
        return limit_finite(&next, var, point, budget - 1);
    }

    if den_zero {
        // Nonzero over zero: pole. Two-sided sign is not tracked.
        return Ok(Expr::infinity());
    }

    let ratio = simplify(&Expr::div(num_val, den_val));
    if is_defined(&ratio) {
        return Ok(ratio);
    }
    Err(EngineError::UnsupportedLimit { expr: render(f) })
}

fn limit_at_infinity(f: &Expr, var: &str, sign: i64) -> Result<Expr, EngineError> {
    let (num, den) = split_fraction(f);
    let num_coeffs =
        poly_coeffs(&num, var).ok_or_else(|| EngineError::UnsupportedLimit { expr: render(f) })?;
    let den_coeffs = match &den {
        Some(d) => poly_coeffs(d, var)
            .ok_or_else(|| EngineError::UnsupportedLimit { expr: render(f) })?,
        None => vec![Rational::ONE],
    };

    let dn = degree(&num_coeffs);
    let dd = degree(&den_coeffs);
    let lead_n = num_coeffs.get(dn).copied().unwrap_or(Rational::ZERO);
    let lead_d = den_coeffs.get(dd).copied().unwrap_or(Rational::ONE);

    if lead_n.is_zero() {
        return Ok(Expr::zero());
    }

    if dn < dd {
        return Ok(Expr::zero());
    }
    if dn == dd {
        let ratio = lead_n
            .checked_div(&lead_d)
            .ok_or_else(|| EngineError::DivisionByZero { expr: render(f) })?;
        return Ok(Expr::Num(ratio));
    }

    // Dominant term: sign of (leading ratio) · signⁿ for the excess degree.
    let excess = (dn - dd) as u32;
    let parity = if excess % 2 == 0 { 1 } else { sign };
    let direction = lead_n.signum() * lead_d.signum() * parity;
    Ok(if direction >= 0 {
        Expr::infinity()
    } else {
        Expr::neg_infinity()
    })
}

/// Polynomial degree with trailing zero coefficients ignored.
fn degree(coeffs: &[Rational]) -> usize {
    coeffs
        .iter()
        .rposition(|c| !c.is_zero())
        .unwrap_or(0)
}

/// Split a simplified expression into numerator and optional denominator,
/// pulling out factors with negative numeric exponents.
fn split_fraction(f: &Expr) -> (Expr, Option<Expr>) {
    let factors: Vec<Expr> = match f {
        Expr::Mul(items) => items.clone(),
        other => vec![other.clone()],
    };

    let mut num = Vec::new();
    let mut den = Vec::new();
    for factor in factors {
        match &factor {
            Expr::Pow(base, exp) => match exp.as_number() {
                Some(r) if r.is_negative() => {
                    den.push(simplify(&Expr::pow(
                        base.as_ref().clone(),
                        Expr::Num(r.neg()),
                    )));
                }
                _ => num.push(factor),
            },
            _ => num.push(factor),
        }
    }

    let numerator = match num.len() {
        0 => Expr::one(),
        1 => num.remove(0),
        _ => Expr::Mul(num),
    };
    let denominator = match den.len() {
        0 => None,
        1 => Some(den.remove(0)),
        _ => Some(Expr::Mul(den)),
    };
    (numerator, denominator)
}

/// Whether a substituted-and-simplified value is free of undefined forms.
fn is_defined(e: &Expr) -> bool {
    match e {
        Expr::Num(_) | Expr::Sym(_) | Expr::Const(_) => true,
        Expr::Add(items) | Expr::Mul(items) => items.iter().all(is_defined),
        Expr::Pow(base, exp) => {
            let base_zero = base.as_number().is_some_and(|r| r.is_zero());
            let exp_neg = exp.as_number().is_some_and(|r| r.is_negative());
            if base_zero && exp_neg {
                return false;
            }
            is_defined(base) && is_defined(exp)
        }
        Expr::Func(FuncKind::Log, arg) => {
            !arg.as_number().is_some_and(|r| r.is_zero()) && is_defined(arg)
        }
        Expr::Func(_, arg) => is_defined(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::{parse_expression, SymbolTable};
    use crate::engine::render::render;

    fn expr(input: &str) -> Expr {
        parse_expression(input, &SymbolTable::default()).unwrap()
    }

    #[test]
    fn derivative_of_power() {
        let d = differentiate(&expr("x**2"), "x").unwrap();
        assert_eq!(render(&d), "2*x");
    }

    #[test]
    fn derivative_of_polynomial() {
        let d = differentiate(&expr("x**2 + 3*x"), "x").unwrap();
        assert_eq!(render(&d), "2*x + 3");
    }

    #[test]
    fn derivative_chain_rule() {
        let d = differentiate(&expr("sin(x**2)"), "x").unwrap();
        assert_eq!(render(&d), "2*x*cos(x**2)");
    }

    #[test]
    fn derivative_product_rule() {
        let d = differentiate(&expr("x*sin(x)"), "x").unwrap();
        // x·cos(x) + sin(x)
        assert!(d.contains_sym("x"));
        assert_eq!(render(&d), "x*cos(x) + sin(x)");
    }

    #[test]
    fn derivative_of_exp_and_log() {
        assert_eq!(render(&differentiate(&expr("exp(x)"), "x").unwrap()), "exp(x)");
        assert_eq!(render(&differentiate(&expr("log(x)"), "x").unwrap()), "1/x");
    }

    #[test]
    fn derivative_of_abs_is_unsupported() {
        assert!(matches!(
            differentiate(&expr("Abs(x)"), "x"),
            Err(EngineError::UnsupportedDerivative { .. })
        ));
    }

    #[test]
    fn integral_power_rule() {
        let i = integrate(&expr("x**2"), "x").unwrap();
        assert_eq!(render(&i), "x**3/3");
    }

    #[test]
    fn integral_of_sum() {
        let i = integrate(&expr("2*x + 1"), "x").unwrap();
        assert_eq!(render(&i), "x**2 + x");
    }

    #[test]
    fn integral_of_reciprocal_is_log() {
        let i = integrate(&expr("1/x"), "x").unwrap();
        assert_eq!(render(&i), "log(x)");
    }

    #[test]
    fn integral_of_sin_with_linear_argument() {
        let i = integrate(&expr("sin(2*x)"), "x").unwrap();
        assert_eq!(render(&i), "-cos(2*x)/2");
    }

    #[test]
    fn integral_of_product_is_unsupported() {
        assert!(matches!(
            integrate(&expr("x*sin(x)"), "x"),
            Err(EngineError::UnsupportedIntegral { .. })
        ));
    }

    #[test]
    fn limit_by_substitution() {
        let l = limit(&expr("x**2 + 1"), "x", &expr("2"), 4).unwrap();
        assert_eq!(l, Expr::num(5));
    }

    #[test]
    fn limit_sin_x_over_x() {
        let l = limit(&expr("sin(x)/x"), "x", &expr("0"), 4).unwrap();
        assert_eq!(l, Expr::one());
    }

    #[test]
    fn limit_removable_singularity() {
        let l = limit(&expr("(x**2 - 4)/(x - 2)"), "x", &expr("2"), 4).unwrap();
        assert_eq!(l, Expr::num(4));
    }

    #[test]
    fn limit_pole_is_infinite() {
        let l = limit(&expr("1/x"), "x", &expr("0"), 4).unwrap();
        assert_eq!(l, Expr::infinity());
    }

    #[test]
    fn limit_rational_function_at_infinity() {
        let table = SymbolTable::default();
        let point = parse_expression("oo", &table).unwrap();
        assert_eq!(
            limit(&expr("(2*x**2 + 1)/(x**2 + 3)"), "x", &point, 4).unwrap(),
            Expr::num(2)
        );
        assert_eq!(limit(&expr("1/x"), "x", &point, 4).unwrap(), Expr::zero());
        assert_eq!(
            limit(&expr("x**2"), "x", &point, 4).unwrap(),
            Expr::infinity()
        );
    }

    #[test]
    fn substitution_replaces_all_occurrences() {
        let e = expr("x**2 + x");
        let s = simplify(&subst(&e, "x", &Expr::num(3)));
        assert_eq!(s, Expr::num(12));
    }
}
