//! Polynomial algebra: expansion, equation solving, factoring.
//!
//! Solving and factoring work over polynomials with numeric coefficients in a
//! single variable, extracted via [`poly_coeffs`]. Closed forms cover linear
//! and quadratic equations, plus higher degrees that reduce to those after
//! pulling out zero roots.

use crate::engine::ast::{Expr, FuncKind, Rational};
use crate::engine::render::render;
use crate::engine::simplify::{numeric_then_structural, simplify};
use crate::error::EngineError;

/// Largest integer power of a sum that `expand` multiplies out exactly.
const MAX_EXPAND_POW: i64 = 32;

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Multiply out all products of sums and small integer powers of sums.
pub fn expand(e: &Expr) -> Result<Expr, EngineError> {
    Ok(simplify(&expand_node(e)?))
}

fn expand_node(e: &Expr) -> Result<Expr, EngineError> {
    match e {
        Expr::Num(_) | Expr::Sym(_) | Expr::Const(_) => Ok(e.clone()),
        Expr::Add(items) => {
            let expanded = items
                .iter()
                .map(expand_node)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Add(expanded))
        }
        Expr::Mul(items) => {
            let expanded = items
                .iter()
                .map(expand_node)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(distribute(expanded))
        }
        Expr::Pow(base, exp) => {
            let base = expand_node(base)?;
            let exp = expand_node(exp)?;
            if let Some(n) = exp.as_number().and_then(|r| r.as_integer()) {
                if n >= 2 && matches!(base, Expr::Add(_)) {
                    if n > MAX_EXPAND_POW {
                        return Err(EngineError::ExponentTooLarge { exponent: n });
                    }
                    let mut acc = base.clone();
                    for _ in 1..n {
                        acc = distribute(vec![acc, base.clone()]);
                    }
                    return Ok(acc);
                }
            }
            Ok(Expr::pow(base, exp))
        }
        Expr::Func(kind, arg) => Ok(Expr::func(*kind, expand_node(arg)?)),
    }
}

/// Distribute a product over any sums among its factors.
fn distribute(factors: Vec<Expr>) -> Expr {
    let mut terms: Vec<Vec<Expr>> = vec![Vec::new()];
    for factor in factors {
        match factor {
            Expr::Add(addends) => {
                let mut next = Vec::with_capacity(terms.len() * addends.len());
                for prefix in &terms {
                    for addend in &addends {
                        let mut term = prefix.clone();
                        term.push(addend.clone());
                        next.push(term);
                    }
                }
                terms = next;
            }
            other => {
                for term in &mut terms {
                    term.push(other.clone());
                }
            }
        }
    }

    let mut built: Vec<Expr> = terms
        .into_iter()
        .map(|fs| match fs.len() {
            0 => Expr::one(),
            1 => fs.into_iter().next().unwrap_or(Expr::one()),
            _ => Expr::Mul(fs),
        })
        .collect();

    match built.len() {
        1 => built.pop().unwrap_or(Expr::one()),
        _ => Expr::Add(built),
    }
}

// ---------------------------------------------------------------------------
// Polynomial coefficient extraction
// ---------------------------------------------------------------------------

/// Extract `[c₀, c₁, …]` such that `e = Σ cᵢ·varⁱ` with numeric coefficients.
///
/// `None` when the expression is not such a polynomial (symbolic coefficients,
/// functions of the variable, negative or fractional powers).
pub fn poly_coeffs(e: &Expr, var: &str) -> Option<Vec<Rational>> {
    let prepared = simplify(&expand(e).ok()?);
    let terms: Vec<Expr> = match prepared {
        Expr::Add(items) => items,
        other => vec![other],
    };

    let mut coeffs: Vec<Rational> = vec![Rational::ZERO];
    for term in &terms {
        let (deg, coeff) = monomial(term, var)?;
        if coeffs.len() <= deg {
            coeffs.resize(deg + 1, Rational::ZERO);
        }
        coeffs[deg] = coeffs[deg].add(&coeff);
    }
    Some(coeffs)
}

/// `(degree, coefficient)` of a single monomial in `var`.
fn monomial(term: &Expr, var: &str) -> Option<(usize, Rational)> {
    match term {
        Expr::Num(r) => Some((0, *r)),
        Expr::Sym(s) if s == var => Some((1, Rational::ONE)),
        Expr::Pow(base, exp) => {
            let matches_var = matches!(base.as_ref(), Expr::Sym(s) if s == var);
            let n = exp.as_number()?.as_integer()?;
            (matches_var && n > 0).then_some((n as usize, Rational::ONE))
        }
        Expr::Mul(factors) => {
            let mut coeff = Rational::ONE;
            let mut deg = 0usize;
            for f in factors {
                match f {
                    Expr::Num(r) => coeff = coeff.mul(r),
                    other => {
                        let (d, c) = monomial(other, var)?;
                        if !c.is_one() {
                            return None;
                        }
                        deg += d;
                    }
                }
            }
            Some((deg, coeff))
        }
        _ => None,
    }
}

/// Highest index with a nonzero coefficient.
fn poly_degree(coeffs: &[Rational]) -> usize {
    coeffs.iter().rposition(|c| !c.is_zero()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Equation solving
// ---------------------------------------------------------------------------

/// Solve `e = 0` for `var`. Returns real solutions sorted ascending.
///
/// An empty vector means no (real) solution — still a successful solve.
pub fn solve_equation(e: &Expr, var: &str) -> Result<Vec<Expr>, EngineError> {
    let coeffs = poly_coeffs(e, var).ok_or_else(|| EngineError::NonPolynomial {
        expr: render(e),
        variable: var.to_string(),
    })?;

    let deg = poly_degree(&coeffs);
    if deg == 0 {
        // Either 0 = 0 (all values) or c = 0 (none); both render as [].
        return Ok(Vec::new());
    }

    // Pull out zero roots: x^k divides the polynomial.
    let low = coeffs
        .iter()
        .position(|c| !c.is_zero())
        .unwrap_or(0);
    let reduced: Vec<Rational> = coeffs[low..].to_vec();
    let reduced_deg = poly_degree(&reduced);

    let mut roots = match reduced_deg {
        0 => Vec::new(),
        1 => {
            let b = reduced[0];
            let a = reduced[1];
            let root = b.neg().checked_div(&a).ok_or_else(|| {
                EngineError::DivisionByZero { expr: render(e) }
            })?;
            vec![Expr::Num(root)]
        }
        2 => quadratic_roots(reduced[0], reduced[1], reduced[2], e)?,
        d => return Err(EngineError::DegreeTooHigh { degree: d }),
    };

    if low > 0 {
        roots.push(Expr::zero());
    }

    roots.sort_by(numeric_then_structural);
    roots.dedup();
    Ok(roots)
}

/// Real roots of `a·x² + b·x + c = 0` (the coefficient order is c, b, a).
fn quadratic_roots(
    c: Rational,
    b: Rational,
    a: Rational,
    origin: &Expr,
) -> Result<Vec<Expr>, EngineError> {
    let four_ac = Rational::integer(4).mul(&a).mul(&c);
    let disc = b.mul(&b).sub(&four_ac);

    if disc.is_negative() {
        // No real roots; complex solutions are out of scope.
        return Ok(Vec::new());
    }

    let two_a = Rational::integer(2).mul(&a);
    let inv = two_a
        .recip()
        .ok_or_else(|| EngineError::DivisionByZero { expr: render(origin) })?;

    if let Some(s) = disc.perfect_sqrt() {
        let r1 = b.neg().sub(&s).mul(&inv);
        let r2 = b.neg().add(&s).mul(&inv);
        return Ok(vec![Expr::Num(r1), Expr::Num(r2)]);
    }

    // Irrational discriminant: keep the sqrt symbolic.
    let sqrt_d = Expr::func(FuncKind::Sqrt, Expr::Num(disc));
    let minus = simplify(&Expr::Mul(vec![
        Expr::Num(inv),
        Expr::Add(vec![Expr::Num(b.neg()), Expr::neg(sqrt_d.clone())]),
    ]));
    let plus = simplify(&Expr::Mul(vec![
        Expr::Num(inv),
        Expr::Add(vec![Expr::Num(b.neg()), sqrt_d]),
    ]));
    Ok(vec![minus, plus])
}

// ---------------------------------------------------------------------------
// Factoring
// ---------------------------------------------------------------------------

/// Factor a univariate polynomial: content × variable power × rational roots.
///
/// Falls back to the expanded, simplified form when no factorization applies.
pub fn factor(e: &Expr) -> Result<Expr, EngineError> {
    let prepared = simplify(&expand(e)?);
    let vars = prepared.variables();
    let [var] = vars.as_slice() else {
        return Ok(prepared);
    };
    let Some(coeffs) = poly_coeffs(&prepared, var) else {
        return Ok(prepared);
    };

    let deg = poly_degree(&coeffs);
    if deg == 0 {
        return Ok(prepared);
    }

    // Content: rational gcd of the coefficients, carrying the leading sign.
    let low = coeffs.iter().position(|c| !c.is_zero()).unwrap_or(0);
    let mut content = content_of(&coeffs);
    if coeffs[deg].is_negative() {
        content = content.neg();
    }
    let inv_content = match content.recip() {
        Some(inv) => inv,
        None => return Ok(prepared),
    };
    let monic_ish: Vec<Rational> = coeffs[low..].iter().map(|c| c.mul(&inv_content)).collect();

    let mut factors: Vec<Expr> = Vec::new();
    if !content.is_one() {
        factors.push(Expr::Num(content));
    }
    if low > 0 {
        factors.push(Expr::pow(Expr::sym(var.clone()), Expr::num(low as i64)));
    }

    factors.extend(factor_reduced(&monic_ish, var));

    let result = match factors.len() {
        1 => factors.pop().unwrap_or(prepared),
        _ => Expr::Mul(factors),
    };
    Ok(simplify(&result))
}

/// Rational gcd of all nonzero coefficients.
fn content_of(coeffs: &[Rational]) -> Rational {
    let mut nums = 0i64;
    let mut dens = 1i64;
    for c in coeffs.iter().filter(|c| !c.is_zero()) {
        nums = gcd_i64(nums, c.numerator().abs());
        dens = lcm_i64(dens, c.denominator());
    }
    Rational::new(nums.max(1), dens).unwrap_or(Rational::ONE)
}

fn gcd_i64(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn lcm_i64(a: i64, b: i64) -> i64 {
    let g = gcd_i64(a, b).max(1);
    (a / g) * b
}

/// Factor the content-free part: integer-root quadratics split into linear
/// factors, everything else is rebuilt as-is.
fn factor_reduced(coeffs: &[Rational], var: &str) -> Vec<Expr> {
    let deg = poly_degree(coeffs);
    if deg == 2 && coeffs[2].is_one() {
        let b = coeffs[1];
        let c = coeffs[0];
        let disc = b.mul(&b).sub(&Rational::integer(4).mul(&c));
        if let Some(s) = disc.perfect_sqrt() {
            let half = Rational::new(1, 2).unwrap_or(Rational::ONE);
            let r1 = b.neg().sub(&s).mul(&half);
            let r2 = b.neg().add(&s).mul(&half);
            if r1.is_integer() && r2.is_integer() {
                return vec![linear_factor(var, r1), linear_factor(var, r2)];
            }
        }
    }
    vec![rebuild_poly(coeffs, var)]
}

/// `(var - root)` as an expression.
fn linear_factor(var: &str, root: Rational) -> Expr {
    Expr::Add(vec![Expr::sym(var), Expr::Num(root.neg())])
}

/// Rebuild `Σ cᵢ·varⁱ` from coefficients.
fn rebuild_poly(coeffs: &[Rational], var: &str) -> Expr {
    let mut terms = Vec::new();
    for (i, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        let term = match i {
            0 => Expr::Num(*c),
            1 => Expr::Mul(vec![Expr::Num(*c), Expr::sym(var)]),
            _ => Expr::Mul(vec![
                Expr::Num(*c),
                Expr::pow(Expr::sym(var), Expr::num(i as i64)),
            ]),
        };
        terms.push(term);
    }
    simplify(&Expr::Add(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::{parse_expression, SymbolTable};

    fn expr(input: &str) -> Expr {
        parse_expression(input, &SymbolTable::default()).unwrap()
    }

    #[test]
    fn expand_distributes_products() {
        let e = expand(&expr("(x + 1)*(x - 1)")).unwrap();
        assert_eq!(e, simplify(&expr("x**2 - 1")));
    }

    #[test]
    fn expand_binomial_square() {
        let e = expand(&expr("(x + 2)**2")).unwrap();
        assert_eq!(e, simplify(&expr("x**2 + 4*x + 4")));
    }

    #[test]
    fn expand_rejects_huge_powers() {
        assert!(matches!(
            expand(&expr("(x + 1)**100")),
            Err(EngineError::ExponentTooLarge { exponent: 100 })
        ));
    }

    #[test]
    fn poly_coeffs_of_quadratic() {
        let coeffs = poly_coeffs(&expr("x**2 - 4"), "x").unwrap();
        assert_eq!(
            coeffs,
            vec![
                Rational::integer(-4),
                Rational::ZERO,
                Rational::integer(1)
            ]
        );
    }

    #[test]
    fn poly_coeffs_rejects_functions_of_var() {
        assert!(poly_coeffs(&expr("sin(x)"), "x").is_none());
        assert!(poly_coeffs(&expr("1/x"), "x").is_none());
    }

    #[test]
    fn solve_linear() {
        let roots = solve_equation(&expr("2*x - 6"), "x").unwrap();
        assert_eq!(roots, vec![Expr::num(3)]);
    }

    #[test]
    fn solve_quadratic_with_integer_roots() {
        let roots = solve_equation(&expr("x**2 - 4"), "x").unwrap();
        assert_eq!(roots, vec![Expr::num(-2), Expr::num(2)]);
    }

    #[test]
    fn solve_double_root_deduplicates() {
        let roots = solve_equation(&expr("x**2 - 2*x + 1"), "x").unwrap();
        assert_eq!(roots, vec![Expr::one()]);
    }

    #[test]
    fn solve_negative_discriminant_has_no_real_roots() {
        let roots = solve_equation(&expr("x**2 + 1"), "x").unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn solve_pulls_out_zero_roots() {
        let roots = solve_equation(&expr("x**3 - 4*x"), "x").unwrap();
        assert_eq!(roots, vec![Expr::num(-2), Expr::zero(), Expr::num(2)]);
    }

    #[test]
    fn solve_irrational_roots_stay_symbolic() {
        let roots = solve_equation(&expr("x**2 - 2"), "x").unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|r| r.as_number().is_none()));
    }

    #[test]
    fn solve_non_polynomial_fails() {
        assert!(matches!(
            solve_equation(&expr("sin(x)"), "x"),
            Err(EngineError::NonPolynomial { .. })
        ));
    }

    #[test]
    fn factor_difference_of_squares() {
        use crate::engine::render::render;
        let f = factor(&expr("x**2 - 4")).unwrap();
        assert_eq!(render(&f), "(x - 2)*(x + 2)");
    }

    #[test]
    fn factor_extracts_content_and_zero_roots() {
        use crate::engine::render::render;
        let f = factor(&expr("2*x**3 - 8*x")).unwrap();
        assert_eq!(render(&f), "2*x*(x - 2)*(x + 2)");
    }

    #[test]
    fn factor_leaves_irreducible_alone() {
        let f = factor(&expr("x**2 + 1")).unwrap();
        assert_eq!(f, simplify(&expr("x**2 + 1")));
    }
}
