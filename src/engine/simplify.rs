//! Canonical simplification: flatten, fold constants, collect like terms.
//!
//! `fold` is a bottom-up structural pass. It never errors — anything it does
//! not recognize is rebuilt unchanged — so callers can run it on arbitrary
//! trees, including those mid-way through calculus transformations. The
//! e-graph pass in [`super::rewrite`] runs on top of this for the public
//! `simplify` operation.

use std::cmp::Ordering;

use crate::engine::ast::{compare, Expr, FuncKind, MathConst, Rational};

/// Largest integer exponent folded exactly (keeps numbers readable).
const MAX_FOLD_EXP: i64 = 32;

/// Simplify an expression to canonical form.
///
/// Runs the structural fold twice: rules such as integer-power distribution
/// create new products that benefit from a second collection pass.
pub fn simplify(e: &Expr) -> Expr {
    fold(&fold(e))
}

/// One bottom-up structural pass.
pub fn fold(e: &Expr) -> Expr {
    match e {
        Expr::Num(_) | Expr::Sym(_) | Expr::Const(_) => e.clone(),
        Expr::Add(items) => fold_add(items.iter().map(fold).collect()),
        Expr::Mul(items) => fold_mul(items.iter().map(fold).collect()),
        Expr::Pow(base, exp) => fold_pow(fold(base), fold(exp)),
        Expr::Func(kind, arg) => fold_func(*kind, fold(arg)),
    }
}

// ---------------------------------------------------------------------------
// Sums
// ---------------------------------------------------------------------------

/// Split a folded term into `(coefficient, symbolic part)`.
///
/// `None` for the symbolic part means the term is a pure number.
fn split_coeff(term: Expr) -> (Rational, Option<Expr>) {
    match term {
        Expr::Num(r) => (r, None),
        Expr::Mul(factors) => {
            let mut coeff = Rational::ONE;
            let mut rest = Vec::new();
            for f in factors {
                match f {
                    Expr::Num(r) => coeff = coeff.mul(&r),
                    other => rest.push(other),
                }
            }
            match rest.len() {
                0 => (coeff, None),
                1 => (coeff, rest.pop()),
                _ => (coeff, Some(Expr::Mul(rest))),
            }
        }
        other => (Rational::ONE, Some(other)),
    }
}

/// Reattach a coefficient to a symbolic part.
fn join_coeff(coeff: Rational, part: Expr) -> Expr {
    if coeff.is_one() {
        return part;
    }
    match part {
        Expr::Mul(mut factors) => {
            let mut items = vec![Expr::Num(coeff)];
            items.append(&mut factors);
            Expr::Mul(items)
        }
        other => Expr::Mul(vec![Expr::Num(coeff), other]),
    }
}

/// Heuristic total degree, used only for display ordering of sum terms.
fn term_degree(e: &Expr) -> i64 {
    match e {
        Expr::Num(_) | Expr::Const(_) => 0,
        Expr::Sym(_) => 1,
        Expr::Func(_, _) => 1,
        Expr::Pow(base, exp) => match exp.as_number().and_then(|r| r.as_integer()) {
            Some(n) => n.saturating_mul(term_degree(base)),
            None => 1,
        },
        Expr::Mul(items) => items.iter().map(term_degree).sum(),
        Expr::Add(items) => items.iter().map(term_degree).max().unwrap_or(0),
    }
}

fn fold_add(items: Vec<Expr>) -> Expr {
    // Flatten nested sums.
    let mut flat = Vec::new();
    for item in items {
        match item {
            Expr::Add(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    // Collect like terms by their symbolic part, preserving first-seen order.
    let mut constant = Rational::ZERO;
    let mut collected: Vec<(Expr, Rational)> = Vec::new();
    for term in flat {
        let (coeff, part) = split_coeff(term);
        match part {
            None => constant = constant.add(&coeff),
            Some(p) => {
                if let Some(entry) = collected.iter_mut().find(|(seen, _)| *seen == p) {
                    entry.1 = entry.1.add(&coeff);
                } else {
                    collected.push((p, coeff));
                }
            }
        }
    }

    let mut terms: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(p, c)| join_coeff(c, p))
        .collect();

    // Display order: descending degree, then structural order; constant last.
    terms.sort_by(|a, b| {
        term_degree(b)
            .cmp(&term_degree(a))
            .then_with(|| compare(a, b))
    });

    if !constant.is_zero() {
        terms.push(Expr::Num(constant));
    }

    match terms.len() {
        0 => Expr::zero(),
        1 => terms.pop().unwrap_or(Expr::zero()),
        _ => Expr::Add(terms),
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

fn fold_mul(items: Vec<Expr>) -> Expr {
    // Flatten nested products.
    let mut flat = Vec::new();
    for item in items {
        match item {
            Expr::Mul(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut coeff = Rational::ONE;
    // (base, accumulated exponent terms)
    let mut powers: Vec<(Expr, Vec<Expr>)> = Vec::new();

    for factor in flat {
        match factor {
            Expr::Num(r) => coeff = coeff.mul(&r),
            other => {
                let (base, exp) = match other {
                    Expr::Pow(b, e) => (*b, *e),
                    f => (f, Expr::one()),
                };
                if let Some(entry) = powers.iter_mut().find(|(seen, _)| *seen == base) {
                    entry.1.push(exp);
                } else {
                    powers.push((base, vec![exp]));
                }
            }
        }
    }

    if coeff.is_zero() {
        return Expr::zero();
    }

    let mut factors = Vec::new();
    for (base, exps) in powers {
        let exp = fold_add(exps);
        let rebuilt = fold_pow(base, exp);
        match rebuilt {
            Expr::Num(r) => coeff = coeff.mul(&r),
            Expr::Mul(inner) => {
                // Numeric folding inside fold_pow can return a product.
                for f in inner {
                    match f {
                        Expr::Num(r) => coeff = coeff.mul(&r),
                        other => factors.push(other),
                    }
                }
            }
            other => factors.push(other),
        }
    }

    if coeff.is_zero() {
        return Expr::zero();
    }

    factors.sort_by(compare);

    if factors.is_empty() {
        return Expr::Num(coeff);
    }
    if !coeff.is_one() {
        factors.insert(0, Expr::Num(coeff));
    }
    match factors.len() {
        1 => factors.pop().unwrap_or(Expr::one()),
        _ => Expr::Mul(factors),
    }
}

// ---------------------------------------------------------------------------
// Powers
// ---------------------------------------------------------------------------

fn fold_pow(base: Expr, exp: Expr) -> Expr {
    if let Some(e) = exp.as_number() {
        if e.is_zero() {
            return Expr::one();
        }
        if e.is_one() {
            return base;
        }
    }

    if let Some(b) = base.as_number() {
        if b.is_one() {
            return Expr::one();
        }
        if b.is_zero() {
            if let Some(e) = exp.as_number() {
                if !e.is_negative() {
                    return Expr::zero();
                }
            }
        }
        // Exact numeric fold for small integer exponents.
        if let Some(n) = exp.as_number().and_then(|r| r.as_integer()) {
            if n.abs() <= MAX_FOLD_EXP {
                if let Some(v) = b.pow(n) {
                    return Expr::Num(v);
                }
            }
        }
    }

    // (b ** e1) ** e2 → b ** (e1 * e2) when both exponents are numeric.
    if let Expr::Pow(inner_base, inner_exp) = &base {
        if let (Some(e1), Some(e2)) = (inner_exp.as_number(), exp.as_number()) {
            return fold_pow(inner_base.as_ref().clone(), Expr::Num(e1.mul(&e2)));
        }
    }

    // (a * b) ** n → a**n * b**n for integer n, so products collect cleanly.
    if let Expr::Mul(factors) = &base {
        if let Some(n) = exp.as_number().and_then(|r| r.as_integer()) {
            let distributed: Vec<Expr> = factors
                .iter()
                .map(|f| fold_pow(f.clone(), Expr::num(n)))
                .collect();
            return fold_mul(distributed);
        }
    }

    Expr::pow(base, exp)
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

fn fold_func(kind: FuncKind, arg: Expr) -> Expr {
    if let Some(r) = arg.as_number() {
        match kind {
            FuncKind::Sin | FuncKind::Tan if r.is_zero() => return Expr::zero(),
            FuncKind::Cos if r.is_zero() => return Expr::one(),
            FuncKind::Exp if r.is_zero() => return Expr::one(),
            FuncKind::Log if r.is_one() => return Expr::zero(),
            FuncKind::Abs => return Expr::Num(r.abs()),
            FuncKind::Sqrt => {
                if let Some(root) = r.perfect_sqrt() {
                    return Expr::Num(root);
                }
            }
            _ => {}
        }
    }

    match (&kind, &arg) {
        (FuncKind::Sin, Expr::Const(MathConst::Pi)) => return Expr::zero(),
        (FuncKind::Tan, Expr::Const(MathConst::Pi)) => return Expr::zero(),
        (FuncKind::Cos, Expr::Const(MathConst::Pi)) => return Expr::num(-1),
        (FuncKind::Log, Expr::Const(MathConst::E)) => return Expr::one(),
        (FuncKind::Abs, Expr::Func(FuncKind::Abs, _)) => return arg,
        _ => {}
    }

    Expr::func(kind, arg)
}

/// Ordering helper exposed for solver output: numeric expressions sort by
/// value, symbolic ones keep structural order after all numerics.
pub fn numeric_then_structural(a: &Expr, b: &Expr) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::{parse_expression, SymbolTable};

    fn simp(input: &str) -> Expr {
        let table = SymbolTable::default();
        simplify(&parse_expression(input, &table).unwrap())
    }

    #[test]
    fn folds_pure_arithmetic() {
        assert_eq!(simp("2 + 3 * 4"), Expr::num(14));
        assert_eq!(simp("2*(3+5)/4"), Expr::num(4));
    }

    #[test]
    fn collects_like_terms() {
        assert_eq!(
            simp("x + x + x"),
            Expr::Mul(vec![Expr::num(3), Expr::sym("x")])
        );
        assert_eq!(simp("x - x"), Expr::zero());
    }

    #[test]
    fn combines_powers_of_the_same_base() {
        assert_eq!(
            simp("x * x**2"),
            Expr::pow(Expr::sym("x"), Expr::num(3))
        );
        assert_eq!(simp("x**2 / x"), Expr::sym("x"));
    }

    #[test]
    fn zero_and_one_identities() {
        assert_eq!(simp("x + 0"), Expr::sym("x"));
        assert_eq!(simp("x * 1"), Expr::sym("x"));
        assert_eq!(simp("x * 0"), Expr::zero());
        assert_eq!(simp("x**1"), Expr::sym("x"));
        assert_eq!(simp("x**0"), Expr::one());
    }

    #[test]
    fn numeric_power_folds_exactly() {
        assert_eq!(simp("2**10"), Expr::num(1024));
        assert_eq!(
            simp("2**-2"),
            Expr::Num(Rational::new(1, 4).unwrap())
        );
    }

    #[test]
    fn known_function_values_fold() {
        assert_eq!(simp("sin(0)"), Expr::zero());
        assert_eq!(simp("cos(0)"), Expr::one());
        assert_eq!(simp("log(1)"), Expr::zero());
        assert_eq!(simp("sqrt(9)"), Expr::num(3));
        assert_eq!(simp("Abs(-7)"), Expr::num(7));
        assert_eq!(simp("cos(pi)"), Expr::num(-1));
    }

    #[test]
    fn sum_terms_ordered_by_degree() {
        // 3 + 2*x renders with the linear term first.
        let e = simp("3 + 2*x");
        assert_eq!(
            e,
            Expr::Add(vec![
                Expr::Mul(vec![Expr::num(2), Expr::sym("x")]),
                Expr::num(3)
            ])
        );
    }

    #[test]
    fn simplify_is_idempotent_on_canonical_forms() {
        for input in ["x**2 + 3*x + 2", "sin(x)/x", "2*x + 3", "x*y*z"] {
            let once = simp(input);
            assert_eq!(simplify(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn integer_power_of_product_distributes() {
        assert_eq!(
            simp("(2*x)**2"),
            Expr::Mul(vec![
                Expr::num(4),
                Expr::pow(Expr::sym("x"), Expr::num(2))
            ])
        );
    }
}
