//! Algebraic canonicalization via e-graphs (egg).
//!
//! Defines `MathLang` for the e-graph language and a small set of safe
//! identity rules. Equality saturation finds the smallest equivalent form,
//! which the public `simplify` operation combines with the structural fold
//! in [`super::simplify`].

use egg::{define_language, AstSize, Extractor, Id, RecExpr, Runner};

use crate::engine::ast::{Expr, FuncKind, MathConst, Rational};

define_language! {
    /// The language for e-graph-based algebraic rewriting.
    ///
    /// Binary arithmetic plus the allow-listed unary functions. The n-ary
    /// engine AST is folded into left-nested binary nodes on entry and
    /// re-expanded on exit.
    pub enum MathLang {
        Num(i64),

        "+" = Add([egg::Id; 2]),
        "-" = Sub([egg::Id; 2]),
        "*" = Mul([egg::Id; 2]),
        "/" = Div([egg::Id; 2]),
        "^" = Pow([egg::Id; 2]),
        "neg" = Neg([egg::Id; 1]),

        "sin" = Sin([egg::Id; 1]),
        "cos" = Cos([egg::Id; 1]),
        "tan" = Tan([egg::Id; 1]),
        "log" = Log([egg::Id; 1]),
        "exp" = Exp([egg::Id; 1]),
        "sqrt" = Sqrt([egg::Id; 1]),
        "abs" = Abs([egg::Id; 1]),

        Symbol(egg::Symbol),
    }
}

/// The built-in identity rules.
///
/// Only rules that hold unconditionally are included; anything requiring a
/// nonzero side condition (like `x/x → 1`) stays out.
pub fn builtin_rules() -> Vec<egg::Rewrite<MathLang, ()>> {
    vec![
        egg::rewrite!("add-commute"; "(+ ?a ?b)" => "(+ ?b ?a)"),
        egg::rewrite!("add-zero"; "(+ ?a 0)" => "?a"),
        egg::rewrite!("mul-commute"; "(* ?a ?b)" => "(* ?b ?a)"),
        egg::rewrite!("mul-one"; "(* ?a 1)" => "?a"),
        egg::rewrite!("mul-zero"; "(* ?a 0)" => "0"),
        egg::rewrite!("pow-one"; "(^ ?a 1)" => "?a"),
        egg::rewrite!("sub-self"; "(- ?a ?a)" => "0"),
        egg::rewrite!("add-inverse"; "(+ ?a (neg ?a))" => "0"),
        egg::rewrite!("double-neg"; "(neg (neg ?a))" => "?a"),
        egg::rewrite!("mul-neg-one"; "(* -1 ?a)" => "(neg ?a)"),
    ]
}

/// Canonicalize an expression through equality saturation.
///
/// Degrades to returning the input unchanged if the expression cannot be
/// represented in `MathLang` (it always can, today) or if extraction yields
/// an unexpected shape.
pub fn canonicalize(e: &Expr) -> Expr {
    let mut rec = RecExpr::default();
    if build(e, &mut rec).is_none() {
        return e.clone();
    }

    let runner = Runner::default().with_expr(&rec).run(&builtin_rules());
    let extractor = Extractor::new(&runner.egraph, AstSize);
    let (_cost, best) = extractor.find_best(runner.roots[0]);

    let nodes = best.as_ref();
    if nodes.is_empty() {
        return e.clone();
    }
    extract(nodes, Id::from(nodes.len() - 1)).unwrap_or_else(|| e.clone())
}

// ---------------------------------------------------------------------------
// Expr ↔ MathLang conversion
// ---------------------------------------------------------------------------

fn build(e: &Expr, out: &mut RecExpr<MathLang>) -> Option<Id> {
    match e {
        Expr::Num(r) => Some(build_num(*r, out)),
        Expr::Sym(s) => Some(out.add(MathLang::Symbol(egg::Symbol::from(s.as_str())))),
        Expr::Const(c) => Some(out.add(MathLang::Symbol(egg::Symbol::from(c.name())))),
        Expr::Add(items) => build_nary(items, out, |a, b| MathLang::Add([a, b]), MathLang::Num(0)),
        Expr::Mul(items) => build_nary(items, out, |a, b| MathLang::Mul([a, b]), MathLang::Num(1)),
        Expr::Pow(base, exp) => {
            let b = build(base, out)?;
            let x = build(exp, out)?;
            Some(out.add(MathLang::Pow([b, x])))
        }
        Expr::Func(kind, arg) => {
            let a = build(arg, out)?;
            Some(out.add(match kind {
                FuncKind::Sin => MathLang::Sin([a]),
                FuncKind::Cos => MathLang::Cos([a]),
                FuncKind::Tan => MathLang::Tan([a]),
                FuncKind::Log => MathLang::Log([a]),
                FuncKind::Exp => MathLang::Exp([a]),
                FuncKind::Sqrt => MathLang::Sqrt([a]),
                FuncKind::Abs => MathLang::Abs([a]),
            }))
        }
    }
}

fn build_num(r: Rational, out: &mut RecExpr<MathLang>) -> Id {
    match r.as_integer() {
        Some(n) => out.add(MathLang::Num(n)),
        None => {
            let num = out.add(MathLang::Num(r.numerator()));
            let den = out.add(MathLang::Num(r.denominator()));
            out.add(MathLang::Div([num, den]))
        }
    }
}

fn build_nary(
    items: &[Expr],
    out: &mut RecExpr<MathLang>,
    node: impl Fn(Id, Id) -> MathLang,
    empty: MathLang,
) -> Option<Id> {
    let mut iter = items.iter();
    let Some(first) = iter.next() else {
        return Some(out.add(empty));
    };
    let mut acc = build(first, out)?;
    for item in iter {
        let rhs = build(item, out)?;
        acc = out.add(node(acc, rhs));
    }
    Some(acc)
}

fn extract(nodes: &[MathLang], id: Id) -> Option<Expr> {
    let node = nodes.get(usize::from(id))?;
    Some(match node {
        MathLang::Num(n) => Expr::num(*n),
        MathLang::Symbol(s) => match s.as_str() {
            "pi" => Expr::Const(MathConst::Pi),
            "E" => Expr::Const(MathConst::E),
            "oo" => Expr::Const(MathConst::Infinity),
            other => Expr::Sym(other.to_string()),
        },
        MathLang::Add([a, b]) => Expr::Add(vec![extract(nodes, *a)?, extract(nodes, *b)?]),
        MathLang::Sub([a, b]) => Expr::sub(extract(nodes, *a)?, extract(nodes, *b)?),
        MathLang::Mul([a, b]) => Expr::Mul(vec![extract(nodes, *a)?, extract(nodes, *b)?]),
        MathLang::Div([a, b]) => Expr::div(extract(nodes, *a)?, extract(nodes, *b)?),
        MathLang::Pow([a, b]) => Expr::pow(extract(nodes, *a)?, extract(nodes, *b)?),
        MathLang::Neg([a]) => Expr::neg(extract(nodes, *a)?),
        MathLang::Sin([a]) => Expr::func(FuncKind::Sin, extract(nodes, *a)?),
        MathLang::Cos([a]) => Expr::func(FuncKind::Cos, extract(nodes, *a)?),
        MathLang::Tan([a]) => Expr::func(FuncKind::Tan, extract(nodes, *a)?),
        MathLang::Log([a]) => Expr::func(FuncKind::Log, extract(nodes, *a)?),
        MathLang::Exp([a]) => Expr::func(FuncKind::Exp, extract(nodes, *a)?),
        MathLang::Sqrt([a]) => Expr::func(FuncKind::Sqrt, extract(nodes, *a)?),
        MathLang::Abs([a]) => Expr::func(FuncKind::Abs, extract(nodes, *a)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simplify::fold;

    #[test]
    fn builtin_rules_load() {
        let rules = builtin_rules();
        assert!(!rules.is_empty());
    }

    #[test]
    fn canonicalize_drops_additive_zero() {
        let e = Expr::Add(vec![Expr::sym("x"), Expr::zero()]);
        assert_eq!(canonicalize(&e), Expr::sym("x"));
    }

    #[test]
    fn canonicalize_drops_multiplicative_one() {
        let e = Expr::Mul(vec![Expr::sym("x"), Expr::one()]);
        assert_eq!(canonicalize(&e), Expr::sym("x"));
    }

    #[test]
    fn canonicalize_preserves_value_shapes() {
        // A fraction survives the round trip through MathLang's Div encoding.
        let half = Expr::Num(Rational::new(1, 2).unwrap());
        let out = fold(&canonicalize(&half));
        assert_eq!(out, half);
    }

    #[test]
    fn subtraction_of_self_vanishes() {
        let e = Expr::sub(Expr::sym("x"), Expr::sym("x"));
        assert_eq!(canonicalize(&e), Expr::zero());
    }

    #[test]
    fn functions_round_trip() {
        let e = Expr::func(FuncKind::Sin, Expr::sym("x"));
        assert_eq!(canonicalize(&e), e);
    }
}
