//! Precedence-aware pretty printer for engine expressions.
//!
//! Output follows the canonical ASCII style the parser consumes: `**` for
//! powers, explicit `*`, and `a/b` division built from negative-power factors,
//! so rendered results can be pasted back in as queries.

use crate::engine::ast::{Expr, Rational};

/// Render an expression as a display string.
pub fn render(e: &Expr) -> String {
    render_prec(e, 0)
}

/// Render a list of expressions as `[a, b, …]` (used for solution sets).
pub fn render_list(items: &[Expr]) -> String {
    let parts: Vec<String> = items.iter().map(render).collect();
    format!("[{}]", parts.join(", "))
}

/// Precedence levels: sum = 1, product = 2, power = 3, atom = 4.
fn render_prec(e: &Expr, parent: u8) -> String {
    match e {
        Expr::Num(r) => {
            let s = r.to_string();
            // A fraction inside a product or power reads as division; guard it.
            if parent >= 2 && (!r.is_integer() || r.is_negative()) {
                format!("({s})")
            } else {
                s
            }
        }
        Expr::Sym(s) => s.clone(),
        Expr::Const(c) => c.name().to_string(),
        Expr::Func(kind, arg) => format!("{}({})", kind.name(), render_prec(arg, 0)),
        Expr::Add(terms) => {
            let body = render_sum(terms);
            if parent > 1 {
                format!("({body})")
            } else {
                body
            }
        }
        Expr::Mul(factors) => {
            let (negative, body) = render_product(factors);
            let signed = if negative { format!("-{body}") } else { body };
            if parent > 2 {
                format!("({signed})")
            } else {
                signed
            }
        }
        Expr::Pow(base, exp) => {
            // Negative numeric exponents render through the division path.
            if exp.as_number().is_some_and(|r| r.is_negative()) {
                let (negative, body) = render_product(std::slice::from_ref(e));
                let signed = if negative { format!("-{body}") } else { body };
                return if parent > 2 {
                    format!("({signed})")
                } else {
                    signed
                };
            }
            let body = pow_string(base, exp);
            if parent > 3 {
                format!("({body})")
            } else {
                body
            }
        }
    }
}

fn render_sum(terms: &[Expr]) -> String {
    if terms.is_empty() {
        return "0".to_string();
    }
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let (negative, body) = term_with_sign(term);
        if i == 0 {
            if negative {
                out.push('-');
            }
            out.push_str(&body);
        } else {
            out.push_str(if negative { " - " } else { " + " });
            out.push_str(&body);
        }
    }
    out
}

/// Split a sum term into its sign and unsigned rendering.
fn term_with_sign(term: &Expr) -> (bool, String) {
    match term {
        Expr::Num(r) => (r.is_negative(), r.abs().to_string()),
        Expr::Mul(factors) => render_product(factors),
        Expr::Pow(_, exp) if exp.as_number().is_some_and(|r| r.is_negative()) => {
            render_product(std::slice::from_ref(term))
        }
        other => (false, render_prec(other, 2)),
    }
}

/// Render a product as `(sign, numerator[/denominator])`.
///
/// Numeric factors fold into a single rational coefficient; factors with
/// negative numeric exponents move into the denominator.
fn render_product(factors: &[Expr]) -> (bool, String) {
    let mut coeff = Rational::ONE;
    let mut nums: Vec<String> = Vec::new();
    let mut dens: Vec<String> = Vec::new();

    for factor in factors {
        match factor {
            Expr::Num(r) => coeff = coeff.mul(r),
            Expr::Pow(base, exp)
                if exp.as_number().is_some_and(|r| r.is_negative()) =>
            {
                let pos = exp
                    .as_number()
                    .map(|r| r.neg())
                    .unwrap_or(Rational::ONE);
                if pos.is_one() {
                    dens.push(render_prec(base, 3));
                } else {
                    dens.push(pow_string(base, &Expr::Num(pos)));
                }
            }
            other => nums.push(render_prec(other, 2)),
        }
    }

    let negative = coeff.is_negative();
    let coeff = coeff.abs();
    let (p, q) = (coeff.numerator(), coeff.denominator());

    if p != 1 || nums.is_empty() {
        nums.insert(0, p.to_string());
    }
    if q != 1 {
        dens.insert(0, q.to_string());
    }

    let num_str = nums.join("*");
    if dens.is_empty() {
        return (negative, num_str);
    }
    let den_str = if dens.len() == 1 {
        dens.into_iter().next().unwrap_or_default()
    } else {
        format!("({})", dens.join("*"))
    };
    (negative, format!("{num_str}/{den_str}"))
}

fn pow_string(base: &Expr, exp: &Expr) -> String {
    let base_str = match base {
        Expr::Sym(_) | Expr::Const(_) | Expr::Func(_, _) => render_prec(base, 0),
        Expr::Num(r) if r.is_integer() && !r.is_negative() => r.to_string(),
        other => format!("({})", render_prec(other, 0)),
    };
    let exp_str = match exp {
        Expr::Num(r) if r.is_integer() && !r.is_negative() => r.to_string(),
        Expr::Sym(s) => s.clone(),
        Expr::Const(c) => c.name().to_string(),
        other => format!("({})", render_prec(other, 0)),
    };
    format!("{base_str}**{exp_str}")
}
