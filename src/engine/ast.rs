//! Expression tree and exact rational arithmetic.
//!
//! `Expr` is the engine-native representation all operations work over.
//! Sums and products are n-ary so the simplifier can flatten and collect
//! terms without fighting a binary tree; subtraction, division, and unary
//! minus are encoded as `+ (-1)*…` and `… * b**(-1)` at construction time.

use std::cmp::Ordering;
use std::fmt;

// ---------------------------------------------------------------------------
// Rational numbers
// ---------------------------------------------------------------------------

/// An exact rational with the invariant `den > 0` and `gcd(num, den) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub const ZERO: Rational = Rational { num: 0, den: 1 };
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    /// Create a reduced rational. Returns `None` when `den == 0`.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Some(Self {
            num: sign * (num / g),
            den: (den / g).abs(),
        })
    }

    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    /// Integer value when the denominator is 1.
    pub fn as_integer(&self) -> Option<i64> {
        self.is_integer().then_some(self.num)
    }

    pub fn abs(&self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            num: -self.num,
            den: self.den,
        }
    }

    pub fn add(&self, other: &Rational) -> Rational {
        // Cross-reduce before multiplying to keep intermediates small.
        let g = gcd(self.den, other.den).max(1);
        let lhs = self.num * (other.den / g);
        let rhs = other.num * (self.den / g);
        Rational::new(lhs + rhs, self.den * (other.den / g)).unwrap_or(Rational::ZERO)
    }

    pub fn sub(&self, other: &Rational) -> Rational {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Rational) -> Rational {
        let g1 = gcd(self.num, other.den).max(1);
        let g2 = gcd(other.num, self.den).max(1);
        Rational::new(
            (self.num / g1) * (other.num / g2),
            (self.den / g2) * (other.den / g1),
        )
        .unwrap_or(Rational::ZERO)
    }

    /// Multiplicative inverse; `None` for zero.
    pub fn recip(&self) -> Option<Rational> {
        Rational::new(self.den, self.num)
    }

    /// Exact division; `None` when `other` is zero.
    pub fn checked_div(&self, other: &Rational) -> Option<Rational> {
        other.recip().map(|r| self.mul(&r))
    }

    /// Integer power with overflow checks; negative exponents invert first.
    pub fn pow(&self, exp: i64) -> Option<Rational> {
        if exp < 0 {
            return self.recip().and_then(|r| r.pow(-exp));
        }
        let mut out = Rational::ONE;
        for _ in 0..exp {
            let num = out.num.checked_mul(self.num)?;
            let den = out.den.checked_mul(self.den)?;
            out = Rational::new(num, den)?;
        }
        Some(out)
    }

    /// Exact square root when both numerator and denominator are perfect squares.
    pub fn perfect_sqrt(&self) -> Option<Rational> {
        if self.num < 0 {
            return None;
        }
        let sn = isqrt(self.num)?;
        let sd = isqrt(self.den)?;
        Rational::new(sn, sd)
    }

    pub fn signum(&self) -> i64 {
        self.num.signum()
    }
}

/// Integer square root via Newton iteration; `None` if `n` is not a square.
fn isqrt(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    if n < 2 {
        return Some(n);
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    (x * x == n).then_some(x)
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // den > 0 on both sides, so cross-multiplication preserves order.
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::integer(n)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

// ---------------------------------------------------------------------------
// Functions and constants
// ---------------------------------------------------------------------------

/// The allow-listed unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FuncKind {
    Sin,
    Cos,
    Tan,
    Log,
    Exp,
    Sqrt,
    Abs,
}

impl FuncKind {
    /// Canonical rendered name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Abs => "Abs",
        }
    }
}

/// The allow-listed named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MathConst {
    Pi,
    E,
    Infinity,
}

impl MathConst {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pi => "pi",
            Self::E => "E",
            Self::Infinity => "oo",
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// An engine-native symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Exact rational literal.
    Num(Rational),
    /// Allow-listed variable.
    Sym(String),
    /// Named constant.
    Const(MathConst),
    /// n-ary sum.
    Add(Vec<Expr>),
    /// n-ary product.
    Mul(Vec<Expr>),
    /// `base ** exponent`.
    Pow(Box<Expr>, Box<Expr>),
    /// Unary function application.
    Func(FuncKind, Box<Expr>),
}

impl Expr {
    pub fn num(n: i64) -> Self {
        Expr::Num(Rational::integer(n))
    }

    pub fn rat(r: Rational) -> Self {
        Expr::Num(r)
    }

    pub fn zero() -> Self {
        Expr::num(0)
    }

    pub fn one() -> Self {
        Expr::num(1)
    }

    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Sym(name.into())
    }

    pub fn add(terms: Vec<Expr>) -> Self {
        Expr::Add(terms)
    }

    pub fn mul(factors: Vec<Expr>) -> Self {
        Expr::Mul(factors)
    }

    pub fn pow(base: Expr, exp: Expr) -> Self {
        Expr::Pow(Box::new(base), Box::new(exp))
    }

    pub fn func(kind: FuncKind, arg: Expr) -> Self {
        Expr::Func(kind, Box::new(arg))
    }

    /// `-e`, encoded as `(-1) * e`.
    pub fn neg(e: Expr) -> Self {
        Expr::Mul(vec![Expr::num(-1), e])
    }

    /// `a - b`, encoded as `a + (-1)*b`.
    pub fn sub(a: Expr, b: Expr) -> Self {
        Expr::Add(vec![a, Expr::neg(b)])
    }

    /// `a / b`, encoded as `a * b**(-1)`.
    pub fn div(a: Expr, b: Expr) -> Self {
        Expr::Mul(vec![a, Expr::pow(b, Expr::num(-1))])
    }

    pub fn infinity() -> Self {
        Expr::Const(MathConst::Infinity)
    }

    pub fn neg_infinity() -> Self {
        Expr::neg(Expr::infinity())
    }

    /// The rational value when this is a numeric literal.
    pub fn as_number(&self) -> Option<Rational> {
        match self {
            Expr::Num(r) => Some(*r),
            _ => None,
        }
    }

    /// Whether the expression mentions the given variable.
    pub fn contains_sym(&self, name: &str) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Sym(s) => s == name,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.contains_sym(name)),
            Expr::Pow(base, exp) => base.contains_sym(name) || exp.contains_sym(name),
            Expr::Func(_, arg) => arg.contains_sym(name),
        }
    }

    /// Whether any variable at all occurs in the expression.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => true,
            Expr::Sym(_) => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().all(Expr::is_constant),
            Expr::Pow(base, exp) => base.is_constant() && exp.is_constant(),
            Expr::Func(_, arg) => arg.is_constant(),
        }
    }

    /// Collect the distinct variable names occurring in the expression, sorted.
    pub fn variables(&self) -> Vec<String> {
        fn walk(e: &Expr, out: &mut Vec<String>) {
            match e {
                Expr::Sym(s) => {
                    if !out.iter().any(|v| v == s) {
                        out.push(s.clone());
                    }
                }
                Expr::Add(items) | Expr::Mul(items) => {
                    for item in items {
                        walk(item, out);
                    }
                }
                Expr::Pow(base, exp) => {
                    walk(base, out);
                    walk(exp, out);
                }
                Expr::Func(_, arg) => walk(arg, out),
                Expr::Num(_) | Expr::Const(_) => {}
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out.sort();
        out
    }
}

/// Variant rank used by [`compare`]: lower ranks sort first inside products.
fn rank(e: &Expr) -> u8 {
    match e {
        Expr::Num(_) => 0,
        Expr::Const(_) => 1,
        Expr::Sym(_) => 2,
        Expr::Pow(_, _) => 3,
        Expr::Func(_, _) => 4,
        Expr::Mul(_) => 5,
        Expr::Add(_) => 6,
    }
}

/// Deterministic structural ordering for canonical term/factor layout.
pub fn compare(a: &Expr, b: &Expr) -> Ordering {
    match (a, b) {
        (Expr::Num(x), Expr::Num(y)) => x.cmp(y),
        (Expr::Const(x), Expr::Const(y)) => x.cmp(y),
        (Expr::Sym(x), Expr::Sym(y)) => x.cmp(y),
        (Expr::Pow(b1, e1), Expr::Pow(b2, e2)) => {
            compare(b1, b2).then_with(|| compare(e1, e2))
        }
        (Expr::Func(k1, a1), Expr::Func(k2, a2)) => k1.cmp(k2).then_with(|| compare(a1, a2)),
        (Expr::Add(x), Expr::Add(y)) | (Expr::Mul(x), Expr::Mul(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
