//! Request normalization: raw chat text → canonical algebraic string.
//!
//! The normalizer is an ordered pipeline of pure `&str → String` rewrite
//! stages. Each stage is independently idempotent and the pipeline as a whole
//! is too: running it on its own output changes nothing. No stage can fail —
//! a rewrite that destroys the whole input falls back to returning the
//! original text, so downstream parsing gets *something* to reject cleanly.
//!
//! Stage order matters. The phrase table is applied as literal sequential
//! replacement (later entries may see tokens produced by earlier ones), and
//! implicit-multiplication repair must run after exponent rewriting so
//! `x²y` becomes `x**2*y` rather than `x**2y`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A canonical ASCII algebraic string, ready for the restricted parser.
///
/// Derived deterministically from one raw query; keeps no back-reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedExpression(String);

impl NormalizedExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw query into canonical form.
pub fn normalize(raw: &str) -> NormalizedExpression {
    if raw.trim().is_empty() {
        return NormalizedExpression(String::new());
    }

    // Directional cues are read off the raw text before any rewriting: the
    // arrow collapse must not fire on inputs that never asked for a limit.
    let cue = has_directional_cue(raw);

    let mut text = lowercase_trim(raw);
    text = strip_stop_words(&text);
    text = apply_phrase_table(&text);
    text = rewrite_exponents(&text);
    text = rewrite_glyphs(&text);
    text = repair_implicit_mul(&text);
    text = collapse_limit_arrow(&text, cue);
    text = collapse_separators(&text);

    if text.is_empty() {
        // Fully destructive rewrite (e.g. the input was nothing but filler).
        return NormalizedExpression(raw.to_string());
    }
    NormalizedExpression(text)
}

// ---------------------------------------------------------------------------
// Stage 1: Unicode NFC + lowercase + trim
// ---------------------------------------------------------------------------

fn lowercase_trim(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase().trim().to_string()
}

// ---------------------------------------------------------------------------
// Stage 2: stop-word stripping
// ---------------------------------------------------------------------------

// Word-boundary matching so substrings inside identifiers are untouched
// ("реши" never fires inside "решить"; "is" never fires inside "integrate").
static STOP_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(реши(те|ть)?|посчитай(те)?|вычисли(ть|те)?|найди(те)?|найти|пожалуйста|чему|равен|равно|равна|please|find|the|compute|calculate|evaluate|what|is)\b",
    )
    .unwrap()
});

fn strip_stop_words(text: &str) -> String {
    STOP_WORDS_RE.replace_all(text, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Stage 3: phrase → token table
// ---------------------------------------------------------------------------

/// Ordered phrase substitutions, applied as literal sequential replacement.
///
/// Longer inflections come before their prefixes ("упростить" before
/// "упрости") so a shorter entry never leaves a dangling suffix behind.
/// Directional words use surrounding spaces where a bare stem would also
/// match inside ordinary words ("при" occurs inside "пример").
const PHRASE_TABLE: &[(&str, &str)] = &[
    ("производной", "diff"),
    ("производную", "diff"),
    ("производная", "diff"),
    ("дифференцируй", "diff"),
    ("derivative of", "diff"),
    ("derivative", "diff"),
    ("интегрируй", "integrate"),
    ("интеграл от", "integrate"),
    ("интеграла", "integrate"),
    ("интеграл", "integrate"),
    ("integral of", "integrate"),
    ("integral", "integrate"),
    ("предела", "limit"),
    ("предел", "limit"),
    ("limit of", "limit"),
    ("упростить", "simplify"),
    ("упрости", "simplify"),
    ("уравнения", "solve"),
    ("уравнений", "solve"),
    ("уравнение", "solve"),
    ("equation", "solve"),
    ("разложить на множители", "factor"),
    ("разложи на множители", "factor"),
    ("разложить", "factor"),
    ("разложи", "factor"),
    ("factorise", "factor"),
    ("factorize", "factor"),
    ("раскрыть скобки", "expand"),
    ("раскрой скобки", "expand"),
    ("раскрыть", "expand"),
    ("раскрой", "expand"),
    // Directional words become separators or the ASCII arrow.
    ("стремится к", "->"),
    ("approaches", "->"),
    ("tends to", "->"),
    (" при ", " , "),
    (" when ", " , "),
    (" as ", " , "),
    // Infinity words.
    ("бесконечности", "oo"),
    ("бесконечность", "oo"),
    ("infinity", "oo"),
];

fn apply_phrase_table(text: &str) -> String {
    let mut out = text.to_string();
    for (phrase, token) in PHRASE_TABLE {
        if out.contains(phrase) {
            out = out.replace(phrase, token);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Stage 4: exponent rewriting
// ---------------------------------------------------------------------------

/// Map a superscript digit to its ASCII counterpart.
fn superscript_digit(c: char) -> Option<char> {
    match c {
        '⁰' => Some('0'),
        '¹' => Some('1'),
        '²' => Some('2'),
        '³' => Some('3'),
        '⁴' => Some('4'),
        '⁵' => Some('5'),
        '⁶' => Some('6'),
        '⁷' => Some('7'),
        '⁸' => Some('8'),
        '⁹' => Some('9'),
        _ => None,
    }
}

/// `x²` → `x**2`, `x^2` → `x**2`. A run of superscript digits becomes one
/// exponent: `x²³` → `x**23`.
fn rewrite_exponents(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_superscript = false;
    for c in text.chars() {
        match superscript_digit(c) {
            Some(digit) => {
                if !in_superscript {
                    out.push_str("**");
                    in_superscript = true;
                }
                out.push(digit);
            }
            None => {
                in_superscript = false;
                out.push(c);
            }
        }
    }
    out.replace('^', "**")
}

// ---------------------------------------------------------------------------
// Stage 5: operator glyph rewriting
// ---------------------------------------------------------------------------

const GLYPH_TABLE: &[(&str, &str)] = &[
    ("×", "*"),
    ("⋅", "*"),
    ("·", "*"),
    ("∙", "*"),
    ("÷", "/"),
    ("−", "-"),
    ("–", "-"),
    ("→", "->"),
    ("π", "pi"),
    ("∞", "oo"),
    ("∫", "integrate "),
];

fn rewrite_glyphs(text: &str) -> String {
    let mut out = text.to_string();
    for (glyph, ascii) in GLYPH_TABLE {
        if out.contains(glyph) {
            out = out.replace(glyph, ascii);
        }
    }
    out = rewrite_radicals(&out);
    rewrite_abs_bars(&out)
}

/// `√x` → `sqrt(x)`, `√(x + 1)` → `sqrt(x + 1)`.
fn rewrite_radicals(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '√' {
            out.push(c);
            continue;
        }
        while chars.peek().is_some_and(|n| n.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            // A parenthesized radicand already has its own group.
            Some('(') => out.push_str("sqrt"),
            Some(&next) if next.is_alphanumeric() || next == '.' => {
                out.push_str("sqrt(");
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '.' {
                        out.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(')');
            }
            _ => out.push_str("sqrt"),
        }
    }
    out
}

/// `|expr|` → `abs(expr)`. Bars pair up left to right; a lone trailing bar
/// is restored rather than left as a dangling call.
fn rewrite_abs_bars(text: &str) -> String {
    if !text.contains('|') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut open = false;
    for c in text.chars() {
        if c == '|' {
            out.push_str(if open { ")" } else { "abs(" });
            open = !open;
        } else {
            out.push(c);
        }
    }
    if open {
        if let Some(pos) = out.rfind("abs(") {
            out.replace_range(pos..pos + 4, "|");
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Stage 6: implicit multiplication repair
// ---------------------------------------------------------------------------

/// `3x` → `3*x`, `2(x + 1)` → `2*(x + 1)`.
///
/// Only a digit directly followed by a letter or opening parenthesis is
/// repaired; identifiers never start with a digit, so this cannot split a
/// valid token.
fn repair_implicit_mul(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev_digit = false;
    for c in text.chars() {
        if prev_digit && (c.is_alphabetic() || c == '(') {
            out.push('*');
        }
        out.push(c);
        prev_digit = c.is_ascii_digit();
    }
    out
}

// ---------------------------------------------------------------------------
// Stage 7: limit arrow collapse
// ---------------------------------------------------------------------------

static LIMIT_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:limit\s+)?(?P<f>.+?)[\s,]+(?P<v>[a-z])\s*->\s*(?P<p>[^\s,]+)[\s,]*$")
        .unwrap()
});

const DIRECTIONAL_CUES: &[&str] = &[
    "->",
    "→",
    "стремится",
    "approaches",
    "tends to",
    " при ",
    " when ",
    " as ",
];

fn has_directional_cue(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    DIRECTIONAL_CUES.iter().any(|cue| lower.contains(cue))
}

/// Collapse `f , var -> point` into `limit(f, var, point)`.
///
/// Fires only when a directional cue was present in the original text and no
/// explicit `limit(` call syntax exists already.
fn collapse_limit_arrow(text: &str, cue: bool) -> String {
    if !cue || text.contains("limit(") {
        return text.to_string();
    }
    match LIMIT_ARROW_RE.captures(text) {
        Some(caps) => {
            let f = caps["f"].trim_matches(|c: char| c.is_whitespace() || c == ',');
            format!("limit({f}, {}, {})", &caps["v"], &caps["p"])
        }
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Stage 8: whitespace and separator collapse
// ---------------------------------------------------------------------------

static COMMA_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,(\s*,)*\s*").unwrap());

fn collapse_separators(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let commas = COMMA_RUN_RE.replace_all(&joined, ", ");
    commas.trim_matches(|c: char| c.is_whitespace() || c == ',').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(input: &str) -> String {
        normalize(input).into_string()
    }

    #[test]
    fn canonical_input_passes_through() {
        assert_eq!(norm("diff(x**2, x)"), "diff(x**2, x)");
        assert_eq!(norm("2 + 3 * 4"), "2 + 3 * 4");
        assert_eq!(norm("limit(sin(x)/x, x, 0)"), "limit(sin(x)/x, x, 0)");
    }

    #[test]
    fn localized_derivative_request() {
        assert_eq!(norm("производная x^2 + 3x"), "diff x**2 + 3*x");
    }

    #[test]
    fn localized_filler_is_stripped() {
        assert_eq!(norm("реши 2*(3+5)/4"), "2*(3+5)/4");
        assert_eq!(norm("посчитай 2 + 2"), "2 + 2");
    }

    #[test]
    fn localized_limit_collapses_to_call_form() {
        assert_eq!(
            norm("предел sin(x)/x при x->0"),
            "limit(sin(x)/x, x, 0)"
        );
    }

    #[test]
    fn english_limit_phrasing_collapses() {
        assert_eq!(
            norm("limit of sin(x)/x as x approaches 0"),
            "limit(sin(x)/x, x, 0)"
        );
    }

    #[test]
    fn arrow_without_directional_cue_is_left_alone() {
        // No cue in the original text → no collapse.
        assert_eq!(norm("sin(x)/x, x, 0"), "sin(x)/x, x, 0");
    }

    #[test]
    fn explicit_limit_call_is_not_rewritten() {
        assert_eq!(
            norm("limit(sin(x)/x, x, 0) при x->0"),
            "limit(sin(x)/x, x, 0), x->0"
        );
    }

    #[test]
    fn superscripts_become_power_notation() {
        assert_eq!(norm("x² + 3"), "x**2 + 3");
        assert_eq!(norm("x²³"), "x**23");
        assert_eq!(norm("2³"), "2**3");
    }

    #[test]
    fn caret_becomes_double_star() {
        assert_eq!(norm("x^2 + x^3"), "x**2 + x**3");
    }

    #[test]
    fn operator_glyphs_become_ascii() {
        assert_eq!(norm("2 × 3 ÷ 4"), "2 * 3 / 4");
        assert_eq!(norm("π + ∞"), "pi + oo");
        assert_eq!(norm("x → 0"), "x -> 0");
    }

    #[test]
    fn radical_glyph_becomes_sqrt_call() {
        assert_eq!(norm("√4 + 1"), "sqrt(4) + 1");
        assert_eq!(norm("√(x + 1)"), "sqrt(x + 1)");
    }

    #[test]
    fn abs_bars_become_abs_call() {
        assert_eq!(norm("|x - 2|"), "abs(x - 2)");
        assert_eq!(norm("√4 + |x - 2|"), "sqrt(4) + abs(x - 2)");
        // A lone bar is restored, not turned into a dangling call.
        assert_eq!(norm("x | 2"), "x | 2");
    }

    #[test]
    fn implicit_multiplication_is_repaired() {
        assert_eq!(norm("3x + 2"), "3*x + 2");
        assert_eq!(norm("2(x + 1)"), "2*(x + 1)");
        assert_eq!(norm("x²y"), "x**2*y");
    }

    #[test]
    fn integral_glyph_becomes_token() {
        assert_eq!(norm("∫x^2 dx"), "integrate x**2 dx");
    }

    #[test]
    fn whitespace_and_separators_collapse() {
        assert_eq!(norm("  2   +  2 "), "2 + 2");
        assert_eq!(norm("diff(x**2 ,  x)"), "diff(x**2, x)");
        assert_eq!(norm("x , , 0"), "x, 0");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(norm(""), "");
        assert_eq!(norm("   "), "");
    }

    #[test]
    fn destructive_rewrite_falls_back_to_original() {
        // Nothing but filler words: the pipeline would empty the string.
        assert_eq!(norm("реши пожалуйста"), "реши пожалуйста");
    }

    #[test]
    fn pipeline_is_idempotent() {
        let inputs = [
            "производная x^2 + 3x",
            "предел sin(x)/x при x->0",
            "limit of sin(x)/x as x approaches 0",
            "интеграл x^2 dx",
            "реши 2*(3+5)/4",
            "x**2 - 4 = 0",
            "√4 + |x - 2|",
            "diff(x**2, x)",
            "2 + 3 * 4",
            "раскрой скобки (x+1)^2",
        ];
        for input in inputs {
            let once = norm(input);
            assert_eq!(norm(&once), once, "not idempotent for {input:?}");
        }
    }
}
