//! Canonical source rendering of AST nodes.
//!
//! The output follows the string form Prometheus itself prints for an
//! expression: sorted label matchers, normalized durations, single spaces
//! around binary operators and grouping clauses moved in front of the
//! aggregation arguments.

use std::fmt::{self, Write as _};

use crate::ast::duration::DurationDisplay;
use crate::ast::{AtModifier, Cardinality, Expr, Grouping, Matcher, Offset, VectorMatching, VectorSelector};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Aggregate {
                op,
                expr,
                param,
                grouping,
            } => {
                write!(f, "{op}")?;
                match grouping {
                    Some(Grouping::Without(labels)) => {
                        write!(f, " without ({}) ", LabelList(labels))?
                    }
                    Some(Grouping::By(labels)) if !labels.is_empty() => {
                        write!(f, " by ({}) ", LabelList(labels))?
                    }
                    _ => {}
                }
                f.write_char('(')?;
                if let Some(param) = param {
                    write!(f, "{param}, ")?;
                }
                write!(f, "{expr})")
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                return_bool,
                matching,
            } => {
                write!(f, "{lhs} {op}")?;
                if *return_bool {
                    f.write_str(" bool")?;
                }
                if let Some(matching) = matching {
                    write!(f, "{matching}")?;
                }
                write!(f, " {rhs}")
            }
            Expr::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_char(')')
            }
            Expr::MatrixSelector { selector, range } => match selector.as_ref() {
                // Modifiers of the wrapped selector are printed after the range.
                Expr::VectorSelector(vs) => {
                    write_selector_body(f, vs)?;
                    write!(f, "[{}]", DurationDisplay(*range))?;
                    write_modifiers(f, vs.at.as_ref(), vs.offset.as_ref())
                }
                other => write!(f, "{other}[{}]", DurationDisplay(*range)),
            },
            Expr::Subquery {
                expr,
                range,
                step,
                offset,
                at,
            } => {
                write!(f, "{expr}[{}:", DurationDisplay(*range))?;
                if let Some(step) = step.filter(|s| !s.is_zero()) {
                    write!(f, "{}", DurationDisplay(step))?;
                }
                f.write_char(']')?;
                write_modifiers(f, at.as_ref(), offset.as_ref())
            }
            Expr::Paren(expr) => write!(f, "({expr})"),
            Expr::Unary { op, expr } => write!(f, "{op}{expr}"),
            Expr::NumberLiteral(val) => f.write_str(&format_number(*val)),
            Expr::StringLiteral(val) => f.write_str(&quote(val)),
            Expr::VectorSelector(vs) => write!(f, "{vs}"),
            Expr::StepInvariant(expr) => write!(f, "{expr}"),
            Expr::Extension(ext) => f.write_str(&ext.expr.render()),
        }
    }
}

impl fmt::Display for VectorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_selector_body(f, self)?;
        write_modifiers(f, self.at.as_ref(), self.offset.as_ref())
    }
}

/// Writes name and matchers, leaving out `@` and `offset`.
fn write_selector_body(f: &mut fmt::Formatter<'_>, vs: &VectorSelector) -> fmt::Result {
    let mut labels: Vec<String> = vs.matchers.iter().map(|m| m.to_string()).collect();
    labels.sort();

    let name = vs.name.as_deref().unwrap_or_default();
    if !name.is_empty() && !is_legacy_metric_name(name) {
        // Names outside the classic charset can only be spelled inside braces.
        labels.insert(0, quote(name));
        return write!(f, "{{{}}}", labels.join(","));
    }

    f.write_str(name)?;
    if !labels.is_empty() {
        write!(f, "{{{}}}", labels.join(","))?;
    }
    Ok(())
}

fn write_modifiers(
    f: &mut fmt::Formatter<'_>,
    at: Option<&AtModifier>,
    offset: Option<&Offset>,
) -> fmt::Result {
    if let Some(at) = at {
        write!(f, " {at}")?;
    }
    if let Some(offset) = offset.filter(|o| !o.is_zero()) {
        write!(f, " {offset}")?;
    }
    Ok(())
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            LabelName(&self.name),
            self.op.as_str(),
            quote(&self.value)
        )
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Pos(d) => write!(f, "offset {}", DurationDisplay(*d)),
            Offset::Neg(d) => write!(f, "offset -{}", DurationDisplay(*d)),
        }
    }
}

impl fmt::Display for AtModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtModifier::Start => f.write_str("@ start()"),
            AtModifier::End => f.write_str("@ end()"),
            AtModifier::At(ms) => write!(f, "@ {:.3}", *ms as f64 / 1000.0),
        }
    }
}

impl fmt::Display for VectorMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.card {
            Cardinality::ManyToOne => Some("left"),
            Cardinality::OneToMany => Some("right"),
            Cardinality::OneToOne | Cardinality::ManyToMany => None,
        };
        // A bare `ignoring ()` only needs printing when a group modifier follows.
        if !self.on && self.labels.is_empty() && side.is_none() {
            return Ok(());
        }
        let tag = if self.on { "on" } else { "ignoring" };
        write!(f, " {tag} ({})", LabelList(&self.labels))?;

        if let Some(side) = side {
            write!(f, " group_{side} ({})", LabelList(&self.include))?;
        }
        Ok(())
    }
}

/// Comma separated label names, quoted where required.
struct LabelList<'a>(&'a [String]);

impl fmt::Display for LabelList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", LabelName(label))?;
        }
        Ok(())
    }
}

struct LabelName<'a>(&'a str);

impl fmt::Display for LabelName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_legacy_label_name(self.0) {
            f.write_str(self.0)
        } else {
            f.write_str(&quote(self.0))
        }
    }
}

/// Shortest form that round-trips, the way Go's `%v` prints a float64:
/// plain decimals for exponents in `-4..6`, otherwise `1e+06` style with at
/// least two exponent digits.
pub fn format_number(val: f64) -> String {
    if val.is_nan() {
        return "NaN".to_string();
    }
    if val.is_infinite() {
        let sign = if val > 0.0 { '+' } else { '-' };
        return format!("{sign}Inf");
    }

    let sci = format!("{val:e}");
    let Some((mantissa, exp)) = sci
        .split_once('e')
        .and_then(|(m, e)| Some((m, e.parse::<i32>().ok()?)))
    else {
        return val.to_string();
    };
    if (-4..SHORTEST_EXP_LIMIT).contains(&exp) {
        return val.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

/// Go's shortest `%g` switches to exponent form at this decimal exponent.
const SHORTEST_EXP_LIMIT: i32 = 6;

/// Double-quotes a string, escaping it the way Go's `strconv.Quote` does.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_control() => {
                let code = c as u32;
                if code < 0x80 {
                    let _ = write!(out, "\\x{code:02x}");
                } else if code <= 0xffff {
                    let _ = write!(out, "\\u{code:04x}");
                } else {
                    let _ = write!(out, "\\U{code:08x}");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_legacy_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_legacy_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
