//! Step-invariant preprocessing.
//!
//! A subtree is step invariant when it yields the same value at every step of
//! a range query, for example `foo @ 100` or `rate(foo[5m] @ end())`. Such
//! subtrees are wrapped in [`Expr::StepInvariant`] so they are visible in the
//! printed tree.

use std::mem;

use tracing::debug;

use crate::ast::Expr;
use crate::functions;

/// Wraps every maximal step-invariant subtree of `expr`.
pub fn wrap_step_invariant(mut expr: Expr) -> Expr {
    let invariant = mark(&mut expr);
    debug!(invariant, "step invariant preprocessing done");
    if invariant {
        Expr::StepInvariant(Box::new(expr))
    } else {
        expr
    }
}

/// Returns whether `expr` as a whole is invariant. Invariant children of a
/// variant node are wrapped on the way back up.
fn mark(expr: &mut Expr) -> bool {
    match expr {
        Expr::NumberLiteral(_) | Expr::StringLiteral(_) => true,
        Expr::VectorSelector(vs) => vs.at.is_some(),
        Expr::MatrixSelector { selector, .. } => mark(selector),
        Expr::Paren(inner) | Expr::Unary { expr: inner, .. } | Expr::Aggregate { expr: inner, .. } => {
            mark(inner)
        }
        Expr::Binary { lhs, rhs, .. } => {
            let lhs_invariant = mark(lhs);
            let rhs_invariant = mark(rhs);
            if lhs_invariant && rhs_invariant {
                return true;
            }
            if lhs_invariant {
                wrap(lhs);
            }
            if rhs_invariant {
                wrap(rhs);
            }
            false
        }
        Expr::Call { func, args } => {
            let flags: Vec<bool> = args.iter_mut().map(mark).collect();
            if !functions::is_time_dependent(func) && flags.iter().all(|&f| f) {
                return true;
            }
            for (arg, invariant) in args.iter_mut().zip(flags) {
                if invariant {
                    wrap(arg);
                }
            }
            false
        }
        Expr::Subquery { expr: inner, at, .. } => {
            // The inner query runs once per subquery step, so it is wrapped
            // on its own even when the subquery is pinned too.
            if mark(inner) {
                wrap(inner);
            }
            at.is_some()
        }
        Expr::StepInvariant(_) => true,
        Expr::Extension(_) => false,
    }
}

fn wrap(expr: &mut Expr) {
    let inner = mem::replace(expr, Expr::NumberLiteral(0.0));
    *expr = Expr::StepInvariant(Box::new(inner));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn preprocessed(query: &str) -> String {
        let expr = wrap_step_invariant(parse(query).unwrap());
        format!("{expr:?}")
    }

    #[test]
    fn literal_root_is_wrapped() {
        let expr = wrap_step_invariant(parse("1 + 2").unwrap());
        assert!(matches!(expr, Expr::StepInvariant(_)));
    }

    #[test]
    fn plain_selector_is_untouched() {
        let expr = wrap_step_invariant(parse("up").unwrap());
        assert!(matches!(expr, Expr::VectorSelector(_)));
    }

    #[test]
    fn time_dependent_call_is_not_invariant() {
        let expr = wrap_step_invariant(parse("timestamp(foo @ 10)").unwrap());
        let Expr::Call { args, .. } = &expr else {
            panic!("expected call, got {expr:?}");
        };
        assert!(matches!(args[0], Expr::StepInvariant(_)));
    }

    #[test]
    fn subquery_inner_is_wrapped() {
        let text = preprocessed("sum_over_time((foo @ 10)[5m:1m])");
        assert!(text.contains("Subquery { expr: StepInvariant("));
    }
}
