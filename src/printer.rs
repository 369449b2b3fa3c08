//! Indented tree rendering of an expression.
//!
//! The printer walks the tree depth first and emits one line per node: one
//! space of indentation per level, the node kind, a space and the node's
//! canonical text.
//!
//! ```text
//! AggregateExpr sum(rate(http_requests_total[5m]))
//!  Call rate(http_requests_total[5m])
//!   MatrixSelector http_requests_total[5m]
//!    VectorSelector http_requests_total
//! ```
//!
//! Nodes outside the printable taxonomy stop the walk with
//! [`PrintError::UnsupportedNode`]. Lines emitted before that stay emitted.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{Expr, NodeKind};
use crate::output::{TextSink, TreeSink};

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("unsupported expr: {text}")]
    UnsupportedNode { text: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub struct TreePrinter<S: TreeSink> {
    sink: S,
}

impl<S: TreeSink> TreePrinter<S> {
    pub fn new(sink: S) -> Self {
        TreePrinter { sink }
    }

    /// Prints `expr` and its printed children, starting at `level`.
    pub fn print(&mut self, expr: &Expr, level: usize) -> Result<(), PrintError> {
        let (kind, children): (NodeKind, Vec<&Expr>) = match expr {
            Expr::Aggregate { expr: inner, .. } => (NodeKind::AggregateExpr, vec![inner.as_ref()]),
            Expr::Binary { lhs, rhs, .. } => (NodeKind::BinaryExpr, vec![lhs.as_ref(), rhs.as_ref()]),
            Expr::Call { args, .. } => (NodeKind::Call, args.iter().collect()),
            Expr::MatrixSelector { selector, .. } => (NodeKind::MatrixSelector, vec![selector.as_ref()]),
            Expr::Subquery { expr: inner, .. } => (NodeKind::SubqueryExpr, vec![inner.as_ref()]),
            Expr::Paren(inner) => (NodeKind::ParenExpr, vec![inner.as_ref()]),
            Expr::Unary { expr: inner, .. } => (NodeKind::UnaryExpr, vec![inner.as_ref()]),
            Expr::NumberLiteral(_) => (NodeKind::NumberLiteral, vec![]),
            Expr::StringLiteral(_) => (NodeKind::StringLiteral, vec![]),
            Expr::VectorSelector(_) => (NodeKind::VectorSelector, vec![]),
            Expr::StepInvariant(_) => (NodeKind::StepInvariantExpr, vec![]),
            Expr::Extension(ext) => {
                let text = expr.render();
                debug!(kind = ext.expr.name(), %text, level, "unsupported node");
                return Err(PrintError::UnsupportedNode { text });
            }
        };

        let text = expr.render();
        trace!(%kind, level, "print node");
        self.sink.write_node(level, kind, &text)?;

        for child in children {
            self.print(child, level + 1)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), PrintError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Prints `expr` as plain text to `writer`, flushing even on failure.
pub fn print_tree<W: Write>(expr: &Expr, writer: W) -> Result<(), PrintError> {
    let mut printer = TreePrinter::new(TextSink::new(writer, false));
    let result = printer.print(expr, 0);
    printer.flush()?;
    result
}
