use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::ast::{AggregateOp, AtModifier, BinOp, Grouping, Offset, UnaryOp, VectorMatching, VectorSelector};

/// Abstract Syntax Tree node representing a parsed PromQL expression.
///
/// Every node owns its children, so a tree is finite and acyclic. The tree is
/// not mutated after parsing, with the exception of the optional
/// [`crate::preprocess`] pass which rebuilds it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Aggregation over an instant vector
    ///
    /// # Examples
    /// ```text
    /// sum by (job) (rate(http_requests_total[5m]))
    /// topk(5, node_load1)
    /// ```
    Aggregate {
        op: AggregateOp,
        expr: Box<Expr>,
        /// Leading parameter of `topk`, `quantile`, `count_values`, ...
        param: Option<Box<Expr>>,
        grouping: Option<Grouping>,
    },

    /// Binary operation
    ///
    /// # Examples
    /// ```text
    /// 1 + 2
    /// errors / on (job) requests
    /// up == bool 1
    /// ```
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// `bool` modifier on comparisons
        return_bool: bool,
        matching: Option<VectorMatching>,
    },

    /// Function call
    ///
    /// # Example
    /// ```text
    /// histogram_quantile(0.9, rate(latency_bucket[5m]))
    /// ```
    Call { func: String, args: Vec<Expr> },

    /// Range vector selector, always wrapping a [`Expr::VectorSelector`]
    ///
    /// # Example
    /// ```text
    /// http_requests_total[5m]
    /// ```
    MatrixSelector { selector: Box<Expr>, range: Duration },

    /// Subquery
    ///
    /// # Example
    /// ```text
    /// rate(http_requests_total[5m])[30m:1m]
    /// ```
    Subquery {
        expr: Box<Expr>,
        range: Duration,
        step: Option<Duration>,
        offset: Option<Offset>,
        at: Option<AtModifier>,
    },

    /// Parenthesized expression, kept to show the source structure
    Paren(Box<Expr>),

    /// Unary sign applied to a non-literal operand
    Unary { op: UnaryOp, expr: Box<Expr> },

    /// Float literal, including `Inf` and `NaN`
    NumberLiteral(f64),

    /// String literal (unescaped value)
    StringLiteral(String),

    /// Instant vector selector
    VectorSelector(VectorSelector),

    /// Subtree whose value is identical at every evaluation step
    StepInvariant(Box<Expr>),

    /// Node contributed by a grammar extension. Not part of the printable
    /// taxonomy.
    Extension(Extension),
}

/// Display labels of the printable node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    AggregateExpr,
    BinaryExpr,
    Call,
    MatrixSelector,
    NumberLiteral,
    ParenExpr,
    StepInvariantExpr,
    StringLiteral,
    SubqueryExpr,
    UnaryExpr,
    VectorSelector,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        use NodeKind::*;
        match self {
            AggregateExpr => "AggregateExpr",
            BinaryExpr => "BinaryExpr",
            Call => "Call",
            MatrixSelector => "MatrixSelector",
            NumberLiteral => "NumberLiteral",
            ParenExpr => "ParenExpr",
            StepInvariantExpr => "StepInvariantExpr",
            StringLiteral => "StringLiteral",
            SubqueryExpr => "SubqueryExpr",
            UnaryExpr => "UnaryExpr",
            VectorSelector => "VectorSelector",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Expr {
    /// Variant tag, or `None` for extension nodes.
    pub fn kind(&self) -> Option<NodeKind> {
        let kind = match self {
            Expr::Aggregate { .. } => NodeKind::AggregateExpr,
            Expr::Binary { .. } => NodeKind::BinaryExpr,
            Expr::Call { .. } => NodeKind::Call,
            Expr::MatrixSelector { .. } => NodeKind::MatrixSelector,
            Expr::Subquery { .. } => NodeKind::SubqueryExpr,
            Expr::Paren(_) => NodeKind::ParenExpr,
            Expr::Unary { .. } => NodeKind::UnaryExpr,
            Expr::NumberLiteral(_) => NodeKind::NumberLiteral,
            Expr::StringLiteral(_) => NodeKind::StringLiteral,
            Expr::VectorSelector(_) => NodeKind::VectorSelector,
            Expr::StepInvariant(_) => NodeKind::StepInvariantExpr,
            Expr::Extension(_) => return None,
        };
        Some(kind)
    }

    /// Name of the node kind, including extension names.
    pub fn kind_name(&self) -> &str {
        match self {
            Expr::Extension(ext) => ext.expr.name(),
            _ => self.kind().map(NodeKind::label).unwrap_or_default(),
        }
    }

    /// Immediate children in grammar order.
    ///
    /// This is the full structural view: the aggregation parameter and the
    /// operand of a step-invariant wrapper are included.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Aggregate { expr, param, .. } => {
                param.as_deref().into_iter().chain([&**expr]).collect()
            }
            Expr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Call { args, .. } => args.iter().collect(),
            Expr::MatrixSelector { selector, .. } => vec![selector.as_ref()],
            Expr::Subquery { expr, .. }
            | Expr::Paren(expr)
            | Expr::Unary { expr, .. }
            | Expr::StepInvariant(expr) => vec![expr.as_ref()],
            Expr::NumberLiteral(_) | Expr::StringLiteral(_) | Expr::VectorSelector(_) => vec![],
            Expr::Extension(ext) => ext.expr.children(),
        }
    }

    /// Canonical one-line source text of this node.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Number of nodes in the tree rooted here.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}

impl From<VectorSelector> for Expr {
    fn from(vs: VectorSelector) -> Self {
        Expr::VectorSelector(vs)
    }
}

/// A node kind defined outside the core grammar.
///
/// # Example
/// ```
/// use promtree::ast::{Expr, Extension, ExtensionExpr};
///
/// #[derive(Debug)]
/// struct Placeholder;
///
/// impl ExtensionExpr for Placeholder {
///     fn name(&self) -> &str { "Placeholder" }
///     fn render(&self) -> String { "<placeholder>".to_string() }
/// }
///
/// let expr = Expr::Extension(Extension::new(Placeholder));
/// assert_eq!(expr.kind(), None);
/// assert_eq!(expr.render(), "<placeholder>");
/// ```
pub trait ExtensionExpr: fmt::Debug + Send + Sync {
    /// Node kind name, e.g. `DurationExpr`.
    fn name(&self) -> &str;

    /// Canonical source text, without trailing whitespace.
    fn render(&self) -> String;

    fn children(&self) -> Vec<&Expr> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
pub struct Extension {
    pub expr: Arc<dyn ExtensionExpr>,
}

impl Extension {
    pub fn new(expr: impl ExtensionExpr + 'static) -> Self {
        Extension {
            expr: Arc::new(expr),
        }
    }
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.expr, &other.expr)
            || (self.expr.name() == other.expr.name() && self.expr.render() == other.expr.render())
    }
}
