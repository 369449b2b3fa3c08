//! # PromQL - Abstract Syntax Tree
//!
//! This module defines the expression model produced by the parser and walked
//! by the tree printer.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - The [`Expr`] sum type and its node kinds
//! - **[operators]** - Binary, unary and aggregation operators, vector matching
//! - **[selectors]** - Vector selectors, label matchers, `offset` and `@`
//! - **[duration]** - Duration literals and their canonical form
//! - **[display]** - Canonical one-line rendering of every node
//!
//! ## Node Taxonomy
//!
//! | Node              | Printed children        |
//! |-------------------|-------------------------|
//! | BinaryExpr        | lhs, rhs                |
//! | UnaryExpr         | operand                 |
//! | AggregateExpr     | aggregated expression   |
//! | Call              | arguments, in order     |
//! | MatrixSelector    | the vector selector     |
//! | SubqueryExpr      | inner expression        |
//! | ParenExpr         | inner expression        |
//! | NumberLiteral     | -                       |
//! | StringLiteral     | -                       |
//! | VectorSelector    | -                       |
//! | StepInvariantExpr | - (opaque)              |
//!
//! [`Expr::Extension`] holds nodes from grammar extensions. They render, but
//! are outside the taxonomy above and the printer refuses them.
//!
//! ## Canonical Form
//!
//! ```text
//! sum(rate(http_requests_total{job="api"}[5m])) by (code)
//! ```
//!
//! renders as
//!
//! ```text
//! sum by (code) (rate(http_requests_total{job="api"}[5m]))
//! ```
pub mod display;
pub mod duration;
pub mod expressions;
pub mod operators;
pub mod selectors;
pub mod tokens;

pub use duration::{DurationDisplay, duration_from_secs, parse_duration};
pub use expressions::{Expr, Extension, ExtensionExpr, NodeKind};
pub use operators::{AggregateOp, BinOp, Cardinality, Grouping, UnaryOp, VectorMatching};
pub use selectors::{AtModifier, MatchOp, Matcher, Offset, VectorSelector};
pub use tokens::Token;
