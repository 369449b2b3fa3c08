use std::fmt;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Sub,
    /// Multiplication (`*`)
    Mul,
    /// Division (`/`)
    Div,
    /// Modulo (`%`)
    Mod,
    /// Power (`^`), right associative
    Pow,
    /// Arc tangent of two operands (`atan2`)
    Atan2,

    // Comparison
    /// Equal (`==`)
    Eql,
    /// Not equal (`!=`)
    Neq,
    /// Less than (`<`)
    Lss,
    /// Greater than (`>`)
    Gtr,
    /// Less than or equal (`<=`)
    Lte,
    /// Greater than or equal (`>=`)
    Gte,

    // Set
    /// Intersection (`and`)
    And,
    /// Union (`or`)
    Or,
    /// Complement (`unless`)
    Unless,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        use BinOp::*;
        matches!(self, Eql | Neq | Lss | Gtr | Lte | Gte)
    }

    pub fn is_set_operator(self) -> bool {
        use BinOp::*;
        matches!(self, And | Or | Unless)
    }

    pub fn as_str(self) -> &'static str {
        use BinOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            Atan2 => "atan2",
            Eql => "==",
            Neq => "!=",
            Lss => "<",
            Gtr => ">",
            Lte => "<=",
            Gte => ">=",
            And => "and",
            Or => "or",
            Unless => "unless",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary sign operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (`-`)
    Neg,
    /// Identity (`+`)
    Pos,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Pos => f.write_str("+"),
        }
    }
}

/// Aggregation operators (`sum`, `topk`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Avg,
    Bottomk,
    Count,
    CountValues,
    Group,
    Limitk,
    LimitRatio,
    Max,
    Min,
    Quantile,
    Stddev,
    Stdvar,
    Sum,
    Topk,
}

impl AggregateOp {
    /// Looks up an aggregation keyword, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        use AggregateOp::*;
        let op = match name.to_ascii_lowercase().as_str() {
            "avg" => Avg,
            "bottomk" => Bottomk,
            "count" => Count,
            "count_values" => CountValues,
            "group" => Group,
            "limitk" => Limitk,
            "limit_ratio" => LimitRatio,
            "max" => Max,
            "min" => Min,
            "quantile" => Quantile,
            "stddev" => Stddev,
            "stdvar" => Stdvar,
            "sum" => Sum,
            "topk" => Topk,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        use AggregateOp::*;
        match self {
            Avg => "avg",
            Bottomk => "bottomk",
            Count => "count",
            CountValues => "count_values",
            Group => "group",
            Limitk => "limitk",
            LimitRatio => "limit_ratio",
            Max => "max",
            Min => "min",
            Quantile => "quantile",
            Stddev => "stddev",
            Stdvar => "stdvar",
            Sum => "sum",
            Topk => "topk",
        }
    }

    /// Whether the operator takes a leading parameter, as in `topk(5, x)`.
    pub fn takes_param(self) -> bool {
        use AggregateOp::*;
        matches!(
            self,
            Bottomk | CountValues | Limitk | LimitRatio | Quantile | Topk
        )
    }

    /// Experimental operators are rejected unless explicitly enabled.
    pub fn is_experimental(self) -> bool {
        matches!(self, AggregateOp::Limitk | AggregateOp::LimitRatio)
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label grouping clause of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// `by (labels)`
    By(Vec<String>),
    /// `without (labels)`
    Without(Vec<String>),
}

/// How series on both sides of a binary operation are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    #[default]
    OneToOne,
    /// `group_left`
    ManyToOne,
    /// `group_right`
    OneToMany,
    /// Set operators always match many-to-many.
    ManyToMany,
}

/// Vector matching clause of a binary operation.
///
/// # Example
/// ```text
/// a / on (instance) group_left (job) b
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VectorMatching {
    pub card: Cardinality,
    /// `true` for `on (...)`, `false` for `ignoring (...)`
    pub on: bool,
    pub labels: Vec<String>,
    /// Extra labels carried over by `group_left`/`group_right`
    pub include: Vec<String>,
}
