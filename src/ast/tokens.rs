use std::fmt;
use std::time::Duration;

use crate::ast::AggregateOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Float literal, also produced for `Inf` and `NaN`
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14e2
    /// 0x1f
    /// ```
    Number(f64),

    /// Duration literal
    ///
    /// # Examples
    /// ```text
    /// 5m
    /// 1h30m
    /// ```
    Duration(Duration),

    /// Unescaped string literal in `"`, `'` or backtick quotes
    String(String),

    /// Metric, label or function name. Metric names may contain `:`.
    Identifier(String),

    // Keywords (case-insensitive)
    /// Aggregation operator such as `sum` or `topk`
    Aggregator(AggregateOp),
    And,
    Or,
    Unless,
    Atan2,
    By,
    Without,
    On,
    Ignoring,
    GroupLeft,
    GroupRight,
    Bool,
    Offset,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `=` in label matchers
    Assign,
    /// `=~`
    RegexMatch,
    /// `!~`
    RegexNotMatch,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    At,

    Eof,
}

impl Token {
    /// Maps a lowercased word to its keyword token.
    pub fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "and" => Token::And,
            "or" => Token::Or,
            "unless" => Token::Unless,
            "atan2" => Token::Atan2,
            "by" => Token::By,
            "without" => Token::Without,
            "on" => Token::On,
            "ignoring" => Token::Ignoring,
            "group_left" => Token::GroupLeft,
            "group_right" => Token::GroupRight,
            "bool" => Token::Bool,
            "offset" => Token::Offset,
            _ => return AggregateOp::from_name(word).map(Token::Aggregator),
        };
        Some(token)
    }

    /// Words that may double as label names in matchers and grouping lists.
    pub fn is_word(&self) -> bool {
        use Token::*;
        matches!(
            self,
            Identifier(_)
                | Aggregator(_)
                | And
                | Or
                | Unless
                | Atan2
                | By
                | Without
                | On
                | Ignoring
                | GroupLeft
                | GroupRight
                | Bool
                | Offset
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;
        let text = match self {
            Number(n) => return write!(f, "number {n}"),
            Duration(d) => return write!(f, "duration {}", crate::ast::duration::DurationDisplay(*d)),
            String(s) => return write!(f, "string {s:?}"),
            Identifier(s) => return write!(f, "identifier {s:?}"),
            Aggregator(op) => return write!(f, "\"{op}\""),
            And => "\"and\"",
            Or => "\"or\"",
            Unless => "\"unless\"",
            Atan2 => "\"atan2\"",
            By => "\"by\"",
            Without => "\"without\"",
            On => "\"on\"",
            Ignoring => "\"ignoring\"",
            GroupLeft => "\"group_left\"",
            GroupRight => "\"group_right\"",
            Bool => "\"bool\"",
            Offset => "\"offset\"",
            Plus => "\"+\"",
            Minus => "\"-\"",
            Star => "\"*\"",
            Slash => "\"/\"",
            Percent => "\"%\"",
            Caret => "\"^\"",
            EqEq => "\"==\"",
            NotEq => "\"!=\"",
            Lt => "\"<\"",
            LtEq => "\"<=\"",
            Gt => "\">\"",
            GtEq => "\">=\"",
            Assign => "\"=\"",
            RegexMatch => "\"=~\"",
            RegexNotMatch => "\"!~\"",
            LParen => "\"(\"",
            RParen => "\")\"",
            LBrace => "\"{\"",
            RBrace => "\"}\"",
            LBracket => "\"[\"",
            RBracket => "\"]\"",
            Comma => "\",\"",
            Colon => "\":\"",
            At => "\"@\"",
            Eof => "end of input",
        };
        f.write_str(text)
    }
}
