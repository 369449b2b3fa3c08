use std::mem;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        AggregateOp, AtModifier, BinOp, Cardinality, Expr, Grouping, MatchOp, Matcher, Offset,
        Token, UnaryOp, VectorMatching, VectorSelector, duration_from_secs,
        selectors::anchored_regex,
    },
    functions,
    lexer::{LexError, Lexeme, Lexer, Position},
};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{position}: parse error: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            position: err.position,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Accept experimental functions and aggregations such as `info` and
    /// `limitk`.
    pub experimental_functions: bool,
}

/// Anything that turns query text into an expression tree.
pub trait QueryParser {
    fn parse(&self, text: &str) -> Result<Expr, ParseError>;
}

/// The PromQL grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromQl {
    pub options: ParserOptions,
}

impl PromQl {
    pub fn new(options: ParserOptions) -> Self {
        PromQl { options }
    }
}

impl QueryParser for PromQl {
    fn parse(&self, text: &str) -> Result<Expr, ParseError> {
        debug!(len = text.len(), "parsing query");
        let expr = Parser::with_options(Lexer::new(text), self.options)?.parse()?;
        debug!(nodes = expr.node_count(), "parsed query");
        Ok(expr)
    }
}

/// Parses `text` with default options.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    PromQl::default().parse(text)
}

pub struct Parser {
    lexer: Lexer,
    current: Lexeme,
    options: ParserOptions,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Self::with_options(lexer, ParserOptions::default())
    }

    pub fn with_options(mut lexer: Lexer, options: ParserOptions) -> Result<Self, ParseError> {
        let current = lexer.next_lexeme()?;
        Ok(Parser {
            lexer,
            current,
            options,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_lexeme()?;
        Ok(())
    }

    /// Moves past the current token and hands it back.
    fn take(&mut self) -> Result<Lexeme, ParseError> {
        let next = self.lexer.next_lexeme()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<Lexeme, ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(context, &expected.to_string()));
        }
        self.take()
    }

    fn error_at(&self, message: impl Into<String>, position: Position) -> ParseError {
        ParseError {
            message: message.into(),
            position,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(message, self.current.position)
    }

    fn unexpected(&self, context: &str, expected: &str) -> ParseError {
        self.error(format!(
            "unexpected {} in {context}, expected {expected}",
            self.current.token
        ))
    }

    /// Parses a complete query; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.check(&Token::Eof) {
            return Err(self.error("no expression found in input"));
        }
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.error(format!("unexpected {}", self.current.token)));
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_unless()?;

        while self.check(&Token::Or) {
            self.advance()?;
            left = self.finish_binary(BinOp::Or, left, Self::parse_and_unless)?;
        }
        Ok(left)
    }

    fn parse_and_unless(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match &self.current.token {
                Token::And => BinOp::And,
                Token::Unless => BinOp::Unless,
                _ => break,
            };
            self.advance()?;
            left = self.finish_binary(op, left, Self::parse_comparison)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current.token {
                Token::EqEq => BinOp::Eql,
                Token::NotEq => BinOp::Neq,
                Token::Lt => BinOp::Lss,
                Token::Gt => BinOp::Gtr,
                Token::LtEq => BinOp::Lte,
                Token::GtEq => BinOp::Gte,
                _ => break,
            };
            self.advance()?;
            left = self.finish_binary(op, left, Self::parse_additive)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current.token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            left = self.finish_binary(op, left, Self::parse_multiplicative)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current.token {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                Token::Atan2 => BinOp::Atan2,
                _ => break,
            };
            self.advance()?;
            left = self.finish_binary(op, left, Self::parse_unary)?;
        }
        Ok(left)
    }

    /// Unary signs bind like multiplication: `-a * b` is `(-a) * b` while
    /// `-a ^ b` is `-(a ^ b)`.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match &self.current.token {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance()?;

        let operand = self.parse_unary()?;
        Ok(match (op, operand) {
            (UnaryOp::Neg, Expr::NumberLiteral(val)) => Expr::NumberLiteral(-val),
            (UnaryOp::Pos, Expr::NumberLiteral(val)) => Expr::NumberLiteral(val),
            (op, operand) => Expr::Unary {
                op,
                expr: Box::new(operand),
            },
        })
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;

        if self.check(&Token::Caret) {
            self.advance()?;
            // Right associative, and the exponent may carry a sign.
            return self.finish_binary(BinOp::Pow, base, Self::parse_unary);
        }
        Ok(base)
    }

    /// Parses the `bool` and vector matching modifiers following `op`, then
    /// the right-hand side.
    fn finish_binary(
        &mut self,
        op: BinOp,
        lhs: Expr,
        parse_rhs: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut return_bool = false;
        if self.check(&Token::Bool) {
            if !op.is_comparison() {
                return Err(self.error("bool modifier can only be used on comparison operators"));
            }
            self.advance()?;
            return_bool = true;
        }

        let mut matching = op.is_set_operator().then(|| VectorMatching {
            card: Cardinality::ManyToMany,
            ..Default::default()
        });

        if self.check(&Token::On) || self.check(&Token::Ignoring) {
            let on = self.check(&Token::On);
            self.advance()?;
            let labels = self.parse_label_list("grouping opts")?;
            let mut m = matching.take().unwrap_or_default();
            m.on = on;
            m.labels = labels;

            if self.check(&Token::GroupLeft) || self.check(&Token::GroupRight) {
                if op.is_set_operator() {
                    return Err(self.error(format!("no grouping allowed for {:?} operation", op.as_str())));
                }
                m.card = if self.check(&Token::GroupLeft) {
                    Cardinality::ManyToOne
                } else {
                    Cardinality::OneToMany
                };
                self.advance()?;
                if self.check(&Token::LParen) {
                    m.include = self.parse_label_list("grouping opts")?;
                }
                if m.on {
                    if let Some(label) = m.include.iter().find(|l| m.labels.contains(l)) {
                        return Err(self.error(format!(
                            "label {label:?} must not occur in ON and GROUP clause at once"
                        )));
                    }
                }
            }
            matching = Some(m);
        }

        let rhs = parse_rhs(self)?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            return_bool,
            matching,
        })
    }

    /// Applies `[range]`, `[range:step]`, `offset` and `@` suffixes.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current.token {
                Token::LBracket => expr = self.parse_range(expr)?,
                Token::Offset => self.parse_offset(&mut expr)?,
                Token::At => self.parse_at(&mut expr)?,
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_range(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        let open = self.expect(Token::LBracket, "range")?;
        let range = self.parse_duration_value("range")?;

        if self.check(&Token::Colon) {
            self.advance()?;
            let step = match &self.current.token {
                Token::RBracket => None,
                _ => Some(self.parse_duration_value("subquery step")?),
            };
            self.expect(Token::RBracket, "subquery")?;
            return Ok(Expr::Subquery {
                expr: Box::new(expr),
                range,
                step,
                offset: None,
                at: None,
            });
        }

        self.expect(Token::RBracket, "range")?;
        let Expr::VectorSelector(vs) = &expr else {
            return Err(self.error_at("ranges only allowed for vector selectors", open.position));
        };
        if vs.has_modifiers() {
            return Err(self.error_at("no offset modifiers allowed before range", open.position));
        }
        Ok(Expr::MatrixSelector {
            selector: Box::new(expr),
            range,
        })
    }

    /// A duration literal, or a plain number of seconds.
    fn parse_duration_value(&mut self, context: &str) -> Result<Duration, ParseError> {
        let duration = match &self.current.token {
            Token::Duration(d) => *d,
            Token::Number(n) => {
                let n = *n;
                duration_from_secs(n).map_err(|msg| self.error(format!("{msg} in {context}")))?
            }
            _ => return Err(self.unexpected(context, "duration")),
        };
        self.advance()?;
        Ok(duration)
    }

    fn parse_offset(&mut self, expr: &mut Expr) -> Result<(), ParseError> {
        let keyword = self.expect(Token::Offset, "offset")?;
        let negative = self.check(&Token::Minus);
        if negative {
            self.advance()?;
        }
        let duration = self.parse_duration_value("offset")?;
        let offset = if negative {
            Offset::Neg(duration)
        } else {
            Offset::Pos(duration)
        };

        let Some((slot, _)) = modifier_slots(expr) else {
            return Err(self.error_at(
                "offset modifier must be preceded by an instant vector selector or range vector selector or a subquery",
                keyword.position,
            ));
        };
        if slot.is_some() {
            return Err(self.error_at("offset may not be set multiple times", keyword.position));
        }
        *slot = Some(offset);
        Ok(())
    }

    fn parse_at(&mut self, expr: &mut Expr) -> Result<(), ParseError> {
        let keyword = self.expect(Token::At, "@ modifier")?;
        let at = self.parse_at_value()?;

        let Some((_, slot)) = modifier_slots(expr) else {
            return Err(self.error_at(
                "@ modifier must be preceded by an instant vector selector or range vector selector or a subquery",
                keyword.position,
            ));
        };
        if slot.is_some() {
            return Err(self.error_at("@ <timestamp> may not be set multiple times", keyword.position));
        }
        *slot = Some(at);
        Ok(())
    }

    fn parse_at_value(&mut self) -> Result<AtModifier, ParseError> {
        if let Token::Identifier(name) = &self.current.token {
            let at = match name.to_ascii_lowercase().as_str() {
                "start" => AtModifier::Start,
                "end" => AtModifier::End,
                _ => return Err(self.unexpected("@ modifier", "timestamp, \"start()\" or \"end()\"")),
            };
            self.advance()?;
            self.expect(Token::LParen, "@ modifier")?;
            self.expect(Token::RParen, "@ modifier")?;
            return Ok(at);
        }

        let negative = self.check(&Token::Minus);
        if negative || self.check(&Token::Plus) {
            self.advance()?;
        }
        let position = self.current.position;
        let Token::Number(value) = self.current.token else {
            return Err(self.unexpected("@ modifier", "timestamp"));
        };
        self.advance()?;

        let value = if negative { -value } else { value };
        let millis = (value * 1000.0).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 || millis <= i64::MIN as f64 {
            return Err(self.error_at(
                format!("timestamp out of bounds for @ modifier: {value}"),
                position,
            ));
        }
        Ok(AtModifier::At(millis as i64))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match &self.current.token {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expr::NumberLiteral(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expr::StringLiteral(s))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "paren expression")?;
                Ok(Expr::Paren(Box::new(expr)))
            }
            Token::LBrace => self.parse_vector_selector(None),
            Token::Aggregator(op) => {
                let op = *op;
                self.parse_aggregate(op)
            }
            Token::Identifier(_) => {
                let ident = self.take()?;
                if self.check(&Token::LParen) {
                    self.parse_call(ident)
                } else {
                    self.parse_vector_selector(Some(ident))
                }
            }
            token if token.is_word() => {
                let ident = self.take()?;
                self.parse_vector_selector(Some(ident))
            }
            Token::Eof => Err(self.error("unexpected end of input")),
            token => Err(self.error(format!("unexpected {token}"))),
        }
    }

    fn parse_call(&mut self, ident: Lexeme) -> Result<Expr, ParseError> {
        let Lexeme { text: name, position, .. } = ident;
        let Some(function) = functions::lookup(&name) else {
            return Err(self.error_at(format!("unknown function with name {name:?}"), position));
        };
        if function.experimental && !self.options.experimental_functions {
            return Err(self.error_at(format!("function {name:?} is not enabled"), position));
        }

        self.expect(Token::LParen, "function call")?;
        let mut args = vec![];
        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "function call arguments")?;
            }
        }
        self.expect(Token::RParen, "function call")?;

        function
            .check_arity(args.len())
            .map_err(|message| self.error_at(message, position))?;

        Ok(Expr::Call { func: name, args })
    }

    fn parse_aggregate(&mut self, op: AggregateOp) -> Result<Expr, ParseError> {
        let keyword = self.take()?;
        // Without a grouping clause or argument list the keyword is a metric name.
        if !matches!(self.current.token, Token::LParen | Token::By | Token::Without) {
            return self.parse_vector_selector(Some(keyword));
        }
        if op.is_experimental() && !self.options.experimental_functions {
            return Err(self.error_at(format!("aggregation {:?} is not enabled", op.as_str()), keyword.position));
        }

        let mut grouping = self.parse_grouping()?;

        let open = self.expect(Token::LParen, "aggregation")?;
        if self.check(&Token::RParen) {
            return Err(self.error_at("no arguments for aggregate expression provided", open.position));
        }
        let mut args = vec![];
        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "aggregation")?;
            }
        }
        self.expect(Token::RParen, "aggregation")?;

        if grouping.is_none() {
            grouping = self.parse_grouping()?;
        }

        let expected = if op.takes_param() { 2 } else { 1 };
        if args.len() != expected {
            return Err(self.error_at(
                format!(
                    "wrong number of arguments for aggregate expression provided, expected {expected}, got {}",
                    args.len()
                ),
                open.position,
            ));
        }

        let mut args = args.into_iter().map(Box::new);
        let param = if op.takes_param() { args.next() } else { None };
        let expr = args.next().ok_or_else(|| {
            self.error_at("no arguments for aggregate expression provided", open.position)
        })?;
        Ok(Expr::Aggregate {
            op,
            expr,
            param,
            grouping,
        })
    }

    fn parse_grouping(&mut self) -> Result<Option<Grouping>, ParseError> {
        let grouping = match &self.current.token {
            Token::By => Grouping::By,
            Token::Without => Grouping::Without,
            _ => return Ok(None),
        };
        self.advance()?;
        let labels = self.parse_label_list("grouping opts")?;
        Ok(Some(grouping(labels)))
    }

    /// `( label, ... )` with an optional trailing comma.
    fn parse_label_list(&mut self, context: &str) -> Result<Vec<String>, ParseError> {
        self.expect(Token::LParen, context)?;
        let mut labels = vec![];
        while !self.check(&Token::RParen) {
            labels.push(self.parse_label_name(context)?);
            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, context)?;
            }
        }
        self.expect(Token::RParen, context)?;
        Ok(labels)
    }

    fn parse_label_name(&mut self, context: &str) -> Result<String, ParseError> {
        if !self.current.token.is_word() && !self.check(&Token::String(String::new())) {
            return Err(self.unexpected(context, "label"));
        }
        let lexeme = self.take()?;
        Ok(match lexeme.token {
            Token::String(s) => s,
            Token::Identifier(s) => s,
            _ => lexeme.text,
        })
    }

    fn parse_vector_selector(&mut self, ident: Option<Lexeme>) -> Result<Expr, ParseError> {
        let position = ident
            .as_ref()
            .map_or(self.current.position, |lexeme| lexeme.position);
        let mut selector = VectorSelector {
            name: ident.map(|lexeme| lexeme.text),
            ..Default::default()
        };

        if self.check(&Token::LBrace) {
            self.advance()?;
            while !self.check(&Token::RBrace) {
                self.parse_matcher(&mut selector)?;
                if !self.check(&Token::RBrace) {
                    self.expect(Token::Comma, "label matching")?;
                }
            }
            self.expect(Token::RBrace, "label matching")?;
        }

        let has_name = selector.name.as_deref().is_some_and(|n| !n.is_empty());
        if !has_name && selector.matchers.iter().all(Matcher::matches_empty) {
            return Err(self.error_at(
                "vector selector must contain at least one non-empty matcher",
                position,
            ));
        }
        Ok(Expr::VectorSelector(selector))
    }

    fn parse_matcher(&mut self, selector: &mut VectorSelector) -> Result<(), ParseError> {
        let label_position = self.current.position;
        let quoted = self.check(&Token::String(String::new()));
        let name = self.parse_label_name("label matching")?;

        // A bare quoted string names the metric: {"http.requests", job="api"}
        if quoted && (self.check(&Token::Comma) || self.check(&Token::RBrace)) {
            if let Some(existing) = &selector.name {
                return Err(self.error_at(
                    format!("metric name must not be set twice: {existing:?} or {name:?}"),
                    label_position,
                ));
            }
            selector.name = Some(name);
            return Ok(());
        }

        let op = match &self.current.token {
            Token::Assign => MatchOp::Equal,
            Token::NotEq => MatchOp::NotEqual,
            Token::RegexMatch => MatchOp::Re,
            Token::RegexNotMatch => MatchOp::NotRe,
            _ => return Err(self.unexpected("label matching", "label matching operator")),
        };
        self.advance()?;

        let value_position = self.current.position;
        let value = match self.take()? {
            Lexeme {
                token: Token::String(s),
                ..
            } => s,
            lexeme => {
                return Err(self.error_at(
                    format!("unexpected {} in label matching, expected string", lexeme.token),
                    lexeme.position,
                ));
            }
        };

        if op.is_regex() {
            anchored_regex(&value).map_err(|err| {
                self.error_at(format!("invalid regular expression {value:?}: {err}"), value_position)
            })?;
        }

        selector.matchers.push(Matcher::new(name, op, value));
        Ok(())
    }
}

/// Offset and `@` slots of the node a modifier attaches to. A range
/// selector forwards to its inner selector.
fn modifier_slots(expr: &mut Expr) -> Option<(&mut Option<Offset>, &mut Option<AtModifier>)> {
    match expr {
        Expr::VectorSelector(vs) => Some((&mut vs.offset, &mut vs.at)),
        Expr::MatrixSelector { selector, .. } => match selector.as_mut() {
            Expr::VectorSelector(vs) => Some((&mut vs.offset, &mut vs.at)),
            _ => None,
        },
        Expr::Subquery { offset, at, .. } => Some((offset, at)),
        _ => None,
    }
}
