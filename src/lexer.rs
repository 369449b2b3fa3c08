use std::fmt;

use thiserror::Error;

use crate::ast::{Token, parse_duration};

/// 1-based line and column of a character in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{position}: {message}")]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

/// A token together with the source text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Inside `[...]` a colon separates range and step instead of being part
    /// of a metric name.
    bracket_depth: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            bracket_depth: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: impl Into<String>, position: Position) -> LexError {
        LexError {
            message: message.into(),
            position,
        }
    }

    /// Skips whitespace and `#` line comments.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while self.current_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let allow_colon = self.bracket_depth == 0;
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' || (allow_colon && ch == ':') {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // Consume opening quote

        loop {
            match self.current_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    let escape_pos = self.here();
                    self.advance();
                    result.push(self.read_escape(quote, escape_pos)?);
                }
                Some('\n') | None => return Err(self.error("unterminated quoted string", start)),
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_raw_string(&mut self, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // Consume opening backtick

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '`' {
                return Ok(result);
            }
            result.push(ch);
        }
        Err(self.error("unterminated raw string", start))
    }

    /// Reads the escape sequence following a backslash.
    fn read_escape(&mut self, quote: char, position: Position) -> Result<char, LexError> {
        let Some(ch) = self.current_char() else {
            return Err(self.error("unterminated quoted string", position));
        };
        self.advance();

        let simple = match ch {
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\x0b'),
            '\\' => Some('\\'),
            c if c == quote => Some(c),
            _ => None,
        };
        if let Some(c) = simple {
            return Ok(c);
        }

        let (digits, radix) = match ch {
            'x' => (2, 16),
            'u' => (4, 16),
            'U' => (8, 16),
            '0'..='7' => (2, 8),
            _ => return Err(self.error(format!("unknown escape sequence: \\{ch}"), position)),
        };

        let mut code = String::new();
        if radix == 8 {
            code.push(ch);
        }
        for _ in 0..digits {
            match self.current_char() {
                Some(c) if c.is_digit(radix) => {
                    code.push(c);
                    self.advance();
                }
                _ => return Err(self.error(format!("invalid escape sequence: \\{ch}{code}"), position)),
            }
        }

        u32::from_str_radix(&code, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid escape sequence: \\{ch}{code}"), position))
    }

    fn read_digits(&mut self, text: &mut String, radix: u32) {
        while let Some(ch) = self.current_char() {
            if ch.is_digit(radix) {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self, start: Position) -> Result<Token, LexError> {
        let mut text = String::new();

        if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            self.read_digits(&mut text, 16);
            let value = u64::from_str_radix(&text, 16)
                .map_err(|_| self.error(format!("bad number syntax: \"0x{text}\""), start))?;
            self.reject_trailing_word(&format!("0x{text}"), start)?;
            return Ok(Token::Number(value as f64));
        }

        self.read_digits(&mut text, 10);

        // A unit right after the integer part makes this a duration.
        if !text.is_empty() && matches!(self.current_char(), Some('y' | 'w' | 'd' | 'h' | 'm' | 's')) {
            while let Some(ch) = self.current_char() {
                if ch.is_ascii_alphanumeric() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            return parse_duration(&text)
                .map(Token::Duration)
                .map_err(|_| self.error(format!("bad duration syntax: {text:?}"), start));
        }

        if self.current_char() == Some('.') {
            text.push('.');
            self.advance();
            self.read_digits(&mut text, 10);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let has_exponent = match self.peek_char(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                text.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    text.push(sign);
                    self.advance();
                }
                self.read_digits(&mut text, 10);
            }
        }

        self.reject_trailing_word(&text, start)?;

        let is_octal = text.len() > 1 && text.starts_with('0') && text.chars().all(|c| ('0'..='7').contains(&c));
        let value = if is_octal {
            u64::from_str_radix(&text, 8).map(|v| v as f64).ok()
        } else {
            text.parse::<f64>().ok()
        };
        value
            .map(Token::Number)
            .ok_or_else(|| self.error(format!("bad number syntax: {text:?}"), start))
    }

    /// Numbers may not run into letters, as in `1a` or `1.5h`.
    fn reject_trailing_word(&mut self, text: &str, start: Position) -> Result<(), LexError> {
        if !self.current_char().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return Ok(());
        }
        let mut text = text.to_string();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Err(self.error(format!("bad number or duration syntax: {text:?}"), start))
    }

    fn scan_token(&mut self, start: Position) -> Result<Token, LexError> {
        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        let single = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            ',' => Some(Token::Comma),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '@' => Some(Token::At),
            '[' => {
                self.bracket_depth += 1;
                Some(Token::LBracket)
            }
            ']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                Some(Token::RBracket)
            }
            ':' if self.bracket_depth > 0 => Some(Token::Colon),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        let token = match ch {
            '=' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        Token::EqEq
                    }
                    Some('~') => {
                        self.advance();
                        Token::RegexMatch
                    }
                    _ => Token::Assign,
                }
            }
            '!' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        Token::NotEq
                    }
                    Some('~') => {
                        self.advance();
                        Token::RegexNotMatch
                    }
                    Some(c) => {
                        return Err(self.error(format!("unexpected character after '!': {c:?}"), start));
                    }
                    None => return Err(self.error("unexpected end of input after '!'", start)),
                }
            }
            '<' | '>' => {
                self.advance();
                let or_equal = self.current_char() == Some('=');
                if or_equal {
                    self.advance();
                }
                match (ch, or_equal) {
                    ('<', true) => Token::LtEq,
                    ('<', false) => Token::Lt,
                    (_, true) => Token::GtEq,
                    (_, false) => Token::Gt,
                }
            }
            '"' | '\'' => Token::String(self.read_string(ch, start)?),
            '`' => Token::String(self.read_raw_string(start)?),
            '.' if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number(start)?,
            c if c.is_ascii_digit() => self.read_number(start)?,
            c if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                let word = self.read_identifier();
                let lower = word.to_ascii_lowercase();
                match lower.as_str() {
                    "inf" => Token::Number(f64::INFINITY),
                    "nan" => Token::Number(f64::NAN),
                    _ => Token::keyword(&lower).unwrap_or(Token::Identifier(word)),
                }
            }
            c => return Err(self.error(format!("unexpected character: {c:?}"), start)),
        };
        Ok(token)
    }

    /// Reads the next token along with its source text and position.
    pub fn next_lexeme(&mut self) -> Result<Lexeme, LexError> {
        self.skip_whitespace();

        let start_index = self.position;
        let position = self.here();
        let token = self.scan_token(position)?;
        let text = self.input[start_index..self.position].iter().collect();

        Ok(Lexeme {
            token,
            text,
            position,
        })
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.next_lexeme().map(|lexeme| lexeme.token)
    }
}

#[test]
fn test_keywords_ignore_case() {
    let mut lexer = Lexer::new("and OR Unless by WITHOUT bool offset SUM");
    assert_eq!(lexer.next_token(), Ok(Token::And));
    assert_eq!(lexer.next_token(), Ok(Token::Or));
    assert_eq!(lexer.next_token(), Ok(Token::Unless));
    assert_eq!(lexer.next_token(), Ok(Token::By));
    assert_eq!(lexer.next_token(), Ok(Token::Without));
    assert_eq!(lexer.next_token(), Ok(Token::Bool));
    assert_eq!(lexer.next_token(), Ok(Token::Offset));
    assert_eq!(
        lexer.next_token(),
        Ok(Token::Aggregator(crate::ast::AggregateOp::Sum))
    );
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_colon_inside_brackets() {
    let mut lexer = Lexer::new("job:rate5m[5m:1m]");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("job:rate5m".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LBracket));
    assert!(matches!(lexer.next_token(), Ok(Token::Duration(_))));
    assert_eq!(lexer.next_token(), Ok(Token::Colon));
    assert!(matches!(lexer.next_token(), Ok(Token::Duration(_))));
    assert_eq!(lexer.next_token(), Ok(Token::RBracket));
}

#[test]
fn test_lexeme_positions() {
    let mut lexer = Lexer::new("rate(\n  foo)");
    let rate = lexer.next_lexeme().unwrap();
    assert_eq!((rate.text.as_str(), rate.position), ("rate", Position { line: 1, column: 1 }));
    lexer.next_lexeme().unwrap();
    let foo = lexer.next_lexeme().unwrap();
    assert_eq!((foo.text.as_str(), foo.position), ("foo", Position { line: 2, column: 3 }));
}
