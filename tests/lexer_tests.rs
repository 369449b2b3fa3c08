// tests/lexer_tests.rs

use std::time::Duration;

use promtree::ast::{AggregateOp, Token};
use promtree::lexer::{Lexer, Position};

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = vec![];
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            return out;
        }
        out.push(token);
    }
}

fn lex_error(input: &str) -> String {
    let mut lexer = Lexer::new(input);
    loop {
        match lexer.next_token() {
            Ok(Token::Eof) => panic!("expected lex error for {input:?}"),
            Ok(_) => {}
            Err(e) => return e.message,
        }
    }
}

// ============================================================================
// Operators and Punctuation
// ============================================================================

#[test]
fn test_operator_tokens() {
    let test_cases = vec![
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("^", Token::Caret),
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<", Token::Lt),
        ("<=", Token::LtEq),
        (">", Token::Gt),
        (">=", Token::GtEq),
        ("=", Token::Assign),
        ("=~", Token::RegexMatch),
        ("!~", Token::RegexNotMatch),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (",", Token::Comma),
        ("@", Token::At),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_bang_needs_follow_up() {
    assert!(lex_error("foo ! bar").contains("after '!'"));
    assert!(lex_error("!").contains("end of input"));
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_numbers() {
    let test_cases = vec![
        ("42", 42.0),
        ("3.14", 3.14),
        (".5", 0.5),
        ("1e3", 1000.0),
        ("2.5E-1", 0.25),
        ("0x1f", 31.0),
        ("0X10", 16.0),
        ("0755", 493.0),
        ("09", 9.0),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![Token::Number(expected)], "Failed for input: {}", input);
    }
}

#[test]
fn test_inf_and_nan_ignore_case() {
    assert_eq!(tokens("Inf"), vec![Token::Number(f64::INFINITY)]);
    assert_eq!(tokens("INF"), vec![Token::Number(f64::INFINITY)]);
    match tokens("nan").as_slice() {
        [Token::Number(n)] => assert!(n.is_nan()),
        other => panic!("expected NaN, got {:?}", other),
    }
}

#[test]
fn test_bad_numbers() {
    assert!(lex_error("1a").contains("bad number or duration syntax"));
    assert!(lex_error("1.5h").contains("bad number or duration syntax"));
    assert!(lex_error("0x").contains("bad number syntax"));
}

// ============================================================================
// Durations
// ============================================================================

#[test]
fn test_durations() {
    let test_cases = vec![
        ("5m", Duration::from_secs(300)),
        ("1h30m", Duration::from_secs(5400)),
        ("250ms", Duration::from_millis(250)),
        ("1d", Duration::from_secs(86_400)),
        ("1w", Duration::from_secs(604_800)),
        ("1y", Duration::from_secs(31_536_000)),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![Token::Duration(expected)], "Failed for input: {}", input);
    }
}

#[test]
fn test_bad_duration() {
    assert!(lex_error("5mh").contains("bad duration syntax"));
    assert!(lex_error("5min").contains("bad duration syntax"));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_quotes() {
    assert_eq!(tokens(r#""api""#), vec![Token::String("api".into())]);
    assert_eq!(tokens("'api'"), vec![Token::String("api".into())]);
    assert_eq!(tokens(r"`a\d+`"), vec![Token::String(r"a\d+".into())]);
}

#[test]
fn test_string_escapes() {
    assert_eq!(tokens(r#""a\nb""#), vec![Token::String("a\nb".into())]);
    assert_eq!(tokens(r#""q\"q""#), vec![Token::String("q\"q".into())]);
    assert_eq!(tokens(r"'it\'s'"), vec![Token::String("it's".into())]);
    assert_eq!(tokens(r#""\x41é\101""#), vec![Token::String("AéA".into())]);
    assert_eq!(tokens(r#""\\d""#), vec![Token::String("\\d".into())]);
}

#[test]
fn test_string_errors() {
    assert!(lex_error(r#""open"#).contains("unterminated quoted string"));
    assert!(lex_error("\"line\nbreak\"").contains("unterminated quoted string"));
    assert!(lex_error("`raw").contains("unterminated raw string"));
    assert!(lex_error(r#""\q""#).contains("unknown escape sequence"));
}

// ============================================================================
// Identifiers and Keywords
// ============================================================================

#[test]
fn test_identifiers() {
    assert_eq!(
        tokens("http_requests_total job:rate5m:sum _x"),
        vec![
            Token::Identifier("http_requests_total".into()),
            Token::Identifier("job:rate5m:sum".into()),
            Token::Identifier("_x".into()),
        ]
    );
}

#[test]
fn test_keywords() {
    assert_eq!(
        tokens("on ignoring group_left GROUP_RIGHT atan2 unless topk count_values"),
        vec![
            Token::On,
            Token::Ignoring,
            Token::GroupLeft,
            Token::GroupRight,
            Token::Atan2,
            Token::Unless,
            Token::Aggregator(AggregateOp::Topk),
            Token::Aggregator(AggregateOp::CountValues),
        ]
    );
}

#[test]
fn test_full_query() {
    assert_eq!(
        tokens(r#"rate(foo{job=~"a.*"}[5m:30s]) offset -1h"#),
        vec![
            Token::Identifier("rate".into()),
            Token::LParen,
            Token::Identifier("foo".into()),
            Token::LBrace,
            Token::Identifier("job".into()),
            Token::RegexMatch,
            Token::String("a.*".into()),
            Token::RBrace,
            Token::LBracket,
            Token::Duration(Duration::from_secs(300)),
            Token::Colon,
            Token::Duration(Duration::from_secs(30)),
            Token::RBracket,
            Token::RParen,
            Token::Offset,
            Token::Minus,
            Token::Duration(Duration::from_secs(3600)),
        ]
    );
}

// ============================================================================
// Whitespace, Comments and Errors
// ============================================================================

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        tokens("up # the target\n  == 1"),
        vec![Token::Identifier("up".into()), Token::EqEq, Token::Number(1.0)]
    );
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("up ; 1");
    lexer.next_token().unwrap();
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.message, "unexpected character: ';'");
    assert_eq!(err.position, Position { line: 1, column: 4 });
    assert_eq!(err.to_string(), "1:4: unexpected character: ';'");
}
