// tests/parser_tests.rs

use std::time::Duration;

use promtree::ast::{
    AggregateOp, AtModifier, BinOp, Cardinality, Expr, Grouping, MatchOp, Matcher, Offset, UnaryOp,
    VectorSelector,
};
use promtree::parser::{ParseError, ParserOptions, PromQl, QueryParser, parse};
use promtree::{Lexer, Parser, Position};

fn parse_err(query: &str) -> ParseError {
    match parse(query) {
        Ok(expr) => panic!("expected parse error for {query:?}, got {expr:?}"),
        Err(e) => e,
    }
}

fn selector(expr: &Expr) -> &VectorSelector {
    match expr {
        Expr::VectorSelector(vs) => vs,
        other => panic!("expected vector selector, got {other:?}"),
    }
}

// ============================================================================
// Simple tests
// ============================================================================

#[test]
fn test_number_literal() {
    assert_eq!(parse("42").unwrap(), Expr::NumberLiteral(42.0));
}

#[test]
fn test_negative_number_folds() {
    assert_eq!(parse("-1").unwrap(), Expr::NumberLiteral(-1.0));
    assert_eq!(parse("+2.5").unwrap(), Expr::NumberLiteral(2.5));
}

#[test]
fn test_unary_on_selector() {
    assert_eq!(
        parse("-up").unwrap(),
        Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(VectorSelector::new("up").into()),
        }
    );
}

#[test]
fn test_string_literal() {
    assert_eq!(parse(r#""hello""#).unwrap(), Expr::StringLiteral("hello".into()));
}

#[test]
fn test_parser_struct_directly() {
    let mut parser = Parser::new(Lexer::new("up")).unwrap();
    assert_eq!(parser.parse().unwrap(), VectorSelector::new("up").into());
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_arithmetic() {
    // Should be: Add(1, Mul(2, 3))
    match parse("1 + 2 * 3").unwrap() {
        Expr::Binary { op: BinOp::Add, lhs, rhs, .. } => {
            assert_eq!(*lhs, Expr::NumberLiteral(1.0));
            assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("Expected addition, got {other:?}"),
    }
}

#[test]
fn test_parentheses_kept() {
    match parse("(1 + 2) * 3").unwrap() {
        Expr::Binary { op: BinOp::Mul, lhs, .. } => {
            assert!(matches!(*lhs, Expr::Paren(_)));
        }
        other => panic!("Expected multiplication, got {other:?}"),
    }
}

#[test]
fn test_power_is_right_associative() {
    // 2 ^ (3 ^ 2)
    match parse("2 ^ 3 ^ 2").unwrap() {
        Expr::Binary { op: BinOp::Pow, lhs, rhs, .. } => {
            assert_eq!(*lhs, Expr::NumberLiteral(2.0));
            assert!(matches!(*rhs, Expr::Binary { op: BinOp::Pow, .. }));
        }
        other => panic!("Expected power, got {other:?}"),
    }
}

#[test]
fn test_unary_binds_looser_than_power() {
    match parse("-a ^ 2").unwrap() {
        Expr::Unary { op: UnaryOp::Neg, expr } => {
            assert!(matches!(*expr, Expr::Binary { op: BinOp::Pow, .. }));
        }
        other => panic!("Expected unary, got {other:?}"),
    }
    assert!(matches!(
        parse("-a * b").unwrap(),
        Expr::Binary { op: BinOp::Mul, .. }
    ));
}

#[test]
fn test_set_operator_precedence() {
    // a or (b and c)
    match parse("a or b and c").unwrap() {
        Expr::Binary { op: BinOp::Or, rhs, matching, .. } => {
            assert!(matches!(*rhs, Expr::Binary { op: BinOp::And, .. }));
            assert_eq!(matching.unwrap().card, Cardinality::ManyToMany);
        }
        other => panic!("Expected or, got {other:?}"),
    }
}

#[test]
fn test_comparison_below_arithmetic() {
    assert!(matches!(
        parse("a + 1 > b - 1").unwrap(),
        Expr::Binary { op: BinOp::Gtr, .. }
    ));
}

#[test]
fn test_atan2_is_multiplicative() {
    assert!(matches!(
        parse("a + b atan2 c").unwrap(),
        Expr::Binary { op: BinOp::Add, .. }
    ));
}

// ============================================================================
// Binary modifiers
// ============================================================================

#[test]
fn test_bool_modifier() {
    match parse("up == bool 1").unwrap() {
        Expr::Binary { op: BinOp::Eql, return_bool, .. } => assert!(return_bool),
        other => panic!("Expected comparison, got {other:?}"),
    }
    assert_eq!(
        parse_err("a + bool b").message,
        "bool modifier can only be used on comparison operators"
    );
}

#[test]
fn test_vector_matching() {
    match parse("a / on(x, y) group_left(z) b").unwrap() {
        Expr::Binary { matching: Some(m), .. } => {
            assert!(m.on);
            assert_eq!(m.labels, vec!["x", "y"]);
            assert_eq!(m.card, Cardinality::ManyToOne);
            assert_eq!(m.include, vec!["z"]);
        }
        other => panic!("Expected matching, got {other:?}"),
    }

    match parse("a - ignoring(instance) group_right b").unwrap() {
        Expr::Binary { matching: Some(m), .. } => {
            assert!(!m.on);
            assert_eq!(m.card, Cardinality::OneToMany);
            assert!(m.include.is_empty());
        }
        other => panic!("Expected matching, got {other:?}"),
    }
}

#[test]
fn test_grouping_on_set_operator() {
    assert_eq!(
        parse_err("a and on(x) group_left b").message,
        r#"no grouping allowed for "and" operation"#
    );
}

#[test]
fn test_label_in_on_and_group() {
    assert!(
        parse_err("a * on(x) group_left(x) b")
            .message
            .contains("must not occur in ON and GROUP clause at once")
    );
}

// ============================================================================
// Selectors
// ============================================================================

#[test]
fn test_selector_with_matchers() {
    let expr = parse(r#"http_requests_total{job="api", code=~"5..", env!="dev", path!~"/x"}"#).unwrap();
    let vs = selector(&expr);
    assert_eq!(vs.name.as_deref(), Some("http_requests_total"));
    assert_eq!(
        vs.matchers,
        vec![
            Matcher::new("job", MatchOp::Equal, "api"),
            Matcher::new("code", MatchOp::Re, "5.."),
            Matcher::new("env", MatchOp::NotEqual, "dev"),
            Matcher::new("path", MatchOp::NotRe, "/x"),
        ]
    );
}

#[test]
fn test_keyword_as_label_name() {
    let expr = parse(r#"foo{on="a", by="b",}"#).unwrap();
    let names: Vec<_> = selector(&expr).matchers.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["on", "by"]);
}

#[test]
fn test_quoted_metric_name() {
    let expr = parse(r#"{"http.requests", job="api"}"#).unwrap();
    let vs = selector(&expr);
    assert_eq!(vs.name.as_deref(), Some("http.requests"));
    assert_eq!(vs.matchers.len(), 1);
}

#[test]
fn test_metric_name_twice() {
    assert!(
        parse_err(r#"foo{"bar"}"#)
            .message
            .starts_with("metric name must not be set twice")
    );
}

#[test]
fn test_empty_matchers_rejected() {
    let msg = "vector selector must contain at least one non-empty matcher";
    assert_eq!(parse_err("{}").message, msg);
    assert_eq!(parse_err(r#"{job=""}"#).message, msg);
    assert_eq!(parse_err(r#"{job=~".*"}"#).message, msg);
    assert!(parse(r#"{job=~".+"}"#).is_ok());
}

#[test]
fn test_invalid_regex() {
    assert!(
        parse_err(r#"foo{job=~"a("}"#)
            .message
            .starts_with("invalid regular expression")
    );
}

#[test]
fn test_matcher_needs_string() {
    assert_eq!(
        parse_err("foo{job=5}").message,
        "unexpected number 5 in label matching, expected string"
    );
}

// ============================================================================
// Ranges, subqueries and modifiers
// ============================================================================

#[test]
fn test_matrix_selector() {
    match parse("foo[5m]").unwrap() {
        Expr::MatrixSelector { selector, range } => {
            assert_eq!(range, Duration::from_secs(300));
            assert_eq!(*selector, VectorSelector::new("foo").into());
        }
        other => panic!("Expected matrix selector, got {other:?}"),
    }
}

#[test]
fn test_modifiers_after_range_go_to_selector() {
    match parse("foo[5m] offset 1h @ end()").unwrap() {
        Expr::MatrixSelector { selector: inner, .. } => {
            let vs = selector(&inner);
            assert_eq!(vs.offset, Some(Offset::Pos(Duration::from_secs(3600))));
            assert_eq!(vs.at, Some(AtModifier::End));
        }
        other => panic!("Expected matrix selector, got {other:?}"),
    }
}

#[test]
fn test_subquery() {
    match parse("rate(foo[1m])[30m:1m] offset -5m @ 100.5").unwrap() {
        Expr::Subquery { expr, range, step, offset, at } => {
            assert!(matches!(*expr, Expr::Call { .. }));
            assert_eq!(range, Duration::from_secs(1800));
            assert_eq!(step, Some(Duration::from_secs(60)));
            assert_eq!(offset, Some(Offset::Neg(Duration::from_secs(300))));
            assert_eq!(at, Some(AtModifier::At(100_500)));
        }
        other => panic!("Expected subquery, got {other:?}"),
    }
    assert!(matches!(
        parse("foo[1h:]").unwrap(),
        Expr::Subquery { step: None, .. }
    ));
}

#[test]
fn test_at_modifier_values() {
    let expr = parse("foo @ -1.5").unwrap();
    assert_eq!(selector(&expr).at, Some(AtModifier::At(-1500)));
    let expr = parse("foo @ start()").unwrap();
    assert_eq!(selector(&expr).at, Some(AtModifier::Start));
    assert!(parse_err("foo @ Inf").message.starts_with("timestamp out of bounds"));
}

#[test]
fn test_plain_seconds_out_of_range() {
    assert_eq!(
        parse_err("foo[100000000000000000]").message,
        "duration out of range in range"
    );
    assert_eq!(
        parse_err("foo offset 100000000000000000").message,
        "duration out of range in offset"
    );
    match parse("foo[300]").unwrap() {
        Expr::MatrixSelector { range, .. } => assert_eq!(range, Duration::from_secs(300)),
        other => panic!("Expected matrix selector, got {other:?}"),
    }
}

#[test]
fn test_range_errors() {
    assert_eq!(
        parse_err("(foo)[5m]").message,
        "ranges only allowed for vector selectors"
    );
    assert_eq!(
        parse_err("foo offset 5m [5m]").message,
        "no offset modifiers allowed before range"
    );
}

#[test]
fn test_modifier_errors() {
    assert_eq!(
        parse_err("foo offset 1m offset 2m").message,
        "offset may not be set multiple times"
    );
    assert_eq!(
        parse_err("foo @ 1 @ 2").message,
        "@ <timestamp> may not be set multiple times"
    );
    assert!(
        parse_err("sum(foo) offset 5m")
            .message
            .starts_with("offset modifier must be preceded by")
    );
    assert!(
        parse_err("1 @ 5")
            .message
            .starts_with("@ modifier must be preceded by")
    );
}

// ============================================================================
// Aggregations
// ============================================================================

#[test]
fn test_aggregation_grouping_positions() {
    let before = parse("sum by (job) (rate(foo[5m]))").unwrap();
    let after = parse("sum(rate(foo[5m])) by (job)").unwrap();
    assert_eq!(before, after);
    match before {
        Expr::Aggregate { op, grouping, param, .. } => {
            assert_eq!(op, AggregateOp::Sum);
            assert_eq!(grouping, Some(Grouping::By(vec!["job".into()])));
            assert!(param.is_none());
        }
        other => panic!("Expected aggregation, got {other:?}"),
    }
}

#[test]
fn test_aggregation_with_param() {
    match parse("TOPK(5, foo) without (instance)").unwrap() {
        Expr::Aggregate { op, param, expr, grouping } => {
            assert_eq!(op, AggregateOp::Topk);
            assert_eq!(param.as_deref(), Some(&Expr::NumberLiteral(5.0)));
            assert_eq!(*expr, VectorSelector::new("foo").into());
            assert_eq!(grouping, Some(Grouping::Without(vec!["instance".into()])));
        }
        other => panic!("Expected aggregation, got {other:?}"),
    }
}

#[test]
fn test_keywords_as_metric_names() {
    let expr = parse(r#"sum{job="x"}"#).unwrap();
    let vs = selector(&expr);
    assert_eq!(vs.name.as_deref(), Some("sum"));
    assert_eq!(vs.matchers, vec![Matcher::new("job", MatchOp::Equal, "x")]);

    assert_eq!(parse("min").unwrap(), VectorSelector::new("min").into());
    assert_eq!(parse("offset").unwrap(), VectorSelector::new("offset").into());
    assert_eq!(parse("limitk").unwrap(), VectorSelector::new("limitk").into());
    match parse("count + 1").unwrap() {
        Expr::Binary { op: BinOp::Add, lhs, .. } => {
            assert_eq!(*lhs, VectorSelector::new("count").into());
        }
        other => panic!("Expected addition, got {other:?}"),
    }
    assert!(matches!(parse("sum by (job) (x)").unwrap(), Expr::Aggregate { .. }));
}

#[test]
fn test_aggregation_argument_errors() {
    assert_eq!(
        parse_err("sum()").message,
        "no arguments for aggregate expression provided"
    );
    assert_eq!(
        parse_err("topk(foo)").message,
        "wrong number of arguments for aggregate expression provided, expected 2, got 1"
    );
    assert_eq!(
        parse_err("sum(a, b)").message,
        "wrong number of arguments for aggregate expression provided, expected 1, got 2"
    );
}

// ============================================================================
// Function calls
// ============================================================================

#[test]
fn test_function_call() {
    match parse("histogram_quantile(0.9, rate(foo_bucket[5m]),)").unwrap() {
        Expr::Call { func, args } => {
            assert_eq!(func, "histogram_quantile");
            assert_eq!(args.len(), 2);
        }
        other => panic!("Expected call, got {other:?}"),
    }
    assert!(matches!(parse("time()").unwrap(), Expr::Call { ref args, .. } if args.is_empty()));
}

#[test]
fn test_function_errors() {
    assert_eq!(
        parse_err("nope(foo)").message,
        r#"unknown function with name "nope""#
    );
    assert_eq!(
        parse_err("rate(a, b)").message,
        r#"expected 1 argument(s) in call to "rate", got 2"#
    );
    assert_eq!(
        parse_err("label_join(a, b)").message,
        r#"expected at least 3 argument(s) in call to "label_join", got 2"#
    );
}

#[test]
fn test_experimental_gate() {
    assert_eq!(
        parse_err("mad_over_time(foo[5m])").message,
        r#"function "mad_over_time" is not enabled"#
    );
    assert_eq!(
        parse_err("limitk(2, foo)").message,
        r#"aggregation "limitk" is not enabled"#
    );

    let parser = PromQl::new(ParserOptions {
        experimental_functions: true,
    });
    assert!(parser.parse("mad_over_time(foo[5m])").is_ok());
    assert!(parser.parse("limit_ratio(0.5, foo)").is_ok());
}

// ============================================================================
// Error reporting
// ============================================================================

#[test]
fn test_empty_input() {
    let err = parse_err("   ");
    assert_eq!(err.message, "no expression found in input");
}

#[test]
fn test_error_position_and_display() {
    let err = parse_err("sum(foo");
    assert_eq!(err.position, Position { line: 1, column: 8 });
    assert_eq!(
        err.to_string(),
        r#"1:8: parse error: unexpected end of input in aggregation, expected ",""#
    );
}

#[test]
fn test_trailing_tokens() {
    assert_eq!(parse_err("foo bar").message, r#"unexpected identifier "bar""#);
    assert_eq!(parse_err("1 +").message, "unexpected end of input");
}

#[test]
fn test_lex_errors_surface_as_parse_errors() {
    let err = parse_err("foo{job=\"unterminated}");
    assert_eq!(err.message, "unterminated quoted string");
    assert_eq!(err.position, Position { line: 1, column: 9 });
}
