use std::time::Duration;

/// Label matching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `=~`
    Re,
    /// `!~`
    NotRe,
}

impl MatchOp {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchOp::Equal => "=",
            MatchOp::NotEqual => "!=",
            MatchOp::Re => "=~",
            MatchOp::NotRe => "!~",
        }
    }

    pub fn is_regex(self) -> bool {
        matches!(self, MatchOp::Re | MatchOp::NotRe)
    }
}

/// A single label matcher such as `job="api"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    pub name: String,
    pub op: MatchOp,
    pub value: String,
}

impl Matcher {
    pub fn new(name: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        Matcher {
            name: name.into(),
            op,
            value: value.into(),
        }
    }

    /// Whether a series without this label would still be selected.
    ///
    /// Regex matchers are anchored on both ends. A pattern that does not
    /// compile is treated as not matching.
    pub fn matches_empty(&self) -> bool {
        match self.op {
            MatchOp::Equal => self.value.is_empty(),
            MatchOp::NotEqual => !self.value.is_empty(),
            MatchOp::Re => anchored_regex(&self.value).is_ok_and(|re| re.is_match("")),
            MatchOp::NotRe => anchored_regex(&self.value).is_ok_and(|re| !re.is_match("")),
        }
    }
}

/// Compiles a label matcher pattern the way it is evaluated: fully anchored.
pub fn anchored_regex(pattern: &str) -> Result<regex::Regex, regex::Error> {
    regex::Regex::new(&format!("^(?:{pattern})$"))
}

/// Signed time shift applied with `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Pos(Duration),
    Neg(Duration),
}

impl Offset {
    pub fn is_zero(&self) -> bool {
        match self {
            Offset::Pos(d) | Offset::Neg(d) => d.is_zero(),
        }
    }
}

/// Evaluation time pinned with `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtModifier {
    /// `@ start()`
    Start,
    /// `@ end()`
    End,
    /// `@ <unix seconds>`, stored in milliseconds
    At(i64),
}

/// Instant vector selector.
///
/// The metric name is kept apart from the label matchers, so
/// `http_requests_total{job="api"}` holds one matcher.
///
/// # Examples
/// ```text
/// up
/// http_requests_total{job="api", code=~"5.."}
/// {__name__="up"} offset 5m
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VectorSelector {
    pub name: Option<String>,
    pub matchers: Vec<Matcher>,
    pub offset: Option<Offset>,
    pub at: Option<AtModifier>,
}

impl VectorSelector {
    pub fn new(name: impl Into<String>) -> Self {
        VectorSelector {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn has_modifiers(&self) -> bool {
        self.offset.is_some() || self.at.is_some()
    }
}
