//! Search criteria.
//!
//! A [`Criterion`] is the caller-facing search input for a single field. Raw
//! values (scalars, arrays, tagged strings such as `prefix:jo` or `gte:5`)
//! are parsed once with [`Criterion::parse`] into a closed set of variants,
//! which the query builder then translates without re-inspecting strings.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{SearchError, SearchResult};

static PATTERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(regexp|wildcard|prefix):(.*)$").expect("static pattern regex")
});

static BOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(lt|gt|gte|lte):(.*)$").expect("static bound regex"));

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^range:(.*)$").expect("static range regex"));

/// Term-level pattern queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Regular expression match. Expensive on large indexes.
    Regexp,
    /// `*` matches many characters, `?` matches one.
    Wildcard,
    /// Terms starting with the value.
    Prefix,
}

impl PatternKind {
    /// Returns the query DSL name of this pattern.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Regexp => "regexp",
            PatternKind::Wildcard => "wildcard",
            PatternKind::Prefix => "prefix",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regexp" => Ok(PatternKind::Regexp),
            "wildcard" => Ok(PatternKind::Wildcard),
            "prefix" => Ok(PatternKind::Prefix),
            _ => Err(format!("unknown pattern kind: {}", s)),
        }
    }
}

/// Single-sided range operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundOp {
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Lte,
    /// Greater than or equal.
    Gte,
}

impl BoundOp {
    /// Returns the range key used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundOp::Lt => "lt",
            BoundOp::Gt => "gt",
            BoundOp::Lte => "lte",
            BoundOp::Gte => "gte",
        }
    }
}

impl fmt::Display for BoundOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lt" => Ok(BoundOp::Lt),
            "gt" => Ok(BoundOp::Gt),
            "lte" => Ok(BoundOp::Lte),
            "gte" => Ok(BoundOp::Gte),
            _ => Err(format!("unknown range operator: {}", s)),
        }
    }
}

/// A parsed search criterion for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Exact match on the value.
    Term(Value),
    /// Inclusive range between two bounds.
    Range {
        /// Lower bound.
        from: Value,
        /// Upper bound.
        to: Value,
    },
    /// Regexp, wildcard or prefix match.
    Pattern {
        /// Pattern flavour.
        kind: PatternKind,
        /// Pattern text.
        value: String,
    },
    /// Single-sided range such as `gte:5`. The value is kept as text.
    Bound {
        /// Range operator.
        op: BoundOp,
        /// Bound value.
        value: String,
    },
}

impl Criterion {
    /// Parses a raw criterion value.
    ///
    /// Rules are applied in order, first match wins:
    ///
    /// 1. a 2-element array is a range `[from, to]`
    /// 2. a 1-element array collapses to its element
    /// 3. `regexp:`, `wildcard:` and `prefix:` strings are pattern queries
    /// 4. `lt:`, `gt:`, `lte:` and `gte:` strings are single-sided ranges
    /// 5. `range:<json>` strings are ranges when the JSON is a 2-element
    ///    array; anything else becomes a range with the raw text as both bounds
    /// 6. everything else is an exact term
    ///
    /// An empty array is rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use entity_persistence::types::{BoundOp, Criterion};
    /// use serde_json::json;
    ///
    /// let criterion = Criterion::parse(&json!("gte:5")).unwrap();
    /// assert_eq!(
    ///     criterion,
    ///     Criterion::Bound { op: BoundOp::Gte, value: "5".to_string() }
    /// );
    ///
    /// assert!(Criterion::parse(&json!([])).is_err());
    /// ```
    pub fn parse(value: &Value) -> SearchResult<Self> {
        match value {
            Value::Array(items) => match items.as_slice() {
                [] => Err(SearchError::EmptyCriterion),
                [single] => Self::parse(single),
                [from, to] => Ok(Criterion::Range {
                    from: from.clone(),
                    to: to.clone(),
                }),
                _ => Ok(Criterion::Term(value.clone())),
            },
            Value::String(s) => Ok(Self::parse_str(s)),
            _ => Ok(Criterion::Term(value.clone())),
        }
    }

    fn parse_str(s: &str) -> Self {
        if let Some(caps) = PATTERN_RE.captures(s) {
            if let Ok(kind) = caps[1].parse::<PatternKind>() {
                return Criterion::Pattern {
                    kind,
                    value: caps[2].to_string(),
                };
            }
        }

        if let Some(caps) = BOUND_RE.captures(s) {
            if let Ok(op) = caps[1].parse::<BoundOp>() {
                return Criterion::Bound {
                    op,
                    value: caps[2].to_string(),
                };
            }
        }

        if let Some(caps) = RANGE_RE.captures(s) {
            let raw = &caps[1];
            return match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(bounds)) if bounds.len() == 2 => Criterion::Range {
                    from: bounds[0].clone(),
                    to: bounds[1].clone(),
                },
                // Unparseable or non-pair input collapses to a single-point range.
                _ => Criterion::Range {
                    from: Value::String(raw.to_string()),
                    to: Value::String(raw.to_string()),
                },
            };
        }

        Criterion::Term(Value::String(s.to_string()))
    }

    /// Creates an exact-match criterion.
    pub fn term(value: impl Into<Value>) -> Self {
        Criterion::Term(value.into())
    }

    /// Creates an inclusive range criterion.
    pub fn range(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Criterion::Range {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl From<&str> for Criterion {
    fn from(value: &str) -> Self {
        Criterion::parse_str(value)
    }
}

impl TryFrom<Value> for Criterion {
    type Error = SearchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Criterion::parse(&value)
    }
}
