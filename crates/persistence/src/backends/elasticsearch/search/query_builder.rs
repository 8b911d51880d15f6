//! Elasticsearch Query DSL builder.
//!
//! Translates a single-field [`Criterion`] into one query fragment:
//!
//! | Criterion | Fragment |
//! |-----------|----------|
//! | `Term(v)` | `{"term": {field: v}}` |
//! | `Range { from, to }` | `{"range": {field: {"from": from, "to": to}}}` |
//! | `Pattern { kind, value }` | `{kind: {field: value}}` |
//! | `Bound { op, value }` | `{"range": {field: {op: value}}}` |

use serde_json::{Map, Value, json};

use crate::error::SearchResult;
use crate::types::{BoundOp, Criterion, PatternKind};

/// Fields always requested alongside search hits.
pub const SEARCH_FIELDS: [&str; 3] = ["_source", "_parent", "_timestamp"];

/// A single-field query fragment.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum QueryFragment {
    /// Exact match.
    Term { field: String, value: Value },
    /// Range with arbitrary bound keys (`from`/`to` or `lt`/`gte`/...).
    Range {
        field: String,
        bounds: Map<String, Value>,
    },
    /// Regexp, wildcard or prefix match.
    Pattern {
        kind: PatternKind,
        field: String,
        value: String,
    },
}

impl QueryFragment {
    /// Returns the DSL query name of the fragment.
    pub fn name(&self) -> &'static str {
        match self {
            QueryFragment::Term { .. } => "term",
            QueryFragment::Range { .. } => "range",
            QueryFragment::Pattern { kind, .. } => kind.as_str(),
        }
    }

    /// Returns the field the fragment applies to.
    pub fn field(&self) -> &str {
        match self {
            QueryFragment::Term { field, .. }
            | QueryFragment::Range { field, .. }
            | QueryFragment::Pattern { field, .. } => field,
        }
    }

    /// Renders the fragment as Query DSL JSON.
    pub fn to_value(&self) -> Value {
        let inner = match self {
            QueryFragment::Term { value, .. } => value.clone(),
            QueryFragment::Range { bounds, .. } => Value::Object(bounds.clone()),
            QueryFragment::Pattern { value, .. } => Value::String(value.clone()),
        };

        let mut by_field = Map::new();
        by_field.insert(self.field().to_string(), inner);

        let mut query = Map::new();
        query.insert(self.name().to_string(), Value::Object(by_field));
        Value::Object(query)
    }
}

impl From<QueryFragment> for Value {
    fn from(fragment: QueryFragment) -> Self {
        fragment.to_value()
    }
}

/// Builds the query fragment for `criterion` on `field`.
pub fn build(field: &str, criterion: &Criterion) -> QueryFragment {
    let field = field.to_string();
    match criterion {
        Criterion::Term(value) => QueryFragment::Term {
            field,
            value: value.clone(),
        },
        Criterion::Range { from, to } => {
            let mut bounds = Map::new();
            bounds.insert("from".to_string(), from.clone());
            bounds.insert("to".to_string(), to.clone());
            QueryFragment::Range { field, bounds }
        }
        Criterion::Pattern { kind, value } => QueryFragment::Pattern {
            kind: *kind,
            field,
            value: value.clone(),
        },
        Criterion::Bound { op, value } => QueryFragment::Range {
            field,
            bounds: single_bound(*op, value),
        },
    }
}

/// Parses a raw criterion value and builds its query fragment.
///
/// Fails only on an empty collection.
pub fn build_query(field: &str, value: &Value) -> SearchResult<QueryFragment> {
    let criterion = Criterion::parse(value)?;
    Ok(build(field, &criterion))
}

fn single_bound(op: BoundOp, value: &str) -> Map<String, Value> {
    let mut bounds = Map::new();
    bounds.insert(op.as_str().to_string(), Value::String(value.to_string()));
    bounds
}

/// Wraps a fragment into a `_count` request body.
pub fn count_body(fragment: &QueryFragment) -> Value {
    json!({ "query": fragment.to_value() })
}

/// Wraps a fragment into a `_search` request body.
pub fn search_body(fragment: &QueryFragment) -> Value {
    json!({
        "query": fragment.to_value(),
        "fields": SEARCH_FIELDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(field: &str, value: Value) -> Value {
        build_query(field, &value).unwrap().to_value()
    }

    #[test]
    fn test_pair_builds_range() {
        assert_eq!(
            query("age", json!([1, 5])),
            json!({"range": {"age": {"from": 1, "to": 5}}})
        );
    }

    #[test]
    fn test_singleton_builds_term() {
        assert_eq!(query("age", json!([5])), json!({"term": {"age": 5}}));
    }

    #[test]
    fn test_pattern_queries() {
        assert_eq!(
            query("name", json!("prefix:jo")),
            json!({"prefix": {"name": "jo"}})
        );
        assert_eq!(
            query("name", json!("wildcard:j*n")),
            json!({"wildcard": {"name": "j*n"}})
        );
        assert_eq!(
            query("name", json!("regexp:jo.+")),
            json!({"regexp": {"name": "jo.+"}})
        );
    }

    #[test]
    fn test_bound_keeps_string_value() {
        assert_eq!(
            query("age", json!("gte:5")),
            json!({"range": {"age": {"gte": "5"}}})
        );
        assert_eq!(
            query("date", json!("lt:2015-01-01")),
            json!({"range": {"date": {"lt": "2015-01-01"}}})
        );
    }

    #[test]
    fn test_range_strings() {
        assert_eq!(
            query("age", json!("range:[1,5]")),
            json!({"range": {"age": {"from": 1, "to": 5}}})
        );
        assert_eq!(
            query("age", json!("range:notjson")),
            json!({"range": {"age": {"from": "notjson", "to": "notjson"}}})
        );
    }

    #[test]
    fn test_plain_values_build_terms() {
        assert_eq!(query("name", json!("")), json!({"term": {"name": ""}}));
        assert_eq!(query("age", json!(42)), json!({"term": {"age": 42}}));
        assert_eq!(
            query("tags", json!(["a", "b", "c"])),
            json!({"term": {"tags": ["a", "b", "c"]}})
        );
    }

    #[test]
    fn test_empty_collection_fails() {
        assert!(build_query("age", &json!([])).is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let criterion = Criterion::from("prefix:jo");
        assert_eq!(build("name", &criterion), build("name", &criterion));
        assert_eq!(build("name", &criterion).name(), "prefix");
    }

    #[test]
    fn test_request_bodies() {
        let fragment = build("name", &Criterion::term("john"));
        assert_eq!(
            count_body(&fragment),
            json!({"query": {"term": {"name": "john"}}})
        );
        assert_eq!(
            search_body(&fragment),
            json!({
                "query": {"term": {"name": "john"}},
                "fields": ["_source", "_parent", "_timestamp"]
            })
        );
    }
}
