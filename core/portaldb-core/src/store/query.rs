//! Filter model and matcher.
//!
//! Deliberately small: top-level equality clauses joined by AND, plus `$or`
//! over nested filters. No comparison operators, no dot paths. Any key other
//! than `$or` in a JSON filter is a plain equality test on that field name.

use crate::error::{PortalDbError, PortalDbResult};
use serde_json::{Map, Value};

/// A single top-level condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `document[field] === value`
    Eq(String, Value),
    /// Matches if any sub-filter matches
    Or(Vec<Filter>),
}

/// Conjunction of clauses. No clauses matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Single equality clause.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            clauses: vec![Clause::Eq(field.into(), value.into())],
        }
    }

    /// Single `$or` clause.
    pub fn or(filters: Vec<Filter>) -> Self {
        Self {
            clauses: vec![Clause::Or(filters)],
        }
    }

    /// `{ $or: [{ id }, { _id }] }`, resolving either identifier style.
    pub fn by_id(id: &str) -> Self {
        Self::or(vec![Self::eq("id", id), Self::eq("_id", id)])
    }

    /// Add an equality clause.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(field.into(), value.into()));
        self
    }

    /// Add an `$or` clause.
    pub fn and_or(mut self, filters: Vec<Filter>) -> Self {
        self.clauses.push(Clause::Or(filters));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Parse a Mongo-style filter object.
    ///
    /// `null` is treated as the empty filter. `$or` must be an array of
    /// objects; anything else under `$or`, or a non-object filter, is
    /// rejected.
    pub fn from_json(value: &Value) -> PortalDbResult<Self> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Object(map) => Self::from_map(map),
            other => Err(PortalDbError::InvalidFilter(format!(
                "filter must be an object, got {other}"
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> PortalDbResult<Self> {
        let mut clauses = Vec::with_capacity(map.len());
        for (key, value) in map {
            if key == "$or" {
                let Value::Array(branches) = value else {
                    return Err(PortalDbError::InvalidFilter(
                        "$or must be an array of filters".to_string(),
                    ));
                };
                let branches = branches
                    .iter()
                    .map(|b| match b {
                        Value::Object(m) => Self::from_map(m),
                        other => Err(PortalDbError::InvalidFilter(format!(
                            "$or branch must be an object, got {other}"
                        ))),
                    })
                    .collect::<PortalDbResult<Vec<_>>>()?;
                clauses.push(Clause::Or(branches));
            } else {
                clauses.push(Clause::Eq(key.clone(), value.clone()));
            }
        }
        Ok(Self { clauses })
    }

    /// Render back to a Mongo-style JSON object (for logging).
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for clause in &self.clauses {
            match clause {
                Clause::Eq(field, value) => {
                    map.insert(field.clone(), value.clone());
                }
                Clause::Or(branches) => {
                    map.insert(
                        "$or".to_string(),
                        Value::Array(branches.iter().map(Filter::to_json).collect()),
                    );
                }
            }
        }
        Value::Object(map)
    }

    /// Whether `doc` satisfies every clause.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, expected) => doc
                .get(field)
                .is_some_and(|actual| strict_eq(actual, expected)),
            Clause::Or(branches) => branches.iter().any(|b| b.matches(doc)),
        })
    }
}

/// Equality without coercion. Numbers compare by value so `1` and `1.0` are
/// equal; every other kind compares structurally and only within its kind.
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

impl From<Clause> for Filter {
    fn from(clause: Clause) -> Self {
        Self {
            clauses: vec![clause],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&json!({"a": 1})));
        assert!(Filter::all().matches(&json!({})));
        assert!(Filter::from_json(&json!({})).unwrap().matches(&json!({"x": true})));
    }

    #[test]
    fn equality_is_strict() {
        let doc = json!({"age": 30, "name": "Sita", "active": true});
        assert!(Filter::eq("age", 30).matches(&doc));
        assert!(!Filter::eq("age", "30").matches(&doc));
        assert!(!Filter::eq("active", 1).matches(&doc));
        assert!(Filter::eq("age", 30.0).matches(&doc));
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = json!({"name": "x"});
        assert!(!Filter::eq("email", Value::Null).matches(&doc));
        assert!(Filter::eq("email", Value::Null).matches(&json!({"email": null})));
    }

    #[test]
    fn top_level_clauses_are_anded() {
        let f = Filter::eq("status", "active").and_eq("company_id", "c1");
        assert!(f.matches(&json!({"status": "active", "company_id": "c1"})));
        assert!(!f.matches(&json!({"status": "active", "company_id": "c2"})));
    }

    #[test]
    fn or_matches_any_branch() {
        let f = Filter::or(vec![Filter::eq("status", "active"), Filter::eq("is_featured", true)]);
        assert!(f.matches(&json!({"status": "active", "is_featured": false})));
        assert!(f.matches(&json!({"status": "expired", "is_featured": true})));
        assert!(!f.matches(&json!({"status": "expired", "is_featured": false})));
    }

    #[test]
    fn empty_or_matches_nothing() {
        assert!(!Filter::or(vec![]).matches(&json!({"a": 1})));
    }

    #[test]
    fn dotted_keys_are_literal_field_names() {
        let f = Filter::eq("profile.skills", "rust");
        assert!(!f.matches(&json!({"profile": {"skills": "rust"}})));
        assert!(f.matches(&json!({"profile.skills": "rust"})));
    }

    #[test]
    fn operator_looking_values_are_plain_equality() {
        let f = Filter::from_json(&json!({"salary_min": {"$gt": 10}})).unwrap();
        assert!(!f.matches(&json!({"salary_min": 50})));
        assert!(f.matches(&json!({"salary_min": {"$gt": 10}})));
    }

    #[test]
    fn by_id_resolves_both_forms() {
        let f = Filter::by_id("abc");
        assert!(f.matches(&json!({"id": "abc"})));
        assert!(f.matches(&json!({"_id": "abc"})));
        assert!(!f.matches(&json!({"id": "other"})));
    }

    #[test]
    fn parse_nested_or() {
        let f = Filter::from_json(&json!({
            "role": "employer",
            "$or": [{"email": "a@x.com"}, {"$or": [{"id": "1"}, {"_id": "1"}]}]
        }))
        .unwrap();
        assert!(f.matches(&json!({"role": "employer", "_id": "1"})));
        assert!(!f.matches(&json!({"role": "admin", "_id": "1"})));
    }

    #[test]
    fn parse_rejects_bad_or() {
        assert!(Filter::from_json(&json!({"$or": {"id": "1"}})).is_err());
        assert!(Filter::from_json(&json!({"$or": ["id"]})).is_err());
        assert!(Filter::from_json(&json!([1, 2])).is_err());
        assert!(Filter::from_json(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn to_json_round_trips_shape() {
        let f = Filter::eq("status", "active").and_or(vec![Filter::eq("id", "1")]);
        assert_eq!(
            f.to_json(),
            json!({"status": "active", "$or": [{"id": "1"}]})
        );
    }
}
