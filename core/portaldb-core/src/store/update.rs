//! `$set` update model.
//!
//! Each named field is replaced wholesale: nested objects and arrays are not
//! merged with the previous value.

use crate::error::{PortalDbError, PortalDbResult};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Update document. Only `$set` is supported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    set: Map<String, Value>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a single `$set` field.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and_set(field, value)
    }

    /// Add a `$set` field; later calls for the same field win.
    pub fn and_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// `$set` every field of an already-built map.
    pub fn from_map(set: Map<String, Value>) -> Self {
        Self { set }
    }

    /// `$set` every serialized field of a struct. Must serialize to an object.
    pub fn from_serializable<T: Serialize>(patch: &T) -> PortalDbResult<Self> {
        match serde_json::to_value(patch)? {
            Value::Object(set) => Ok(Self { set }),
            other => Err(PortalDbError::InvalidDocument(format!(
                "update patch must serialize to an object, got {other}"
            ))),
        }
    }

    /// Parse `{ "$set": { ... } }`. Other operators are ignored with a warning.
    pub fn from_json(value: &Value) -> PortalDbResult<Self> {
        let Value::Object(ops) = value else {
            return Err(PortalDbError::InvalidDocument(
                "update must be an object".to_string(),
            ));
        };

        let mut update = Self::new();
        for (op, body) in ops {
            match (op.as_str(), body) {
                ("$set", Value::Object(fields)) => {
                    update.set.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                ("$set", _) => {
                    return Err(PortalDbError::InvalidDocument(
                        "$set must be an object".to_string(),
                    ));
                }
                (other, _) => {
                    warn!(operator = other, "unsupported update operator ignored");
                }
            }
        }
        Ok(update)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.set
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Drop a field from the `$set` (used by the facade to protect identifiers).
    pub fn without(mut self, field: &str) -> Self {
        self.set.remove(field);
        self
    }

    /// Apply onto a shallow copy of `doc`. Non-object documents are returned unchanged.
    pub fn apply(&self, doc: &Value) -> Value {
        let mut updated = doc.clone();
        if let Value::Object(map) = &mut updated {
            for (field, value) in &self.set {
                map.insert(field.clone(), value.clone());
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_replaces_nested_objects() {
        let doc = json!({"id": "1", "profile": {"skills": ["a"], "bio": "old"}});
        let update = Update::set("profile", json!({"skills": ["b"]}));
        let updated = update.apply(&doc);
        assert_eq!(updated["profile"], json!({"skills": ["b"]}));
        assert_eq!(updated["id"], "1");
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let doc = json!({"status": "active"});
        let updated = Update::set("status", "expired").apply(&doc);
        assert_eq!(doc["status"], "active");
        assert_eq!(updated["status"], "expired");
    }

    #[test]
    fn set_adds_missing_fields() {
        let updated = Update::set("is_featured", true).apply(&json!({"id": "1"}));
        assert_eq!(updated, json!({"id": "1", "is_featured": true}));
    }

    #[test]
    fn parse_set_and_ignore_others() {
        let update = Update::from_json(&json!({
            "$set": {"status": "reviewed"},
            "$inc": {"views": 1}
        }))
        .unwrap();
        assert_eq!(update.fields().len(), 1);
        assert_eq!(update.fields()["status"], "reviewed");
    }

    #[test]
    fn parse_rejects_non_object_set() {
        assert!(Update::from_json(&json!({"$set": 5})).is_err());
        assert!(Update::from_json(&json!("status")).is_err());
    }

    #[test]
    fn from_serializable_skips_nothing_it_is_given() {
        #[derive(Serialize)]
        struct Patch {
            title: &'static str,
        }
        let update = Update::from_serializable(&Patch { title: "Rust dev" }).unwrap();
        assert_eq!(update.fields()["title"], "Rust dev");
        assert!(Update::from_serializable(&3).is_err());
    }

    #[test]
    fn without_removes_field() {
        let update = Update::set("id", "x").and_set("title", "t").without("id");
        assert!(!update.fields().contains_key("id"));
        assert!(!update.is_empty());
    }
}
