// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layered key-value metadata ("extended parameters").
//!
//! Metadata is merged shallowly: when two layers contribute the same key the
//! upper layer's value replaces the lower one wholesale, nested objects
//! included.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Index;

/// Errors produced when converting loosely-typed input into [`Metadata`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The value was not a JSON object (or `null`).
    #[error("metadata must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type name of the rejected value.
        found: &'static str,
    },
}

/// Ordered string-keyed bag of JSON values.
///
/// Ordering is deterministic (`BTreeMap`), so two merges of the same layers
/// always compare equal and display identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.0.insert(key.into(), v);
        }
        self
    }

    /// Insert a raw JSON value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Apply `upper` on top of `self`, last writer wins per key.
    pub fn merge(&mut self, upper: &Metadata) {
        for (k, v) in &upper.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Non-mutating form of [`Metadata::merge`].
    #[must_use]
    pub fn merged(&self, upper: &Metadata) -> Metadata {
        let mut out = self.clone();
        out.merge(upper);
        out
    }

    /// Fold layers from lowest to highest precedence.
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Metadata>) -> Metadata {
        let mut out = Metadata::new();
        for layer in layers {
            out.merge(layer);
        }
        out
    }

    /// Convert an arbitrary JSON value, coercing anything that is not an
    /// object to empty metadata.
    ///
    /// `null` is treated as "absent" and coerced silently; other non-object
    /// values are logged at `warn` on the `errtree.metadata` target.
    pub fn from_value(value: Value) -> Metadata {
        match Self::try_from_value(value) {
            Ok(m) => m,
            Err(MetadataError::NotAnObject { found }) => {
                tracing::warn!(
                    target: "errtree.metadata",
                    found,
                    "non-object metadata coerced to empty"
                );
                Metadata::new()
            }
        }
    }

    /// Strict form of [`Metadata::from_value`].
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotAnObject`] for booleans, numbers, strings
    /// and arrays. `null` converts to empty metadata.
    pub fn try_from_value(value: Value) -> Result<Metadata, MetadataError> {
        match value {
            Value::Object(map) => Ok(Metadata(map.into_iter().collect())),
            Value::Null => Ok(Metadata::new()),
            other => Err(MetadataError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<BTreeMap<String, Value>> for Metadata {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Index<&str> for Metadata {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        &self.0[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_inserts_serialisable_values() {
        let m = Metadata::new().with("a", 1).with("b", "two").with("c", [3, 4]);
        assert_eq!(m.len(), 3);
        assert_eq!(m["a"], json!(1));
        assert_eq!(m["b"], json!("two"));
        assert_eq!(m["c"], json!([3, 4]));
    }

    #[test]
    fn merge_is_last_writer_wins() {
        let lower = Metadata::new().with("shared", "low").with("only_low", true);
        let upper = Metadata::new().with("shared", "high").with("only_high", 1);
        let merged = lower.merged(&upper);
        assert_eq!(merged["shared"], json!("high"));
        assert_eq!(merged["only_low"], json!(true));
        assert_eq!(merged["only_high"], json!(1));
        // lower untouched
        assert_eq!(lower["shared"], json!("low"));
    }

    #[test]
    fn merge_is_shallow() {
        let lower = Metadata::new().with("nested", json!({"a": 1, "b": 2}));
        let upper = Metadata::new().with("nested", json!({"c": 3}));
        assert_eq!(lower.merged(&upper)["nested"], json!({"c": 3}));
    }

    #[test]
    fn layered_respects_order() {
        let a = Metadata::new().with("k", "a");
        let b = Metadata::new().with("k", "b");
        let c = Metadata::new().with("k", "c");
        assert_eq!(Metadata::layered([&a, &b, &c])["k"], json!("c"));
        assert_eq!(Metadata::layered([&c, &b, &a])["k"], json!("a"));
        assert!(Metadata::layered([]).is_empty());
    }

    #[test]
    fn from_value_accepts_objects() {
        let m = Metadata::from_value(json!({"x": 1, "y": [1, 2]}));
        assert_eq!(m.len(), 2);
        assert_eq!(m["y"], json!([1, 2]));
    }

    #[test]
    fn from_value_coerces_non_objects_to_empty() {
        for v in [json!(null), json!(1), json!("s"), json!([1]), json!(false)] {
            assert!(Metadata::from_value(v).is_empty());
        }
    }

    #[test]
    fn try_from_value_rejects_non_objects() {
        let err = Metadata::try_from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err, MetadataError::NotAnObject { found: "array" });
        assert_eq!(err.to_string(), "metadata must be a JSON object, got array");
        assert!(Metadata::try_from_value(json!(null)).unwrap().is_empty());
    }

    #[test]
    fn serialises_as_plain_object() {
        let m = Metadata::new().with("b", 2).with("a", 1);
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"a":1,"b":2}"#);
        let back: Metadata = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn from_iterator_collects_pairs() {
        let m: Metadata = [("k", json!(1)), ("j", json!(2))].into_iter().collect();
        assert_eq!(m.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), ["j", "k"]);
    }
}
