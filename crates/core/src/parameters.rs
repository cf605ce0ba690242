//! Ordered name → value maps: parameter groups, entity attributes, images.
//!
//! Source order is kept because top-level parameter groups print in the
//! order the host supplied them. (De)serializes as a plain map; a `null`
//! entry becomes [`Value::Null`].

use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// An ordered collection of `(name, value)` pairs.
#[derive(Debug, Clone, Default)]
pub struct ParameterCollection {
    entries: Vec<(String, Value)>,
    /// Key → position in `entries`.
    index: HashMap<String, usize>,
}

impl PartialEq for ParameterCollection {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries ordered by key.
    pub fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }

    /// Length in chars of the longest key, or `None` when empty.
    pub fn longest_key(&self) -> Option<usize> {
        self.entries.iter().map(|(k, _)| k.chars().count()).max()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (k, v) in iter {
            collection.insert(k, v);
        }
        collection
    }
}

impl Serialize for ParameterCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CollectionVisitor;

        impl<'de> Visitor<'de> for CollectionVisitor {
            type Value = ParameterCollection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut collection = ParameterCollection::new();
                while let Some((key, value)) = access.next_entry::<String, Option<Value>>()? {
                    collection.insert(key, value.unwrap_or(Value::Null));
                }
                Ok(collection)
            }
        }

        deserializer.deserialize_map(CollectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_source_order() {
        let params = ParameterCollection::new()
            .with("Target", "a")
            .with("Assignee", "b")
            .with("Mode", 1);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Target", "Assignee", "Mode"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut params = ParameterCollection::new().with("a", 1).with("b", 2);
        params.insert("a", 3);
        assert_eq!(params.len(), 2);
        assert_eq!(params.iter().next(), Some(("a", &Value::Int(3))));
    }

    #[test]
    fn wide_collection_lookup_and_replace() {
        let mut params: ParameterCollection =
            (0..2_000).map(|i| (format!("attr{i:04}"), i)).collect();
        params.insert("attr1500", -1);

        assert_eq!(params.len(), 2_000);
        assert_eq!(params.get("attr1500"), Some(&Value::Int(-1)));
        assert_eq!(params.get("attr1999"), Some(&Value::Int(1999)));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.iter().nth(1500).map(|(k, _)| k), Some("attr1500"));
    }

    #[test]
    fn deserialize_duplicate_key_keeps_first_position() {
        let json = r#"{ "a": {"int": 1}, "b": {"int": 2}, "a": {"int": 3} }"#;
        let params: ParameterCollection = serde_json::from_str(json).unwrap();
        let entries: Vec<_> = params.iter().collect();
        assert_eq!(entries, vec![("a", &Value::Int(3)), ("b", &Value::Int(2))]);
    }

    #[test]
    fn sorted_orders_by_key() {
        let params = ParameterCollection::new().with("revenue", 1).with("name", "x");
        let keys: Vec<_> = params.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "revenue"]);
    }

    #[test]
    fn longest_key_counts_chars() {
        let params = ParameterCollection::new().with("ab", 1).with("überlang", 2);
        assert_eq!(params.longest_key(), Some(8));
        assert_eq!(ParameterCollection::new().longest_key(), None);
    }

    #[test]
    fn deserialize_preserves_order_and_nulls() {
        let json = r#"{ "zeta": {"string": "z"}, "alpha": null }"#;
        let params: ParameterCollection = serde_json::from_str(json).unwrap();
        let entries: Vec<_> = params.iter().collect();
        assert_eq!(entries[0], ("zeta", &Value::String("z".into())));
        assert_eq!(entries[1], ("alpha", &Value::Null));
    }
}
