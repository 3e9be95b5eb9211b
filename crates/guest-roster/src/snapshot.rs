//! Full snapshots of one event's guest collection.
//!
//! A snapshot is what the store delivers on every change: the entire current
//! state of the collection, never a diff.
//!
//! # Design Principles
//!
//! - Snapshots are immutable after creation
//! - Iteration follows key order, which is creation order for generated keys
//! - Keys compare as plain strings, so numeric-looking keys sort as `"10"`
//!   before `"9"`; generated keys all have the same length and are unaffected
//! - Missing or malformed data degrades to fewer records, never to an error

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{GuestKey, GuestRecord};

/// An immutable, cheaply clonable snapshot of one guest collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestSnapshot {
    records: Arc<BTreeMap<GuestKey, GuestRecord>>,
}

impl GuestSnapshot {
    /// Creates a snapshot with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a snapshot from an existing map of records.
    pub fn new(records: BTreeMap<GuestKey, GuestRecord>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Decodes a snapshot from the raw JSON value of a collection.
    ///
    /// `null` is an empty collection. A value that is not an object is
    /// treated the same way. Entries that do not decode as a guest record are
    /// skipped.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let object = match value {
            serde_json::Value::Null => return Self::empty(),
            serde_json::Value::Object(object) => object,
            other => {
                tracing::warn!(kind = json_kind(other), "guest collection is not an object, treating as empty");
                return Self::empty();
            }
        };

        let mut records = BTreeMap::new();
        for (key, raw) in object {
            match serde_json::from_value::<GuestRecord>(raw.clone()) {
                Ok(record) => {
                    records.insert(GuestKey::from_string(key.clone()), record);
                }
                Err(err) => {
                    tracing::warn!(guest = %key, error = %err, "skipping malformed guest record");
                }
            }
        }

        Self::new(records)
    }

    /// Encodes the snapshot as a JSON object keyed by guest key.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut object = serde_json::Map::new();
        for (key, record) in self.records.iter() {
            object.insert(key.to_string(), serde_json::to_value(record)?);
        }
        Ok(serde_json::Value::Object(object))
    }

    /// Looks up a record by key.
    pub fn get(&self, key: &GuestKey) -> Option<&GuestRecord> {
        self.records.get(key)
    }

    /// Iterates records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&GuestKey, &GuestRecord)> + '_ {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(GuestKey, GuestRecord)> for GuestSnapshot {
    fn from_iter<I: IntoIterator<Item = (GuestKey, GuestRecord)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_empty() {
        assert!(GuestSnapshot::from_json(&json!(null)).is_empty());
    }

    #[test]
    fn non_object_is_empty() {
        assert!(GuestSnapshot::from_json(&json!([1, 2, 3])).is_empty());
        assert!(GuestSnapshot::from_json(&json!("guests")).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let snapshot = GuestSnapshot::from_json(&json!({
            "a": { "name": "Alice", "parent": "" },
            "b": "not a record",
            "c": { "name": "Carl", "parent": "a" },
        }));

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(&GuestKey::from("b")).is_none());
    }

    #[test]
    fn iteration_follows_key_order() {
        let snapshot = GuestSnapshot::from_json(&json!({
            "c": { "name": "Carl" },
            "a": { "name": "Alice" },
            "b": { "name": "Bob" },
        }));

        let names: Vec<_> = snapshot.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carl"]);
    }

    #[test]
    fn numeric_keys_sort_as_text() {
        let snapshot = GuestSnapshot::from_json(&json!({
            "9": { "name": "Nove" },
            "10": { "name": "Dez" },
        }));

        let keys: Vec<_> = snapshot.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["10", "9"]);
    }

    #[test]
    fn to_json_keeps_every_record() {
        let snapshot: GuestSnapshot = [
            (GuestKey::from("a"), GuestRecord::new("Alice")),
            (GuestKey::from("b"), GuestRecord::new("Bob").with_parent("a")),
        ]
        .into_iter()
        .collect();

        let value = snapshot.to_json().unwrap();
        assert_eq!(value["a"]["name"], json!("Alice"));
        assert_eq!(value["b"]["parent"], json!("a"));
        assert_eq!(GuestSnapshot::from_json(&value), snapshot);
    }
}
