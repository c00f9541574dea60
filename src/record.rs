//! Schema-less record: an ordered field map.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PipelineError, Result};
use crate::value::Value;

/// One business entity (sale, account, product, ...) as a flat field map.
///
/// Field order is insertion order; export takes its columns from the first
/// record's key order. Lookups on a missing key return `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Field value, treating `Null` as absent.
    pub fn present(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !v.is_null())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert a JSON object into a record. Anything other than an object
    /// is rejected.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect()),
            other => Err(PipelineError::Backend(format!(
                "expected a JSON object for a record, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// Visits the map directly so document key order survives deserialization.
impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    record.set(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Parse a JSON array of objects into records, keeping document key order.
pub fn records_from_json_str(text: &str) -> Result<Vec<Record>> {
    Ok(serde_json::from_str(text)?)
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_none() {
        let r = Record::new().with("name", "ACME");
        assert!(r.get("total").is_none());
        assert!(r.present("total").is_none());
    }

    #[test]
    fn test_null_is_not_present() {
        let r = Record::new().with("notes", Value::Null);
        assert!(r.get("notes").is_some());
        assert!(r.present("notes").is_none());
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut r = Record::new().with("a", 1).with("b", 2);
        r.set("a", 10);
        let keys: Vec<&str> = r.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Number(10.0)));
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let records = records_from_json_str(r#"[{"zeta": 1, "alpha": "x", "mid": true}]"#).unwrap();
        let keys: Vec<&str> = records[0].keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Record::from_json(serde_json::json!([1])).is_err());
        assert!(Record::from_json(serde_json::json!({"id": "1"})).is_ok());
    }

    #[test]
    fn test_serialize_roundtrips_through_json_text() {
        let r = Record::new().with("id", "s-1").with("total", 99.5).with("paid", false);
        let text = serde_json::to_string(&r).unwrap();
        assert_eq!(text, r#"{"id":"s-1","total":99.5,"paid":false}"#);
    }
}
