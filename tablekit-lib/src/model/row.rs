//! Dynamic grid row

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use super::Value;

/// Stable identifier of a row, derived from its id field.
///
/// The id value is stringified so that integer and string ids can share one
/// key space in selection sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Creates a row id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque grid record.
///
/// Rows hold cell values as a `HashMap<String, Value>`. The grid never
/// interprets a row beyond the fields its columns reference and the
/// configured id field.
///
/// # Example
///
/// ```
/// use tablekit_lib::model::Row;
///
/// let row = Row::new()
///     .set("id", 1)
///     .set("name", "Ada")
///     .set("salary", 120_000i64);
///
/// assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("Ada"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder style).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a field value in place, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field value, treating a missing field as `Null`.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Returns `true` if the row contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns the row id read from `id_field`.
    ///
    /// Rows whose id is missing or null have no id and can't be selected.
    pub fn key(&self, id_field: &str) -> Option<RowId> {
        match self.fields.get(id_field)? {
            Value::Null => None,
            value => Some(RowId(value.to_display_string())),
        }
    }

    /// Parses a row from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stringifies_id() {
        let row = Row::new().set("id", 7);
        assert_eq!(row.key("id"), Some(RowId::from("7")));
        assert_eq!(Row::new().set("id", Value::Null).key("id"), None);
        assert_eq!(Row::new().key("id"), None);
    }

    #[test]
    fn test_from_json() {
        let row = Row::from_json(serde_json::json!({"id": 1, "name": "Ada"})).unwrap();
        assert_eq!(row.value("name"), &Value::from("Ada"));
        assert_eq!(row.value("missing"), &Value::Null);
    }
}
