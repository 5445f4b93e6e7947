//! Filter model types

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::model::Value;

/// A per-column filter condition.
///
/// The JSON shape is tagged by `type`, matching what grid front-ends send:
///
/// ```
/// use tablekit_lib::state::FilterSpec;
///
/// let spec: FilterSpec =
///     serde_json::from_str(r#"{"type":"greaterThan","filter":100000}"#).unwrap();
/// assert_eq!(spec, FilterSpec::greater_than(100_000i64));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterSpec {
    /// Case-insensitive substring match on the stringified cell.
    Contains { filter: String },
    /// Equality after coercion to the column's filter kind.
    Equals { filter: Value },
    /// Strictly greater than (numbers or dates).
    GreaterThan { filter: Value },
    /// Strictly less than (numbers or dates).
    LessThan { filter: Value },
    /// Inclusive range (numbers or dates).
    Between { from: Value, to: Value },
    /// Exact boolean match.
    Boolean { filter: bool },
    /// Exact match against any of the accepted values.
    Select { values: Vec<Value> },
}

impl FilterSpec {
    /// Creates a contains filter.
    pub fn contains(text: impl Into<String>) -> Self {
        FilterSpec::Contains {
            filter: text.into(),
        }
    }

    /// Creates an equals filter.
    pub fn equals(value: impl Into<Value>) -> Self {
        FilterSpec::Equals {
            filter: value.into(),
        }
    }

    /// Creates a greater-than filter.
    pub fn greater_than(value: impl Into<Value>) -> Self {
        FilterSpec::GreaterThan {
            filter: value.into(),
        }
    }

    /// Creates a less-than filter.
    pub fn less_than(value: impl Into<Value>) -> Self {
        FilterSpec::LessThan {
            filter: value.into(),
        }
    }

    /// Creates an inclusive range filter.
    pub fn between(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        FilterSpec::Between {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a boolean filter.
    pub fn boolean(value: bool) -> Self {
        FilterSpec::Boolean { filter: value }
    }

    /// Creates a select filter accepting any of `values`.
    pub fn select<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        FilterSpec::Select {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Active column filters keyed by column id.
///
/// A row passes when every entry matches. Columns without an entry are
/// unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterModel {
    filters: BTreeMap<String, FilterSpec>,
}

impl FilterModel {
    /// Creates an empty filter model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter for a column (builder style).
    pub fn with(mut self, col_id: impl Into<String>, spec: FilterSpec) -> Self {
        self.filters.insert(col_id.into(), spec);
        self
    }

    /// Sets or clears the filter for a column.
    pub fn set(&mut self, col_id: impl Into<String>, spec: Option<FilterSpec>) {
        let col_id = col_id.into();
        match spec {
            Some(spec) => {
                self.filters.insert(col_id, spec);
            }
            None => {
                self.filters.remove(&col_id);
            }
        }
    }

    /// Returns the filter for a column.
    pub fn get(&self, col_id: &str) -> Option<&FilterSpec> {
        self.filters.get(col_id)
    }

    /// Iterates over `(column id, filter)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterSpec)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of active filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filter is active.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
