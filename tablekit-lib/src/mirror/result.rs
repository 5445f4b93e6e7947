//! Query results

use serde::Serialize;

use crate::model::Value;

/// Outcome of a mirror query.
///
/// Failures are reported in `error` rather than as an `Err`, so a bad query
/// is plain data for the caller to render.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Result column names.
    pub columns: Vec<String>,
    /// Result rows, values in `columns` order.
    pub values: Vec<Vec<Value>>,
    pub row_count: usize,
    /// Wall time spent in the engine, in milliseconds.
    pub execution_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// Creates a successful result.
    pub fn success(columns: Vec<String>, values: Vec<Vec<Value>>, execution_time_ms: f64) -> Self {
        Self {
            columns,
            row_count: values.len(),
            values,
            execution_time_ms,
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failed(error: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            execution_time_ms,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Returns `true` if the query succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
