//! Mirror table schema inference

use async_sqlite::rusqlite::types::Value as SqlValue;
use async_sqlite::rusqlite::types::ValueRef;
use serde::Serialize;

use crate::model::ColumnDef;
use crate::model::Row;
use crate::model::Value;

/// Storage class of a mirrored column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    /// Returns the SQL type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infers the SQL type of a sample value.
///
/// Integral floats map to `INTEGER`; booleans are stored as 0/1.
pub fn infer_type(value: &Value) -> SqlType {
    match value {
        Value::Int(_) | Value::Bool(_) => SqlType::Integer,
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => SqlType::Integer,
        Value::Float(_) => SqlType::Real,
        Value::Null | Value::String(_) | Value::DateTime(_) => SqlType::Text,
    }
}

/// A grid column as it appears in the mirror table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorColumn {
    /// SQL column name (the row field).
    pub name: String,
    /// Grid column id.
    pub col_id: String,
    pub sql_type: SqlType,
}

/// A column reported by [`MirrorSynchronizer::get_schema`](super::MirrorSynchronizer::get_schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub name: String,
    pub sql_type: String,
}

/// Derives the mirror columns from the grid columns and rows.
///
/// Only visible columns with a field are mirrored, once per field. Each type
/// comes from the first row holding a non-null value for the field, `TEXT`
/// when there is none.
pub fn mirror_columns(columns: &[ColumnDef], rows: &[Row]) -> Vec<MirrorColumn> {
    let mut mirrored: Vec<MirrorColumn> = Vec::new();
    for column in columns.iter().filter(|c| c.is_mirrored()) {
        let Some(field) = column.field_name() else {
            continue;
        };
        if mirrored.iter().any(|m| m.name == field) {
            continue;
        }
        let sample = rows
            .iter()
            .map(|r| r.value(field))
            .find(|v| !v.is_null())
            .unwrap_or(&Value::Null);
        mirrored.push(MirrorColumn {
            name: field.to_string(),
            col_id: column.id.clone(),
            sql_type: infer_type(sample),
        });
    }
    mirrored
}

/// Quotes an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn create_table_sql(table: &str, columns: &[MirrorColumn]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

pub(crate) fn insert_sql(table: &str, columns: &[MirrorColumn], rows: usize) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        names.join(", "),
        vec![tuple; rows].join(", ")
    )
}

/// Converts a cell into a bindable SQLite value.
pub(crate) fn to_sql(value: &Value, sql_type: SqlType) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) if sql_type == SqlType::Integer && f.fract() == 0.0 => {
            SqlValue::Integer(*f as i64)
        }
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::DateTime(dt) => SqlValue::Text(dt.to_rfc3339()),
    }
}

/// Converts a result cell back into a grid value.
pub(crate) fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(s) | ValueRef::Blob(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(&Value::Int(1)), SqlType::Integer);
        assert_eq!(infer_type(&Value::Float(2.0)), SqlType::Integer);
        assert_eq!(infer_type(&Value::Float(2.5)), SqlType::Real);
        assert_eq!(infer_type(&Value::Bool(true)), SqlType::Integer);
        assert_eq!(infer_type(&Value::from("x")), SqlType::Text);
        assert_eq!(infer_type(&Value::Null), SqlType::Text);
    }

    #[test]
    fn test_mirror_columns_skip_hidden_and_display_only() {
        let columns = vec![
            ColumnDef::field("id"),
            ColumnDef::field("ssn").with_hidden(true),
            ColumnDef::new("actions"),
            ColumnDef::field("score"),
        ];
        let rows = vec![
            Row::new().set("id", 1),
            Row::new().set("id", 2).set("score", 1.5),
        ];
        let mirrored = mirror_columns(&columns, &rows);
        let names: Vec<&str> = mirrored.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "score"]);
        assert_eq!(mirrored[1].sql_type, SqlType::Real);
    }

    #[test]
    fn test_type_comes_from_first_present_value() {
        let columns = vec![ColumnDef::field("qty"), ColumnDef::field("note")];
        let rows = vec![
            Row::new().set("qty", 3).set("note", Value::Null),
            Row::new().set("qty", "many").set("note", 2.5),
        ];
        let mirrored = mirror_columns(&columns, &rows);
        assert_eq!(mirrored[0].sql_type, SqlType::Integer);
        assert_eq!(mirrored[1].sql_type, SqlType::Real);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_insert_sql() {
        let columns = vec![MirrorColumn {
            name: "a".into(),
            col_id: "a".into(),
            sql_type: SqlType::Text,
        }];
        assert_eq!(
            insert_sql("t", &columns, 2),
            "INSERT INTO \"t\" (\"a\") VALUES (?), (?)"
        );
    }
}
