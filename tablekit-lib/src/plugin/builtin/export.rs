//! Export payloads built from the current view

use serde::Deserialize;
use serde::Serialize;

use crate::error::GridError;
use crate::error::PluginError;
use crate::model::ColumnDef;
use crate::model::Value;
use crate::pipeline::GridView;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::GridState;

use super::EXPORT;

/// Options for [`ExportPlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ExportOptions {
    /// Suggested file name, without extension.
    pub file_name: String,
    /// Columns to export, in order. Defaults to the visible data columns.
    pub column_keys: Option<Vec<String>>,
    /// Export only selected rows.
    pub only_selected: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: "export".to_string(),
            column_keys: None,
            only_selected: false,
        }
    }
}

/// A column in an export payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportColumn {
    pub key: String,
    pub header: String,
}

/// Tabular data ready for encoding by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub file_name: String,
    pub columns: Vec<ExportColumn>,
    /// One entry per row, values in `columns` order.
    pub rows: Vec<Vec<Value>>,
}

impl ExportPayload {
    /// Renders the payload as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds [`ExportPayload`]s over every filtered row in view order.
///
/// Export ignores pagination: all rows that pass the filters are included,
/// not just the current page.
#[derive(Debug, Default)]
pub struct ExportPlugin {
    options: ExportOptions,
}

impl ExportPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Builds the payload for the committed state and view.
    pub fn export(&self, state: &GridState, view: &GridView) -> Result<ExportPayload, GridError> {
        let columns = self.columns(state)?;

        let rows = view
            .ordered_indices
            .iter()
            .map(|&i| &state.rows[i])
            .filter(|row| {
                !self.options.only_selected
                    || row
                        .key(&state.row_id_field)
                        .is_some_and(|id| state.selection.is_selected(&id))
            })
            .map(|row| {
                columns
                    .iter()
                    .map(|c| c.field_name().map(|f| row.value(f).clone()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(ExportPayload {
            file_name: self.options.file_name.clone(),
            columns: columns
                .iter()
                .map(|c| ExportColumn {
                    key: c.id.clone(),
                    header: c.header_label().to_string(),
                })
                .collect(),
            rows,
        })
    }

    fn columns<'a>(&self, state: &'a GridState) -> Result<Vec<&'a ColumnDef>, GridError> {
        match &self.options.column_keys {
            Some(keys) => keys
                .iter()
                .map(|key| state.column(key).ok_or_else(|| GridError::unknown_column(key)))
                .collect(),
            None => Ok(state.visible_columns().filter(|c| c.field.is_some()).collect()),
        }
    }
}

impl Plugin for ExportPlugin {
    fn name(&self) -> &str {
        EXPORT
    }

    fn init(
        &mut self,
        _cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        let options: ExportOptions = parse_options(EXPORT, options)?;
        if options.file_name.trim().is_empty() {
            return Err(PluginError::config(EXPORT, "fileName must not be empty"));
        }
        self.options = options;
        Ok(())
    }

    impl_plugin_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::model::Row;
    use crate::model::RowId;
    use crate::state::SortModel;
    use crate::state::StatePatch;
    use crate::state::StateStore;

    fn store() -> StateStore {
        let mut store = StateStore::new(&GridConfig::default().with_page_size(2));
        store
            .apply_all([
                StatePatch::SetColumns(vec![
                    ColumnDef::field("id"),
                    ColumnDef::field("name").with_header("Name"),
                    ColumnDef::field("secret").with_hidden(true),
                    ColumnDef::new("actions"),
                ]),
                StatePatch::SetRows(vec![
                    Row::new().set("id", 1).set("name", "b").set("secret", "x"),
                    Row::new().set("id", 2).set("name", "c"),
                    Row::new().set("id", 3).set("name", "a"),
                ]),
                StatePatch::SetSortModel(SortModel::asc("name")),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_exports_all_pages_in_view_order() {
        let store = store();
        let payload = ExportPlugin::default()
            .export(store.state(), store.view())
            .unwrap();

        let keys: Vec<&str> = payload.columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert_eq!(payload.columns[1].header, "Name");
        assert_eq!(payload.rows.len(), 3);
        assert_eq!(payload.rows[0], vec![Value::Int(3), Value::from("a")]);
    }

    #[test]
    fn test_only_selected_with_explicit_columns() {
        let mut store = store();
        store
            .apply(StatePatch::SetSelection {
                ids: vec![RowId::from(1)],
                anchor: None,
            })
            .unwrap();
        let plugin = ExportPlugin {
            options: ExportOptions {
                column_keys: Some(vec!["secret".into(), "id".into()]),
                only_selected: true,
                ..Default::default()
            },
        };
        let payload = plugin.export(store.state(), store.view()).unwrap();
        assert_eq!(payload.rows, vec![vec![Value::from("x"), Value::Int(1)]]);
        assert!(payload.to_json().unwrap().contains("\"fileName\": \"export\""));
    }

    #[test]
    fn test_unknown_column_key() {
        let store = store();
        let plugin = ExportPlugin {
            options: ExportOptions {
                column_keys: Some(vec!["nope".into()]),
                ..Default::default()
            },
        };
        assert_eq!(
            plugin.export(store.state(), store.view()).unwrap_err(),
            GridError::unknown_column("nope")
        );
    }
}
