//! Row selection commands

use serde::Deserialize;

use crate::error::GridError;
use crate::error::PluginError;
use crate::model::RowId;
use crate::pipeline::GridView;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::GridState;
use crate::state::SelectionMode;
use crate::state::SelectionState;
use crate::state::StatePatch;

use super::SELECTION;

/// Options for [`SelectionPlugin`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SelectionOptions {
    /// Single or multiple selection.
    pub mode: SelectionMode,
    /// Plain clicks toggle rows instead of replacing the selection.
    pub checkbox_selection: bool,
}

/// Modifier keys held during a row click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickModifiers {
    /// Toggle the clicked row.
    pub ctrl: bool,
    /// Extend from the anchor to the clicked row.
    pub shift: bool,
}

impl ClickModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    /// Ctrl (or Cmd) held.
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };

    /// Shift held.
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
    };
}

/// Turns row clicks into selection patches.
///
/// Range extension walks the current view order (after sorting and
/// filtering), not the raw row order.
#[derive(Debug, Default)]
pub struct SelectionPlugin {
    options: SelectionOptions,
}

impl SelectionPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Builds the selection patch for a click on `row_id`.
    pub fn click(
        &self,
        state: &GridState,
        view: &GridView,
        row_id: &RowId,
        modifiers: ClickModifiers,
    ) -> Result<StatePatch, GridError> {
        if state.index_of(row_id).is_none() {
            return Err(GridError::UnknownRow {
                id: row_id.to_string(),
            });
        }

        let mut selection = state.selection.clone();
        if modifiers.shift {
            let order = state.row_ids(&view.ordered_indices);
            selection.extend_to(row_id.clone(), &order);
        } else if modifiers.ctrl || self.options.checkbox_selection {
            selection.toggle(row_id.clone());
        } else {
            selection.select_only(row_id.clone());
        }
        Ok(into_patch(&selection))
    }

    /// Builds a patch selecting every row that passed filtering.
    ///
    /// In single mode this collapses to one row.
    pub fn select_all(&self, state: &GridState, view: &GridView) -> StatePatch {
        let ids = state.row_ids(&view.ordered_indices);
        let anchor = ids.first().cloned();
        StatePatch::SetSelection { ids, anchor }
    }

    /// Builds a patch that clears the selection.
    pub fn clear(&self) -> StatePatch {
        StatePatch::SetSelection {
            ids: Vec::new(),
            anchor: None,
        }
    }
}

fn into_patch(selection: &SelectionState) -> StatePatch {
    StatePatch::SetSelection {
        ids: selection.selected().cloned().collect(),
        anchor: selection.anchor().cloned(),
    }
}

impl Plugin for SelectionPlugin {
    fn name(&self) -> &str {
        SELECTION
    }

    fn init(
        &mut self,
        cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        self.options = parse_options(SELECTION, options)?;
        if cx.state().selection.mode() != self.options.mode {
            cx.request(StatePatch::SetSelectionMode(self.options.mode));
        }
        Ok(())
    }

    impl_plugin_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::model::ColumnDef;
    use crate::model::Row;
    use crate::state::SortModel;
    use crate::state::StateStore;

    fn store() -> StateStore {
        let mut store = StateStore::new(&GridConfig::default());
        store
            .apply_all([
                StatePatch::SetColumns(vec![ColumnDef::field("id"), ColumnDef::field("rank")]),
                StatePatch::SetRows(
                    (1..=5)
                        .map(|i| Row::new().set("id", i).set("rank", 10 - i))
                        .collect(),
                ),
            ])
            .unwrap();
        store
    }

    fn click(plugin: &SelectionPlugin, store: &mut StateStore, id: i64, modifiers: ClickModifiers) {
        let patch = plugin
            .click(store.state(), store.view(), &RowId::from(id), modifiers)
            .unwrap();
        store.apply(patch).unwrap();
    }

    fn selected(store: &StateStore) -> Vec<String> {
        store
            .state()
            .selection
            .selected()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn test_shift_extends_in_view_order() {
        let plugin = SelectionPlugin::default();
        let mut store = store();
        // View order by rank ascending is 5, 4, 3, 2, 1.
        store.apply(StatePatch::SetSortModel(SortModel::asc("rank"))).unwrap();

        click(&plugin, &mut store, 4, ClickModifiers::NONE);
        click(&plugin, &mut store, 2, ClickModifiers::SHIFT);
        assert_eq!(selected(&store), vec!["2", "3", "4"]);
        assert_eq!(store.state().selection.anchor(), Some(&RowId::from(4)));

        click(&plugin, &mut store, 3, ClickModifiers::CTRL);
        assert_eq!(selected(&store), vec!["2", "4"]);
    }

    #[test]
    fn test_single_mode_collapses() {
        let mut plugin = SelectionPlugin::default();
        let mut store = store();
        let mut cx = PluginContext::new(store.state(), store.view());
        plugin
            .init(&mut cx, &serde_json::json!({"mode": "single"}))
            .unwrap();
        let patches = cx.into_patches();
        store.apply_all(patches).unwrap();

        click(&plugin, &mut store, 1, ClickModifiers::NONE);
        click(&plugin, &mut store, 3, ClickModifiers::CTRL);
        assert_eq!(selected(&store), vec!["3"]);

        let patch = plugin.select_all(store.state(), store.view());
        store.apply(patch).unwrap();
        assert_eq!(store.state().selection.len(), 1);
    }

    #[test]
    fn test_unknown_row_rejected() {
        let plugin = SelectionPlugin::default();
        let store = store();
        let err = plugin
            .click(store.state(), store.view(), &RowId::from(99), ClickModifiers::NONE)
            .unwrap_err();
        assert_eq!(err, GridError::UnknownRow { id: "99".into() });
    }

    #[test]
    fn test_select_all_and_clear() {
        let plugin = SelectionPlugin::default();
        let mut store = store();
        let patch = plugin.select_all(store.state(), store.view());
        store.apply(patch).unwrap();
        assert_eq!(store.state().selection.len(), 5);
        store.apply(plugin.clear()).unwrap();
        assert!(store.state().selection.is_empty());
    }
}
