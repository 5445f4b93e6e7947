//! Header-click sorting

use serde::Deserialize;

use crate::error::GridError;
use crate::error::PluginError;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::Direction;
use crate::state::GridState;
use crate::state::SortModel;
use crate::state::StatePatch;

use super::SORTING;

/// Options for [`SortingPlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SortingOptions {
    /// Allow additive (shift-click) multi-column sorting.
    pub multi_sort: bool,
    /// Cap on the number of sort entries; the oldest are dropped first.
    pub max_sort_columns: Option<usize>,
}

impl Default for SortingOptions {
    fn default() -> Self {
        Self {
            multi_sort: true,
            max_sort_columns: None,
        }
    }
}

/// Cycles column sorting asc → desc → none on header clicks.
#[derive(Debug, Default)]
pub struct SortingPlugin {
    options: SortingOptions,
}

impl SortingPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &SortingOptions {
        &self.options
    }

    /// Builds the sort patch for a header click on `col_id`.
    ///
    /// A plain click makes `col_id` the only sort key; an additive click
    /// (with `multi_sort` enabled) cycles it in place and keeps the others.
    pub fn toggle(
        &self,
        state: &GridState,
        col_id: &str,
        additive: bool,
    ) -> Result<StatePatch, GridError> {
        let column = state
            .column(col_id)
            .ok_or_else(|| GridError::unknown_column(col_id))?;
        if !column.sortable || column.field.is_none() {
            return Err(GridError::NotSortable {
                id: col_id.to_string(),
            });
        }

        let next = match state.sort.direction_of(col_id) {
            None => Some(Direction::Asc),
            Some(Direction::Asc) => Some(Direction::Desc),
            Some(Direction::Desc) => None,
        };

        let mut sort = if additive && self.options.multi_sort {
            state.sort.clone()
        } else {
            SortModel::new()
        };
        match next {
            Some(direction) => {
                if !sort.set_direction(col_id, direction) {
                    sort.push(col_id, direction);
                }
            }
            None => {
                sort.remove(col_id);
            }
        }
        if let Some(max) = self.options.max_sort_columns {
            sort.truncate_front(max);
        }
        Ok(StatePatch::SetSortModel(sort))
    }

    /// Builds a patch that clears all sorting.
    pub fn clear(&self) -> StatePatch {
        StatePatch::SetSortModel(SortModel::new())
    }
}

impl Plugin for SortingPlugin {
    fn name(&self) -> &str {
        SORTING
    }

    fn init(
        &mut self,
        _cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        self.options = parse_options(SORTING, options)?;
        if self.options.max_sort_columns == Some(0) {
            return Err(PluginError::config(SORTING, "maxSortColumns must be at least 1"));
        }
        Ok(())
    }

    fn on_state_change(&mut self, cx: &mut PluginContext<'_>) {
        // Single-sort mode keeps only the primary key.
        if !self.options.multi_sort && cx.state().sort.entries().len() > 1 {
            let mut sort = cx.state().sort.clone();
            sort.truncate_front(1);
            cx.request(StatePatch::SetSortModel(sort));
        }
    }

    impl_plugin_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::model::ColumnDef;
    use crate::state::StateStore;

    fn store() -> StateStore {
        let mut store = StateStore::new(&GridConfig::default());
        store
            .apply(StatePatch::SetColumns(vec![
                ColumnDef::field("a"),
                ColumnDef::field("b"),
                ColumnDef::new("actions"),
            ]))
            .unwrap();
        store
    }

    fn cycle(plugin: &SortingPlugin, store: &mut StateStore, col: &str, additive: bool) {
        let patch = plugin.toggle(store.state(), col, additive).unwrap();
        store.apply(patch).unwrap();
    }

    #[test]
    fn test_cycle_asc_desc_none() {
        let plugin = SortingPlugin::default();
        let mut store = store();
        cycle(&plugin, &mut store, "a", false);
        assert_eq!(store.state().sort, SortModel::asc("a"));
        cycle(&plugin, &mut store, "a", false);
        assert_eq!(store.state().sort, SortModel::desc("a"));
        cycle(&plugin, &mut store, "a", false);
        assert!(store.state().sort.is_empty());
    }

    #[test]
    fn test_additive_keeps_priority() {
        let plugin = SortingPlugin::default();
        let mut store = store();
        cycle(&plugin, &mut store, "a", false);
        cycle(&plugin, &mut store, "b", true);
        cycle(&plugin, &mut store, "a", true);
        assert_eq!(store.state().sort, SortModel::desc("a").then_asc("b"));

        // A plain click drops the other keys.
        cycle(&plugin, &mut store, "b", false);
        assert_eq!(store.state().sort, SortModel::desc("b"));
    }

    #[test]
    fn test_display_only_column_not_sortable() {
        let plugin = SortingPlugin::default();
        let store = store();
        assert_eq!(
            plugin.toggle(store.state(), "actions", false).unwrap_err(),
            GridError::NotSortable {
                id: "actions".into()
            }
        );
    }

    #[test]
    fn test_max_sort_columns() {
        let plugin = SortingPlugin {
            options: SortingOptions {
                multi_sort: true,
                max_sort_columns: Some(1),
            },
        };
        let mut store = store();
        cycle(&plugin, &mut store, "a", true);
        cycle(&plugin, &mut store, "b", true);
        assert_eq!(store.state().sort, SortModel::asc("b"));
    }
}
