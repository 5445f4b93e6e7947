//! The state store

use std::collections::HashMap;
use std::collections::HashSet;

use log::debug;
use log::trace;

use crate::config::GridConfig;
use crate::error::GridError;
use crate::model::ColumnDef;
use crate::model::ColumnWidth;
use crate::model::Row;
use crate::model::RowId;
use crate::pipeline::GridView;
use crate::pipeline::compute_view;

use super::CellUpdate;
use super::GridState;
use super::PaginationState;
use super::RowRef;
use super::SelectionState;
use super::StatePatch;

/// Owns the canonical [`GridState`] and its derived [`GridView`].
///
/// Every successful change recomputes the view in full, writes the clamped
/// page back into the pagination state and prunes the selection down to
/// loaded rows, so readers always see a state that satisfies those
/// invariants.
#[derive(Debug)]
pub struct StateStore {
    state: GridState,
    view: GridView,
    version: u64,
}

impl StateStore {
    /// Creates an empty store.
    pub fn new(config: &GridConfig) -> Self {
        let state = GridState {
            pagination: PaginationState::new(config.page_size),
            selection: SelectionState::new(config.selection_mode),
            row_id_field: config.row_id_field.clone(),
            ..Default::default()
        };
        let mut store = Self {
            state,
            view: GridView::default(),
            version: 0,
        };
        store.recompute();
        store
    }

    /// Returns the current state.
    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// Returns the current derived view.
    pub fn view(&self) -> &GridView {
        &self.view
    }

    /// Returns a counter that increments on every committed change.
    ///
    /// No-op and rejected patches leave it alone.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replaces the whole state.
    ///
    /// Fails without changing anything if the column ids aren't unique.
    pub fn replace(&mut self, state: GridState) -> Result<(), GridError> {
        ensure_unique_columns(&state.columns)?;
        let revision = self.state.data_revision + 1;
        self.state = state;
        self.state.data_revision = revision;
        self.state.pagination.page_size = self.state.pagination.page_size.max(1);
        self.recompute();
        Ok(())
    }

    /// Applies one patch.
    ///
    /// Returns `Ok(true)` if the state changed (and the view was recomputed),
    /// `Ok(false)` for a no-op. A rejected patch leaves the state untouched.
    pub fn apply(&mut self, patch: StatePatch) -> Result<bool, GridError> {
        self.apply_all(std::iter::once(patch))
    }

    /// Applies patches in order and recomputes once.
    ///
    /// Stops at the first rejected patch; patches before it stay applied and
    /// the view is still recomputed for them before the error is returned.
    pub fn apply_all(
        &mut self,
        patches: impl IntoIterator<Item = StatePatch>,
    ) -> Result<bool, GridError> {
        let mut changed = false;
        let mut data_changed = false;
        let mut result = Ok(());

        for patch in patches {
            let touches_data = patch.touches_data();
            match self.apply_one(patch) {
                Ok(applied) => {
                    changed |= applied;
                    data_changed |= applied && touches_data;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        if data_changed {
            self.state.data_revision += 1;
        }
        if changed {
            self.recompute();
        }
        result.map(|()| changed)
    }

    fn apply_one(&mut self, patch: StatePatch) -> Result<bool, GridError> {
        let state = &mut self.state;
        match patch {
            StatePatch::SetRows(rows) => {
                trace!("set_rows: {} rows", rows.len());
                state.rows = rows;
                Ok(true)
            }
            StatePatch::UpsertRows(rows) => {
                let changed = !rows.is_empty();
                upsert_rows(state, rows);
                Ok(changed)
            }
            StatePatch::RemoveRows(ids) => {
                let ids: HashSet<RowId> = ids.into_iter().collect();
                let before = state.rows.len();
                let id_field = state.row_id_field.clone();
                state
                    .rows
                    .retain(|r| r.key(&id_field).is_none_or(|id| !ids.contains(&id)));
                Ok(state.rows.len() != before)
            }
            StatePatch::UpdateCells(updates) => update_cells(state, updates),
            StatePatch::SetColumns(columns) => {
                ensure_unique_columns(&columns)?;
                state.columns = columns;
                Ok(true)
            }
            StatePatch::SetColumnWidth { col_id, width } => {
                let column = column_mut(&mut state.columns, &col_id)?;
                let width = ColumnWidth::Fixed(width);
                let changed = column.width != width;
                column.width = width;
                Ok(changed)
            }
            StatePatch::SetColumnHidden { col_id, hidden } => {
                let column = column_mut(&mut state.columns, &col_id)?;
                let changed = column.hidden != hidden;
                column.hidden = hidden;
                Ok(changed)
            }
            StatePatch::SetColumnPinned { col_id, pinned } => {
                let column = column_mut(&mut state.columns, &col_id)?;
                let changed = column.pinned != pinned;
                column.pinned = pinned;
                Ok(changed)
            }
            StatePatch::MoveColumn { col_id, to_index } => {
                let from = state
                    .columns
                    .iter()
                    .position(|c| c.id == col_id)
                    .ok_or_else(|| GridError::unknown_column(&col_id))?;
                let to = to_index.min(state.columns.len() - 1);
                if from == to {
                    return Ok(false);
                }
                let column = state.columns.remove(from);
                state.columns.insert(to, column);
                Ok(true)
            }
            StatePatch::SetSortModel(sort) => {
                let changed = state.sort != sort;
                state.sort = sort;
                Ok(changed)
            }
            StatePatch::SetFilterModel(filter) => {
                let changed = state.filter != filter;
                state.filter = filter;
                Ok(changed)
            }
            StatePatch::SetFilter { col_id, spec } => {
                if state.column(&col_id).is_none() {
                    return Err(GridError::unknown_column(col_id));
                }
                if state.filter.get(&col_id) == spec.as_ref() {
                    return Ok(false);
                }
                state.filter.set(col_id, spec);
                Ok(true)
            }
            StatePatch::SetQuickFilter(text) => {
                let changed = state.quick_filter != text;
                state.quick_filter = text;
                Ok(changed)
            }
            StatePatch::SetPageSize(size) => {
                if size == 0 {
                    return Err(GridError::InvalidPageSize { size });
                }
                let next = PaginationState::new(size);
                let changed = state.pagination != next;
                state.pagination = next;
                Ok(changed)
            }
            StatePatch::SetCurrentPage(page) => {
                let changed = state.pagination.current_page != page;
                state.pagination.current_page = page;
                Ok(changed)
            }
            StatePatch::SetSelection { ids, anchor } => {
                let before = state.selection.clone();
                state.selection.replace(ids, anchor);
                Ok(state.selection != before)
            }
            StatePatch::SetSelectionMode(mode) => {
                let before = state.selection.clone();
                state.selection.set_mode(mode);
                Ok(state.selection != before)
            }
        }
    }

    fn recompute(&mut self) {
        self.version += 1;
        let state = &mut self.state;
        self.view = compute_view(
            &state.rows,
            &state.columns,
            &state.sort,
            &state.filter,
            &state.quick_filter,
            &state.pagination,
        );
        state.pagination.current_page = self.view.current_page;

        if !state.selection.is_empty() {
            let loaded: HashSet<RowId> = state
                .rows
                .iter()
                .filter_map(|r| r.key(&state.row_id_field))
                .collect();
            if state.selection.prune(&loaded) {
                debug!("pruned selection to {} loaded rows", state.selection.len());
            }
        }
    }
}

fn ensure_unique_columns(columns: &[ColumnDef]) -> Result<(), GridError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.id.as_str()) {
            return Err(GridError::DuplicateColumn {
                id: column.id.clone(),
            });
        }
    }
    Ok(())
}

fn column_mut<'a>(columns: &'a mut [ColumnDef], id: &str) -> Result<&'a mut ColumnDef, GridError> {
    columns
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| GridError::unknown_column(id))
}

fn upsert_rows(state: &mut GridState, rows: Vec<Row>) {
    let id_field = state.row_id_field.clone();
    let mut positions: HashMap<RowId, usize> = state
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.key(&id_field).map(|id| (id, i)))
        .collect();

    for row in rows {
        match row.key(&id_field) {
            Some(id) => match positions.get(&id) {
                Some(&i) => state.rows[i] = row,
                None => {
                    positions.insert(id, state.rows.len());
                    state.rows.push(row);
                }
            },
            None => state.rows.push(row),
        }
    }
}

fn update_cells(state: &mut GridState, updates: Vec<CellUpdate>) -> Result<bool, GridError> {
    if updates.is_empty() {
        return Ok(false);
    }

    let needs_ids = updates.iter().any(|u| matches!(u.row, RowRef::Id(_)));
    let positions: HashMap<RowId, usize> = if needs_ids {
        state
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.key(&state.row_id_field).map(|id| (id, i)))
            .collect()
    } else {
        HashMap::new()
    };

    // Resolve every target before writing so a bad update rejects the batch.
    let len = state.rows.len();
    let mut resolved = Vec::with_capacity(updates.len());
    for update in updates {
        let index = match &update.row {
            RowRef::Index(i) if *i < len => *i,
            RowRef::Index(i) => return Err(GridError::RowIndexOutOfRange { index: *i, len }),
            RowRef::Id(id) => *positions.get(id).ok_or_else(|| GridError::UnknownRow {
                id: id.to_string(),
            })?,
        };
        resolved.push((index, update.field, update.value));
    }

    let mut changed = false;
    for (index, field, value) in resolved {
        let row = &mut state.rows[index];
        if row.get(&field) != Some(&value) {
            row.insert(field, value);
            changed = true;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::state::SelectionMode;

    fn store_with_rows(n: i64) -> StateStore {
        let mut store = StateStore::new(&GridConfig::default().with_page_size(10));
        let rows = (0..n).map(|i| Row::new().set("id", i).set("v", i * 10)).collect();
        store.apply(StatePatch::SetRows(rows)).unwrap();
        store
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let mut store = store_with_rows(1);
        let err = store
            .apply(StatePatch::SetColumns(vec![
                ColumnDef::field("a"),
                ColumnDef::field("a"),
            ]))
            .unwrap_err();
        assert_eq!(err, GridError::DuplicateColumn { id: "a".into() });
        assert!(store.state().columns.is_empty());
    }

    #[test]
    fn test_current_page_clamped_after_commit() {
        let mut store = store_with_rows(25);
        store.apply(StatePatch::SetCurrentPage(5)).unwrap();
        assert_eq!(store.state().pagination.current_page, 2);
        assert_eq!(store.view().window_rows.len(), 5);
    }

    #[test]
    fn test_removed_rows_pruned_from_selection() {
        let mut store = store_with_rows(3);
        store
            .apply(StatePatch::SetSelection {
                ids: vec!["0".into(), "2".into()],
                anchor: Some("2".into()),
            })
            .unwrap();
        store.apply(StatePatch::RemoveRows(vec!["2".into()])).unwrap();
        let selected: Vec<_> = store.state().selection.selected().cloned().collect();
        assert_eq!(selected, vec![RowId::from("0")]);
        assert_eq!(store.state().selection.anchor(), None);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = store_with_rows(3);
        store
            .apply(StatePatch::UpsertRows(vec![
                Row::new().set("id", 1).set("v", 99),
                Row::new().set("id", 7).set("v", 70),
            ]))
            .unwrap();
        let rows = &store.state().rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].value("v"), &Value::Int(99));
        assert_eq!(rows[3].value("id"), &Value::Int(7));
    }

    #[test]
    fn test_bad_cell_update_rejects_batch() {
        let mut store = store_with_rows(2);
        let revision = store.state().data_revision;
        let err = store
            .apply(StatePatch::UpdateCells(vec![
                CellUpdate::at(0, "v", 1),
                CellUpdate::at(9, "v", 1),
            ]))
            .unwrap_err();
        assert_eq!(err, GridError::RowIndexOutOfRange { index: 9, len: 2 });
        assert_eq!(store.state().rows[0].value("v"), &Value::Int(0));
        assert_eq!(store.state().data_revision, revision);
    }

    #[test]
    fn test_noop_patch_reports_unchanged() {
        let mut store = store_with_rows(2);
        assert!(!store.apply(StatePatch::SetQuickFilter(String::new())).unwrap());
        assert!(
            !store
                .apply(StatePatch::SetSelectionMode(SelectionMode::Multiple))
                .unwrap()
        );
    }
}
