//! Canonical grid state and the store that owns it

mod filter;
mod pagination;
mod patch;
mod selection;
mod sort;
mod store;

pub use filter::*;
pub use pagination::*;
pub use patch::*;
pub use selection::*;
pub use sort::*;
pub use store::*;

use crate::model::ColumnDef;
use crate::model::Row;
use crate::model::RowId;
use crate::model::find_column;

/// The complete grid state.
///
/// Read access is handed out freely; changes go through
/// [`StatePatch`]es applied by the [`StateStore`].
#[derive(Debug, Clone, Default)]
pub struct GridState {
    /// Raw rows in insertion order.
    pub rows: Vec<Row>,
    /// Columns in display order.
    pub columns: Vec<ColumnDef>,
    /// Active sort.
    pub sort: SortModel,
    /// Active column filters.
    pub filter: FilterModel,
    /// Quick filter text. Empty means inactive.
    pub quick_filter: String,
    /// Page size and current page.
    pub pagination: PaginationState,
    /// Selected rows.
    pub selection: SelectionState,
    /// Field holding each row's id.
    pub row_id_field: String,
    /// Incremented whenever rows or columns change.
    pub data_revision: u64,
}

impl GridState {
    /// Finds a column by id.
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        find_column(&self.columns, id)
    }

    /// Returns the columns that are not hidden, in display order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    /// Returns the id of the row at a raw index.
    pub fn row_id_at(&self, index: usize) -> Option<RowId> {
        self.rows.get(index)?.key(&self.row_id_field)
    }

    /// Maps raw indices to row ids, skipping rows without an id.
    pub fn row_ids(&self, indices: &[usize]) -> Vec<RowId> {
        indices.iter().filter_map(|&i| self.row_id_at(i)).collect()
    }

    /// Finds the raw index of a row by id.
    pub fn index_of(&self, id: &RowId) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.key(&self.row_id_field).as_ref() == Some(id))
    }
}
