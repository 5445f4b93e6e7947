//! State patches

use crate::model::ColumnDef;
use crate::model::Pinned;
use crate::model::Row;
use crate::model::RowId;
use crate::model::Value;

use super::FilterModel;
use super::FilterSpec;
use super::SelectionMode;
use super::SortModel;

/// Addresses the row a cell update applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum RowRef {
    /// Position in the raw row array.
    Index(usize),
    /// Row id read from the id field.
    Id(RowId),
}

/// A single cell write.
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    /// Target row.
    pub row: RowRef,
    /// Field to write.
    pub field: String,
    /// New value.
    pub value: Value,
}

impl CellUpdate {
    /// Creates an update addressed by raw row index.
    pub fn at(index: usize, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            row: RowRef::Index(index),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an update addressed by row id.
    pub fn by_id(id: impl Into<RowId>, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            row: RowRef::Id(id.into()),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A requested change to the grid state.
///
/// Patches are the only way state changes: collaborators and plugins build
/// them, the store validates and applies them, then the view is recomputed.
#[derive(Debug, Clone)]
pub enum StatePatch {
    /// Replace all rows.
    SetRows(Vec<Row>),
    /// Insert rows, replacing existing rows with the same id in place.
    UpsertRows(Vec<Row>),
    /// Remove rows by id.
    RemoveRows(Vec<RowId>),
    /// Write individual cells.
    UpdateCells(Vec<CellUpdate>),
    /// Replace the column set.
    SetColumns(Vec<ColumnDef>),
    /// Set a column's fixed width.
    SetColumnWidth { col_id: String, width: u32 },
    /// Show or hide a column.
    SetColumnHidden { col_id: String, hidden: bool },
    /// Pin or unpin a column.
    SetColumnPinned { col_id: String, pinned: Pinned },
    /// Move a column to a new position in the column order.
    MoveColumn { col_id: String, to_index: usize },
    /// Replace the sort model.
    SetSortModel(SortModel),
    /// Replace the whole filter model.
    SetFilterModel(FilterModel),
    /// Set or clear one column filter.
    SetFilter {
        col_id: String,
        spec: Option<FilterSpec>,
    },
    /// Set the quick filter text.
    SetQuickFilter(String),
    /// Set rows per page; resets to the first page.
    SetPageSize(usize),
    /// Set the current page (clamped on recompute).
    SetCurrentPage(usize),
    /// Replace the selected rows and anchor.
    SetSelection {
        ids: Vec<RowId>,
        anchor: Option<RowId>,
    },
    /// Change the selection mode.
    SetSelectionMode(SelectionMode),
}

impl StatePatch {
    /// Returns `true` if this patch changes the row or column data.
    pub fn touches_data(&self) -> bool {
        matches!(
            self,
            StatePatch::SetRows(_)
                | StatePatch::UpsertRows(_)
                | StatePatch::RemoveRows(_)
                | StatePatch::UpdateCells(_)
                | StatePatch::SetColumns(_)
                | StatePatch::SetColumnHidden { .. }
        )
    }
}
