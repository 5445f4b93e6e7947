//! Derived-view pipeline: sort → column filters → quick filter → paginate.
//!
//! The pipeline is a pure function of the grid inputs and always recomputes
//! in full: O(n log n) for the sort, O(n) for filtering and paging.

mod filter;
mod page;
mod sort;

pub use filter::matches_spec;
pub use page::*;
pub use sort::sort_indices;

use std::ops::Range;

use crate::model::ColumnDef;
use crate::model::Row;
use crate::state::FilterModel;
use crate::state::PaginationState;
use crate::state::SortModel;

use filter::RowFilter;

/// The derived, visible state of the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridView {
    /// Rows on the current page, in view order.
    pub window_rows: Vec<Row>,
    /// Raw indices of every row that passed filtering, in view order.
    pub ordered_indices: Vec<usize>,
    /// Positions of the current page within `ordered_indices`.
    pub window: Range<usize>,
    /// Number of raw rows.
    pub total_count: usize,
    /// Number of rows that passed filtering.
    pub filtered_count: usize,
    /// Current page after clamping.
    pub current_page: usize,
    /// Total number of pages, at least 1.
    pub total_pages: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl GridView {
    /// Raw indices of the rows on the current page.
    pub fn window_indices(&self) -> &[usize] {
        &self.ordered_indices[self.window.clone()]
    }

    /// Returns `true` if a page follows the current one.
    pub fn has_next_page(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    /// Returns `true` if a page precedes the current one.
    pub fn has_previous_page(&self) -> bool {
        self.current_page > 0
    }
}

/// Computes the visible view from the raw grid inputs.
///
/// # Example
///
/// ```
/// use tablekit_lib::model::{ColumnDef, Row};
/// use tablekit_lib::pipeline::compute_view;
/// use tablekit_lib::state::{FilterModel, PaginationState, SortModel};
///
/// let rows: Vec<Row> = (0..25).map(|i| Row::new().set("id", i)).collect();
/// let columns = vec![ColumnDef::field("id")];
/// let view = compute_view(
///     &rows,
///     &columns,
///     &SortModel::desc("id"),
///     &FilterModel::new(),
///     "",
///     &PaginationState::new(10),
/// );
/// assert_eq!(view.total_pages, 3);
/// assert_eq!(view.window_rows.len(), 10);
/// ```
pub fn compute_view(
    rows: &[Row],
    columns: &[ColumnDef],
    sort: &SortModel,
    filter: &FilterModel,
    quick_filter: &str,
    pagination: &PaginationState,
) -> GridView {
    let mut ordered: Vec<usize> = (0..rows.len()).collect();
    sort_indices(&mut ordered, rows, columns, sort);

    let row_filter = RowFilter::new(columns, filter, quick_filter);
    if !row_filter.is_pass_through() {
        ordered.retain(|&i| row_filter.matches(&rows[i]));
    }

    let filtered_count = ordered.len();
    let page = page_window(filtered_count, pagination);
    let window_rows = ordered[page.range.clone()]
        .iter()
        .map(|&i| rows[i].clone())
        .collect();

    GridView {
        window_rows,
        ordered_indices: ordered,
        window: page.range,
        total_count: rows.len(),
        filtered_count,
        current_page: page.current_page,
        total_pages: page.total_pages,
        page_size: pagination.page_size.max(1),
    }
}
