//! Pagination state

use serde::Deserialize;
use serde::Serialize;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Page size and current page (0-indexed).
///
/// `current_page` is clamped to `0..total_pages` after every recompute, so
/// it can be set optimistically and snaps to the last valid page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Rows per page. Always at least 1.
    pub page_size: usize,
    /// Current page, 0-indexed.
    pub current_page: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 0,
        }
    }
}

impl PaginationState {
    /// Creates pagination with the given page size on the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 0,
        }
    }

    /// Returns the number of pages for `row_count` rows.
    ///
    /// Never less than 1, so an empty result still has a page 0.
    pub fn total_pages(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size.max(1)).max(1)
    }

    /// Returns `current_page` clamped to the valid range for `row_count` rows.
    pub fn clamped_page(&self, row_count: usize) -> usize {
        self.current_page.min(self.total_pages(row_count) - 1)
    }
}
