//! Paginate stage

use std::ops::Range;

use crate::state::PaginationState;

/// The slice of the filtered result that forms the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// Positions into the filtered, sorted result.
    pub range: Range<usize>,
    /// Current page after clamping.
    pub current_page: usize,
    /// Total number of pages, at least 1.
    pub total_pages: usize,
}

/// Computes the page window for `filtered_count` rows.
///
/// An out-of-range page snaps to the last valid page; an empty result yields
/// page 0 of 1 with an empty range.
pub fn page_window(filtered_count: usize, pagination: &PaginationState) -> PageWindow {
    let page_size = pagination.page_size.max(1);
    let total_pages = pagination.total_pages(filtered_count);
    let current_page = pagination.clamped_page(filtered_count);
    let start = (current_page * page_size).min(filtered_count);
    let end = (start + page_size).min(filtered_count);

    PageWindow {
        range: start..end,
        current_page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_is_partial() {
        let window = page_window(
            25,
            &PaginationState {
                page_size: 10,
                current_page: 2,
            },
        );
        assert_eq!(window.range, 20..25);
        assert_eq!(window.total_pages, 3);
    }

    #[test]
    fn test_out_of_range_page_snaps_back() {
        let window = page_window(
            25,
            &PaginationState {
                page_size: 10,
                current_page: 5,
            },
        );
        assert_eq!(window.current_page, 2);
        assert_eq!(window.range, 20..25);
    }

    #[test]
    fn test_empty_result() {
        let window = page_window(
            0,
            &PaginationState {
                page_size: 10,
                current_page: 3,
            },
        );
        assert_eq!(window.current_page, 0);
        assert_eq!(window.total_pages, 1);
        assert!(window.range.is_empty());
    }
}
