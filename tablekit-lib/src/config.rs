//! Grid configuration

use crate::state::DEFAULT_PAGE_SIZE;
use crate::state::SelectionMode;

/// Configuration for a new [`Grid`](crate::Grid).
///
/// # Example
///
/// ```
/// use tablekit_lib::GridConfig;
///
/// let config = GridConfig::default()
///     .with_row_id_field("employee_id")
///     .with_page_size(25);
/// ```
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Field holding each row's stable identifier.
    ///
    /// Default: `id`
    pub row_id_field: String,

    /// Initial rows per page.
    ///
    /// Default: 100
    pub page_size: usize,

    /// Initial selection mode.
    ///
    /// Default: multiple
    pub selection_mode: SelectionMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_id_field: "id".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            selection_mode: SelectionMode::Multiple,
        }
    }
}

impl GridConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row id field.
    pub fn with_row_id_field(mut self, field: impl Into<String>) -> Self {
        self.row_id_field = field.into();
        self
    }

    /// Sets the initial page size. Zero is raised to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the initial selection mode.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }
}
