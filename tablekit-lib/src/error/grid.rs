//! Grid state error types

/// Errors raised when a state patch or plugin command is rejected.
///
/// A rejected patch leaves the grid state untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Two columns in one column set share an id.
    #[error("Duplicate column id '{id}'")]
    DuplicateColumn { id: String },

    /// A patch or command referenced a column that doesn't exist.
    #[error("Column '{id}' not found")]
    UnknownColumn { id: String },

    /// Sorting was requested on a column that isn't sortable.
    #[error("Column '{id}' is not sortable")]
    NotSortable { id: String },

    /// Filtering was requested on a column that isn't filterable.
    #[error("Column '{id}' is not filterable")]
    NotFilterable { id: String },

    /// A page size of zero or one outside the allowed set.
    #[error("Invalid page size {size}")]
    InvalidPageSize { size: usize },

    /// A cell update addressed a row index past the end of the data.
    #[error("Row index {index} out of range (len {len})")]
    RowIndexOutOfRange { index: usize, len: usize },

    /// A cell update addressed a row id that isn't loaded.
    #[error("Row '{id}' not found")]
    UnknownRow { id: String },

    /// A command targeted a plugin that isn't attached.
    #[error("Plugin '{name}' is not attached")]
    PluginNotAttached { name: String },

    /// The attached plugin under this name has a different type.
    #[error("Plugin '{name}' has an unexpected type")]
    PluginTypeMismatch { name: String },
}

impl GridError {
    /// Creates a new unknown column error.
    pub fn unknown_column(id: impl Into<String>) -> Self {
        Self::UnknownColumn { id: id.into() }
    }

    /// Creates a new plugin-not-attached error.
    pub fn plugin_not_attached(name: impl Into<String>) -> Self {
        Self::PluginNotAttached { name: name.into() }
    }
}
