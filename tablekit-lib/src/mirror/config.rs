//! Mirror configuration

/// Default name of the mirrored table.
pub const DEFAULT_TABLE_NAME: &str = "grid_data";

/// Default number of rows per insert statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for a [`MirrorSynchronizer`](super::MirrorSynchronizer).
///
/// # Example
///
/// ```
/// use tablekit_lib::mirror::MirrorConfig;
///
/// let config = MirrorConfig::default()
///     .with_table_name("employees")
///     .with_batch_size(500);
/// assert_eq!(config.table_name, "employees");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Name of the mirrored table.
    ///
    /// Default: `grid_data`
    pub table_name: String,

    /// Rows per multi-row insert. Lowered automatically for wide tables so
    /// a statement never exceeds SQLite's bind parameter limit.
    ///
    /// Default: 1000
    pub batch_size: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl MirrorConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Sets the insert batch size (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}
