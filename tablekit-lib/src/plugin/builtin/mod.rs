//! Built-in plugins

/// Implements the `Plugin` upcasts for a concrete type.
macro_rules! impl_plugin_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

mod column_resize;
mod export;
mod filtering;
mod pagination;
mod selection;
mod sorting;
mod sql_query;

pub use column_resize::*;
pub use export::*;
pub use filtering::*;
pub use pagination::*;
pub use selection::*;
pub use sorting::*;
pub use sql_query::*;

/// Registered name of [`SortingPlugin`].
pub const SORTING: &str = "sorting";
/// Registered name of [`FilteringPlugin`].
pub const FILTERING: &str = "filtering";
/// Registered name of [`PaginationPlugin`].
pub const PAGINATION: &str = "pagination";
/// Registered name of [`SelectionPlugin`].
pub const SELECTION: &str = "selection";
/// Registered name of [`ColumnResizePlugin`].
pub const COLUMN_RESIZING: &str = "column_resizing";
/// Registered name of [`ExportPlugin`].
pub const EXPORT: &str = "export";
/// Registered name of [`SqlQueryPlugin`].
pub const SQL_QUERY: &str = "sql_query";
