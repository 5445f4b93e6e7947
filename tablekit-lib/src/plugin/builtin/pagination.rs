//! Page navigation

use serde::Deserialize;

use crate::error::GridError;
use crate::error::PluginError;
use crate::pipeline::GridView;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::DEFAULT_PAGE_SIZE;
use crate::state::StatePatch;

use super::PAGINATION;

/// Options for [`PaginationPlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PaginationOptions {
    /// Rows per page applied on attach.
    pub page_size: usize,
    /// Page sizes the user may pick from.
    pub page_sizes: Vec<usize>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_sizes: vec![10, 25, 50, DEFAULT_PAGE_SIZE],
        }
    }
}

impl PaginationOptions {
    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("pageSize must be at least 1".to_string());
        }
        if !self.page_sizes.is_empty() && !self.page_sizes.contains(&self.page_size) {
            return Err(format!(
                "pageSize {} is not one of pageSizes {:?}",
                self.page_size, self.page_sizes
            ));
        }
        Ok(())
    }
}

/// Sets the page size and moves between pages.
///
/// Navigation builds `SetCurrentPage` patches against the committed view;
/// the store clamps the page on recompute, so stepping past either end is
/// harmless.
#[derive(Debug, Default)]
pub struct PaginationPlugin {
    options: PaginationOptions,
}

impl PaginationPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// Builds a patch that changes the page size.
    ///
    /// The size must be one of the configured `page_sizes`, when any are set.
    pub fn set_page_size(&self, size: usize) -> Result<StatePatch, GridError> {
        let allowed = self.options.page_sizes.is_empty() || self.options.page_sizes.contains(&size);
        if size == 0 || !allowed {
            return Err(GridError::InvalidPageSize { size });
        }
        Ok(StatePatch::SetPageSize(size))
    }

    /// Builds a patch that moves to `page` (0-indexed).
    pub fn go_to(&self, page: usize) -> StatePatch {
        StatePatch::SetCurrentPage(page)
    }

    /// Builds a patch that moves to the next page.
    pub fn next(&self, view: &GridView) -> StatePatch {
        self.go_to((view.current_page + 1).min(view.total_pages.saturating_sub(1)))
    }

    /// Builds a patch that moves to the previous page.
    pub fn previous(&self, view: &GridView) -> StatePatch {
        self.go_to(view.current_page.saturating_sub(1))
    }

    /// Builds a patch that moves to the first page.
    pub fn first(&self) -> StatePatch {
        self.go_to(0)
    }

    /// Builds a patch that moves to the last page.
    pub fn last(&self, view: &GridView) -> StatePatch {
        self.go_to(view.total_pages.saturating_sub(1))
    }
}

impl Plugin for PaginationPlugin {
    fn name(&self) -> &str {
        PAGINATION
    }

    fn init(
        &mut self,
        cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        let options: PaginationOptions = parse_options(PAGINATION, options)?;
        options
            .validate()
            .map_err(|message| PluginError::config(PAGINATION, message))?;
        if cx.state().pagination.page_size != options.page_size {
            cx.request(StatePatch::SetPageSize(options.page_size));
        }
        self.options = options;
        Ok(())
    }

    impl_plugin_any!();
}
