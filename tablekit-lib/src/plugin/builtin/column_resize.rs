//! Column resizing through drag sessions

use serde::Deserialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::GridError;
use crate::error::PluginError;
use crate::interaction::ResizeBounds;
use crate::interaction::ResizeSessionManager;
use crate::interaction::ResizeUpdate;
use crate::model::DEFAULT_COLUMN_WIDTH;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::GridState;
use crate::state::StatePatch;

use super::COLUMN_RESIZING;

/// Options for [`ColumnResizePlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ColumnResizeOptions {
    pub min_width: u32,
    pub max_width: u32,
}

impl Default for ColumnResizeOptions {
    fn default() -> Self {
        let bounds = ResizeBounds::default();
        Self {
            min_width: bounds.min_width,
            max_width: bounds.max_width,
        }
    }
}

/// Turns pointer drags on column edges into width patches.
#[derive(Debug, Default)]
pub struct ColumnResizePlugin {
    options: ColumnResizeOptions,
    sessions: ResizeSessionManager,
}

impl ColumnResizePlugin {
    /// Returns the active options.
    pub fn options(&self) -> &ColumnResizeOptions {
        &self.options
    }

    /// Starts dragging the right edge of `col_id` from pointer `x`.
    ///
    /// Flex columns start from the default width.
    pub fn start_resize(&mut self, state: &GridState, col_id: &str, x: f64) -> Result<Uuid, GridError> {
        let column = state
            .column(col_id)
            .ok_or_else(|| GridError::unknown_column(col_id))?;
        let width = column.fixed_width().unwrap_or(DEFAULT_COLUMN_WIDTH);
        Ok(self.sessions.start_resize(col_id, x, width))
    }

    /// Records a pointer move. Returns `true` if a frame should be scheduled.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        self.sessions.pointer_move(x)
    }

    /// Runs a frame, returning the width patch to commit if any.
    pub fn on_frame(&mut self, now: Instant) -> Option<StatePatch> {
        self.sessions.on_frame(now).map(into_patch)
    }

    /// Ends the drag, returning a patch with the final width.
    pub fn end_resize(&mut self) -> Option<StatePatch> {
        self.sessions.end_resize().map(into_patch)
    }

    /// Returns `true` while a drag is active.
    pub fn is_resizing(&self) -> bool {
        self.sessions.is_dragging()
    }
}

fn into_patch(update: ResizeUpdate) -> StatePatch {
    StatePatch::SetColumnWidth {
        col_id: update.col_id,
        width: update.width,
    }
}

impl Plugin for ColumnResizePlugin {
    fn name(&self) -> &str {
        COLUMN_RESIZING
    }

    fn init(
        &mut self,
        _cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        let options: ColumnResizeOptions = parse_options(COLUMN_RESIZING, options)?;
        if options.min_width > options.max_width {
            return Err(PluginError::config(
                COLUMN_RESIZING,
                format!(
                    "minWidth {} exceeds maxWidth {}",
                    options.min_width, options.max_width
                ),
            ));
        }
        self.sessions = ResizeSessionManager::new(ResizeBounds::new(options.min_width, options.max_width));
        self.options = options;
        Ok(())
    }

    fn destroy(&mut self) {
        self.sessions.end_resize();
    }

    fn on_state_change(&mut self, cx: &mut PluginContext<'_>) {
        // Columns can be replaced mid-drag.
        let gone = self
            .sessions
            .session()
            .is_some_and(|s| cx.state().column(&s.col_id).is_none());
        if gone {
            self.sessions.end_resize();
        }
    }

    impl_plugin_any!();
}
