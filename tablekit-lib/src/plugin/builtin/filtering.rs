//! Column filters and debounced quick-filter input

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use crate::error::GridError;
use crate::error::PluginError;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::FilterModel;
use crate::state::FilterSpec;
use crate::state::GridState;
use crate::state::StatePatch;

use super::FILTERING;

/// Options for [`FilteringPlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct FilteringOptions {
    /// Quiet period before quick-filter input is committed.
    pub debounce_ms: u64,
    /// Quick filter applied on attach.
    pub quick_filter: Option<String>,
}

impl Default for FilteringOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            quick_filter: None,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingInput {
    text: String,
    due: Instant,
}

/// Builds column filter patches and debounces quick-filter typing.
///
/// Quick-filter input is a latest-wins debounce: each keystroke replaces the
/// pending text and restarts the quiet period. The caller drives time by
/// calling [`poll`](Self::poll), typically from its frame or timer loop.
#[derive(Debug, Default)]
pub struct FilteringPlugin {
    options: FilteringOptions,
    pending: Option<PendingInput>,
}

impl FilteringPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &FilteringOptions {
        &self.options
    }

    /// Builds a patch that sets or clears the filter on `col_id`.
    pub fn set_filter(
        &self,
        state: &GridState,
        col_id: &str,
        spec: Option<FilterSpec>,
    ) -> Result<StatePatch, GridError> {
        let column = state
            .column(col_id)
            .ok_or_else(|| GridError::unknown_column(col_id))?;
        if spec.is_some() && (!column.filterable || column.field.is_none()) {
            return Err(GridError::NotFilterable {
                id: col_id.to_string(),
            });
        }
        Ok(StatePatch::SetFilter {
            col_id: col_id.to_string(),
            spec,
        })
    }

    /// Builds a patch that clears every column filter and the quick filter.
    pub fn clear_all(&mut self) -> Vec<StatePatch> {
        self.pending = None;
        vec![
            StatePatch::SetFilterModel(FilterModel::new()),
            StatePatch::SetQuickFilter(String::new()),
        ]
    }

    /// Records quick-filter input.
    ///
    /// Returns the patch straight away when debouncing is disabled;
    /// otherwise the input waits for [`poll`](Self::poll).
    pub fn quick_filter_input(&mut self, text: impl Into<String>, now: Instant) -> Option<StatePatch> {
        let text = text.into();
        if self.options.debounce_ms == 0 {
            self.pending = None;
            return Some(StatePatch::SetQuickFilter(text));
        }
        self.pending = Some(PendingInput {
            text,
            due: now + Duration::from_millis(self.options.debounce_ms),
        });
        None
    }

    /// Releases the pending input once its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<StatePatch> {
        if self.pending.as_ref().is_some_and(|p| now >= p.due) {
            return self.flush();
        }
        None
    }

    /// Releases the pending input immediately.
    pub fn flush(&mut self) -> Option<StatePatch> {
        self.pending
            .take()
            .map(|p| StatePatch::SetQuickFilter(p.text))
    }

    /// When the pending input becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }
}

impl Plugin for FilteringPlugin {
    fn name(&self) -> &str {
        FILTERING
    }

    fn init(
        &mut self,
        cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        self.options = parse_options(FILTERING, options)?;
        if let Some(text) = &self.options.quick_filter {
            cx.request(StatePatch::SetQuickFilter(text.clone()));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.pending = None;
    }

    impl_plugin_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_latest_wins() {
        let mut plugin = FilteringPlugin::default();
        let t0 = Instant::now();
        assert!(plugin.quick_filter_input("a", t0).is_none());
        assert!(plugin.quick_filter_input("ab", t0 + Duration::from_millis(100)).is_none());

        // The second keystroke restarted the quiet period.
        assert!(plugin.poll(t0 + Duration::from_millis(350)).is_none());
        match plugin.poll(t0 + Duration::from_millis(400)) {
            Some(StatePatch::SetQuickFilter(text)) => assert_eq!(text, "ab"),
            other => panic!("unexpected patch: {:?}", other),
        }
        assert!(plugin.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_zero_debounce_is_immediate() {
        let mut plugin = FilteringPlugin {
            options: FilteringOptions {
                debounce_ms: 0,
                quick_filter: None,
            },
            pending: None,
        };
        assert!(plugin.quick_filter_input("x", Instant::now()).is_some());
        assert!(plugin.next_deadline().is_none());
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut plugin = FilteringPlugin::default();
        let state = GridState::default();
        let view = crate::pipeline::GridView::default();
        let mut cx = PluginContext::new(&state, &view);
        let err = plugin
            .init(&mut cx, &serde_json::json!({"debounce": 10}))
            .unwrap_err();
        assert!(matches!(err, PluginError::ConfigValidation { .. }));
    }
}
