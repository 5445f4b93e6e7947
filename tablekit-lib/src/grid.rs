//! The Grid facade

use std::sync::Arc;

use log::debug;
use log::warn;
use tokio::sync::watch;

use crate::config::GridConfig;
use crate::error::GridError;
use crate::model::ColumnDef;
use crate::model::Row;
use crate::pipeline::GridView;
use crate::plugin::AttachReport;
use crate::plugin::AttachedInfo;
use crate::plugin::Plugin;
use crate::plugin::PluginHost;
use crate::plugin::PluginRegistry;
use crate::plugin::PluginSpec;
use crate::state::GridState;
use crate::state::StatePatch;
use crate::state::StateStore;

/// A grid shared with the live-mutation engine or other tasks.
pub type SharedGrid = Arc<tokio::sync::Mutex<Grid>>;

/// Rounds of plugin follow-up patches committed after one change.
const MAX_FOLLOW_UP_ROUNDS: usize = 8;

/// The single entry point for grid collaborators.
///
/// A `Grid` owns the state store, its own plugin registry and the attached
/// plugins. Every committed change recomputes the view, then notifies the
/// attached plugins in attach order; patches they request are committed
/// after the fan-out completes.
///
/// # Example
///
/// ```
/// use tablekit_lib::{Grid, GridConfig};
/// use tablekit_lib::model::{ColumnDef, Row};
/// use tablekit_lib::plugin::builtin::PaginationPlugin;
/// use tablekit_lib::state::SortModel;
/// use tablekit_lib::state::StatePatch;
///
/// let mut grid = Grid::new(GridConfig::default());
/// grid.set_columns(vec![ColumnDef::field("id"), ColumnDef::field("name")]).unwrap();
/// grid.set_rows((0..25).map(|i| Row::new().set("id", i)).collect()).unwrap();
///
/// let report = grid.attach([
///     serde_json::json!("sorting"),
///     serde_json::json!({"name": "pagination", "options": {"pageSize": 10}}),
/// ].into_iter().map(|v| serde_json::from_value(v).unwrap()));
/// assert!(report.is_complete());
///
/// grid.commit(StatePatch::SetSortModel(SortModel::desc("id"))).unwrap();
/// grid.dispatch("pagination", |p: &mut PaginationPlugin, _, view| Ok(p.last(view))).unwrap();
/// assert_eq!(grid.view().current_page, 2);
/// assert_eq!(grid.view().window_rows.len(), 5);
/// ```
#[derive(Debug)]
pub struct Grid {
    config: GridConfig,
    store: StateStore,
    registry: PluginRegistry,
    host: PluginHost,
    commits: watch::Sender<u64>,
}

impl Grid {
    /// Creates an empty grid with the built-in plugins registered.
    pub fn new(config: GridConfig) -> Self {
        Self::with_registry(config, PluginRegistry::with_builtins())
    }

    /// Creates an empty grid with a custom plugin registry.
    pub fn with_registry(config: GridConfig, registry: PluginRegistry) -> Self {
        Self {
            store: StateStore::new(&config),
            config,
            registry,
            host: PluginHost::new(),
            commits: watch::Sender::new(0),
        }
    }

    /// Returns the configuration the grid was created with.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the current state.
    pub fn state(&self) -> &GridState {
        self.store.state()
    }

    /// Returns the current derived view.
    pub fn view(&self) -> &GridView {
        self.store.view()
    }

    /// Watches the commit counter.
    ///
    /// The value increments once per committed change, including plugin
    /// follow-up commits.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.commits.subscribe()
    }

    /// Commits one patch.
    ///
    /// Returns `Ok(false)` for a no-op. A rejected patch leaves the state as
    /// it was and notifies nobody.
    pub fn commit(&mut self, patch: StatePatch) -> Result<bool, GridError> {
        self.commit_all(std::iter::once(patch))
    }

    /// Commits patches in order as one change.
    ///
    /// Stops at the first rejected patch. Patches before it stay committed
    /// and plugins are notified of them before the error is returned.
    pub fn commit_all(&mut self, patches: impl IntoIterator<Item = StatePatch>) -> Result<bool, GridError> {
        let before = self.store.version();
        let result = self.store.apply_all(patches);
        if self.store.version() != before {
            self.settle();
        }
        result
    }

    /// Replaces all rows.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> Result<bool, GridError> {
        self.commit(StatePatch::SetRows(rows))
    }

    /// Replaces the column set.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef>) -> Result<bool, GridError> {
        self.commit(StatePatch::SetColumns(columns))
    }

    /// Replaces the whole state.
    pub fn replace_state(&mut self, state: GridState) -> Result<(), GridError> {
        self.store.replace(state)?;
        self.settle();
        Ok(())
    }

    /// Notifies plugins and commits what they request, until quiet.
    fn settle(&mut self) {
        for round in 0..=MAX_FOLLOW_UP_ROUNDS {
            self.commits.send_modify(|n| *n += 1);
            let requested = self.host.notify(self.store.state(), self.store.view());
            if requested.is_empty() {
                return;
            }
            if round == MAX_FOLLOW_UP_ROUNDS {
                warn!("plugins still requesting changes after {} rounds", round);
                return;
            }

            let before = self.store.version();
            if let Err(e) = self.store.apply_all(requested) {
                warn!("plugin follow-up rejected: {}", e);
            }
            if self.store.version() == before {
                return;
            }
        }
    }

    /// Attaches plugins in order.
    ///
    /// Each entry succeeds or fails on its own; the report lists both.
    /// Patches a plugin requests during `init` are committed right after it
    /// attaches, before the next entry initializes.
    pub fn attach<I>(&mut self, specs: I) -> AttachReport
    where
        I: IntoIterator,
        I::Item: Into<PluginSpec>,
    {
        let mut report = AttachReport::default();
        for spec in specs {
            let spec = spec.into();
            let name = spec.name.clone();
            match self
                .host
                .attach(&self.registry, spec, self.store.state(), self.store.view())
            {
                Ok(patches) => {
                    if let Err(e) = self.commit_all(patches) {
                        warn!("init patch from '{}' rejected: {}", name, e);
                    }
                    report.attached.push(name);
                }
                Err(e) => report.failed.push(e),
            }
        }
        debug!(
            "attach: {} attached, {} failed",
            report.attached.len(),
            report.failed.len()
        );
        report
    }

    /// Detaches plugins by name, returning the names that were attached.
    pub fn detach<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter(|name| self.host.detach_one(name.as_ref()))
            .map(|name| name.as_ref().to_string())
            .collect()
    }

    /// Detaches every plugin, returning their names in attach order.
    pub fn detach_all(&mut self) -> Vec<String> {
        self.host.detach_all()
    }

    /// Returns the attached plugins in attach order.
    pub fn attached(&self) -> Vec<AttachedInfo> {
        self.host.attached()
    }

    /// Checks if a plugin is attached under `name`.
    pub fn is_attached(&self, name: &str) -> bool {
        self.host.contains(name)
    }

    /// Returns the attached plugin under `name` as its concrete type.
    pub fn plugin<P: Plugin>(&self, name: &str) -> Result<&P, GridError> {
        self.host
            .get(name)
            .ok_or_else(|| GridError::plugin_not_attached(name))?
            .as_any()
            .downcast_ref::<P>()
            .ok_or_else(|| GridError::PluginTypeMismatch {
                name: name.to_string(),
            })
    }

    /// Returns the attached plugin under `name` mutably, as its concrete type.
    pub fn plugin_mut<P: Plugin>(&mut self, name: &str) -> Result<&mut P, GridError> {
        self.host
            .get_mut(name)
            .ok_or_else(|| GridError::plugin_not_attached(name))?
            .as_any_mut()
            .downcast_mut::<P>()
            .ok_or_else(|| GridError::PluginTypeMismatch {
                name: name.to_string(),
            })
    }

    /// Runs `f` with a plugin and the committed state, without committing.
    pub fn with_plugin<P, R, F>(&mut self, name: &str, f: F) -> Result<R, GridError>
    where
        P: Plugin,
        F: FnOnce(&mut P, &GridState, &GridView) -> R,
    {
        let plugin = self
            .host
            .get_mut(name)
            .ok_or_else(|| GridError::plugin_not_attached(name))?
            .as_any_mut()
            .downcast_mut::<P>()
            .ok_or_else(|| GridError::PluginTypeMismatch {
                name: name.to_string(),
            })?;
        Ok(f(plugin, self.store.state(), self.store.view()))
    }

    /// Runs a plugin command and commits the patch it builds.
    pub fn dispatch<P, F>(&mut self, name: &str, f: F) -> Result<bool, GridError>
    where
        P: Plugin,
        F: FnOnce(&mut P, &GridState, &GridView) -> Result<StatePatch, GridError>,
    {
        let patch = self.with_plugin(name, f)??;
        self.commit(patch)
    }

    /// Returns the plugin registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Returns the plugin registry for registering custom plugins.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Wraps the grid for sharing across tasks.
    pub fn into_shared(self) -> SharedGrid {
        Arc::new(tokio::sync::Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::plugin::PluginContext;
    use crate::plugin::builtin::SortingPlugin;
    use crate::state::SortModel;

    /// Requests a quick filter equal to the first sort column, once.
    #[derive(Default)]
    struct EchoSortPlugin;

    impl Plugin for EchoSortPlugin {
        fn name(&self) -> &str {
            "echo"
        }

        fn init(&mut self, _cx: &mut PluginContext<'_>, _options: &serde_json::Value) -> Result<(), PluginError> {
            Ok(())
        }

        fn on_state_change(&mut self, cx: &mut PluginContext<'_>) {
            let wanted = cx
                .state()
                .sort
                .entries()
                .first()
                .map(|e| e.col_id.clone())
                .unwrap_or_default();
            if cx.state().quick_filter != wanted {
                cx.request(StatePatch::SetQuickFilter(wanted));
            }
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn grid() -> Grid {
        let mut grid = Grid::new(GridConfig::default());
        grid.set_columns(vec![ColumnDef::field("a"), ColumnDef::field("b")])
            .unwrap();
        grid
    }

    #[test]
    fn test_follow_up_patches_committed() {
        let mut grid = grid();
        grid.registry_mut().register("echo", || Box::new(EchoSortPlugin));
        assert!(grid.attach(["echo"]).is_complete());

        let commits = grid.subscribe();
        let before = *commits.borrow();
        grid.commit(StatePatch::SetSortModel(SortModel::asc("b"))).unwrap();
        assert_eq!(grid.state().quick_filter, "b");
        // The sort commit plus the echo follow-up.
        assert_eq!(*commits.borrow(), before + 2);
    }

    #[test]
    fn test_typed_plugin_access() {
        let mut grid = grid();
        grid.attach(["sorting"]);
        assert!(grid.plugin::<SortingPlugin>("sorting").is_ok());
        assert_eq!(
            grid.plugin::<crate::plugin::builtin::ExportPlugin>("sorting").unwrap_err(),
            GridError::PluginTypeMismatch {
                name: "sorting".into()
            }
        );
        assert_eq!(
            grid.plugin::<SortingPlugin>("export").unwrap_err(),
            GridError::plugin_not_attached("export")
        );

        grid.dispatch("sorting", |p: &mut SortingPlugin, state, _| p.toggle(state, "a", false))
            .unwrap();
        assert_eq!(grid.state().sort, SortModel::asc("a"));
    }

    #[test]
    fn test_rejected_patch_notifies_nobody() {
        let mut grid = grid();
        let commits = grid.subscribe();
        let before = *commits.borrow();
        assert!(grid.commit(StatePatch::SetColumnWidth { col_id: "zz".into(), width: 10 }).is_err());
        assert_eq!(*commits.borrow(), before);
    }

    #[test]
    fn test_detach_reports_known_names() {
        let mut grid = grid();
        grid.attach(["sorting", "export"]);
        assert_eq!(grid.detach(["export", "missing"]), vec!["export".to_string()]);
        assert_eq!(grid.detach_all(), vec!["sorting".to_string()]);
        assert!(grid.attached().is_empty());
    }
}
