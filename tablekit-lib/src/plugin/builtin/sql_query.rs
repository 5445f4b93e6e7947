//! SQL access to the grid through the relational mirror

use std::future::Future;
use std::sync::Arc;

use log::debug;
use log::warn;
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::MirrorError;
use crate::error::PluginError;
use crate::mirror::DEFAULT_TABLE_NAME;
use crate::mirror::MirrorConfig;
use crate::mirror::MirrorSynchronizer;
use crate::mirror::QueryResult;
use crate::mirror::SchemaColumn;
use crate::model::ColumnDef;
use crate::model::Row;
use crate::plugin::Plugin;
use crate::plugin::PluginContext;
use crate::plugin::parse_options;
use crate::state::GridState;

use super::SQL_QUERY;

/// Options for [`SqlQueryPlugin`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SqlQueryOptions {
    /// Name of the mirrored table.
    pub table_name: String,
    /// Re-mirror in the background whenever rows or columns change.
    pub auto_sync: bool,
}

impl Default for SqlQueryOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            auto_sync: true,
        }
    }
}

/// Rows and columns captured at one data revision.
#[derive(Debug, Clone)]
pub struct MirrorSnapshot {
    pub revision: u64,
    pub rows: Vec<Row>,
    pub columns: Vec<ColumnDef>,
}

impl MirrorSnapshot {
    fn capture(state: &GridState) -> Self {
        Self {
            revision: state.data_revision,
            rows: state.rows.clone(),
            columns: state.columns.clone(),
        }
    }
}

type SnapshotSender = watch::Sender<Option<Arc<MirrorSnapshot>>>;

/// Keeps a [`MirrorSynchronizer`] in step with the grid data.
///
/// With `auto_sync`, each data change publishes a snapshot to a background
/// task that re-mirrors it. Publishing is latest-wins: snapshots that arrive
/// while a sync is running replace each other and only the newest is
/// mirrored next. Auto sync needs a Tokio runtime at attach time; without
/// one, call [`sync_now`](Self::sync_now) explicitly.
#[derive(Debug)]
pub struct SqlQueryPlugin {
    options: SqlQueryOptions,
    mirror: Arc<MirrorSynchronizer>,
    snapshots: Option<SnapshotSender>,
    synced: watch::Sender<Option<u64>>,
    published: Option<u64>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Default for SqlQueryPlugin {
    fn default() -> Self {
        Self {
            options: SqlQueryOptions::default(),
            mirror: Arc::new(MirrorSynchronizer::default()),
            snapshots: None,
            synced: watch::Sender::new(None),
            published: None,
            cancel: CancellationToken::new(),
            task: None,
        }
    }
}

impl SqlQueryPlugin {
    /// Returns the active options.
    pub fn options(&self) -> &SqlQueryOptions {
        &self.options
    }

    /// Returns the mirror.
    pub fn mirror(&self) -> Arc<MirrorSynchronizer> {
        Arc::clone(&self.mirror)
    }

    /// Returns `true` while the background sync task is running.
    pub fn is_auto_syncing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Watches the data revision of the last completed background sync.
    pub fn synced_revision(&self) -> watch::Receiver<Option<u64>> {
        self.synced.subscribe()
    }

    /// Mirrors `state` immediately.
    ///
    /// The returned future owns its data, so it can be awaited after the grid
    /// lock is released.
    pub fn sync_now(&self, state: &GridState) -> impl Future<Output = Result<usize, MirrorError>> + Send + 'static {
        let mirror = self.mirror();
        let snapshot = MirrorSnapshot::capture(state);
        let synced = self.synced.clone();
        async move {
            let count = mirror.sync_data(&snapshot.rows, &snapshot.columns).await?;
            synced.send_replace(Some(snapshot.revision));
            Ok(count)
        }
    }

    /// Runs a read-only query against the mirror.
    pub fn execute_query(&self, sql: impl Into<String>) -> impl Future<Output = QueryResult> + Send + 'static {
        let mirror = self.mirror();
        let sql = sql.into();
        async move { mirror.execute_query(&sql).await }
    }

    /// Returns the mirror table schema.
    pub fn schema(&self) -> impl Future<Output = Vec<SchemaColumn>> + Send + 'static {
        let mirror = self.mirror();
        async move { mirror.get_schema().await }
    }

    /// Suggests queries for the mirrored table.
    pub fn sample_queries(&self) -> Vec<String> {
        self.mirror.sample_queries()
    }

    fn publish(&mut self, state: &GridState) {
        let Some(sender) = &self.snapshots else {
            return;
        };
        if self.published == Some(state.data_revision) {
            return;
        }
        self.published = Some(state.data_revision);
        sender.send_replace(Some(Arc::new(MirrorSnapshot::capture(state))));
    }

    fn spawn_sync_task(&mut self, handle: &Handle) {
        let (tx, mut rx) = watch::channel::<Option<Arc<MirrorSnapshot>>>(None);
        let mirror = self.mirror();
        let synced = self.synced.clone();
        let cancel = self.cancel.clone();

        self.task = Some(handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        let Some(snapshot) = snapshot else {
                            continue;
                        };
                        match mirror.sync_data(&snapshot.rows, &snapshot.columns).await {
                            Ok(_) => {
                                synced.send_replace(Some(snapshot.revision));
                            }
                            Err(e) => warn!("sql_query: background sync failed: {}", e),
                        }
                    }
                }
            }
            debug!("sql_query: sync task stopped");
        }));
        self.snapshots = Some(tx);
    }
}

impl Plugin for SqlQueryPlugin {
    fn name(&self) -> &str {
        SQL_QUERY
    }

    fn init(
        &mut self,
        cx: &mut PluginContext<'_>,
        options: &serde_json::Value,
    ) -> Result<(), PluginError> {
        let options: SqlQueryOptions = parse_options(SQL_QUERY, options)?;
        if options.table_name.trim().is_empty() {
            return Err(PluginError::config(SQL_QUERY, "tableName must not be empty"));
        }
        self.mirror = Arc::new(MirrorSynchronizer::new(
            MirrorConfig::default().with_table_name(options.table_name.clone()),
        ));

        if options.auto_sync {
            match Handle::try_current() {
                Ok(handle) => {
                    self.spawn_sync_task(&handle);
                    self.publish(cx.state());
                }
                Err(_) => debug!("sql_query: no runtime, auto sync disabled"),
            }
        }
        self.options = options;
        Ok(())
    }

    fn destroy(&mut self) {
        self.cancel.cancel();
        self.snapshots = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn on_state_change(&mut self, cx: &mut PluginContext<'_>) {
        self.publish(cx.state());
    }

    impl_plugin_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::model::Value;
    use crate::state::StatePatch;
    use crate::state::StateStore;

    fn store() -> StateStore {
        let mut store = StateStore::new(&GridConfig::default());
        store
            .apply_all([
                StatePatch::SetColumns(vec![ColumnDef::field("id"), ColumnDef::field("city")]),
                StatePatch::SetRows(vec![
                    Row::new().set("id", 1).set("city", "Oslo"),
                    Row::new().set("id", 2).set("city", "Lima"),
                ]),
            ])
            .unwrap();
        store
    }

    fn init(plugin: &mut SqlQueryPlugin, store: &StateStore, options: serde_json::Value) {
        let mut cx = PluginContext::new(store.state(), store.view());
        plugin.init(&mut cx, &options).unwrap();
    }

    #[test]
    fn test_without_runtime_auto_sync_is_off() {
        let store = store();
        let mut plugin = SqlQueryPlugin::default();
        init(&mut plugin, &store, serde_json::Value::Null);
        assert!(!plugin.is_auto_syncing());
        plugin.destroy();
    }

    #[tokio::test]
    async fn test_sync_now_and_query() {
        let store = store();
        let mut plugin = SqlQueryPlugin::default();
        init(&mut plugin, &store, serde_json::json!({"tableName": "cities", "autoSync": false}));

        assert_eq!(plugin.sync_now(store.state()).await.unwrap(), 2);
        let result = plugin
            .execute_query("SELECT city FROM cities ORDER BY city")
            .await;
        assert_eq!(
            result.values,
            vec![vec![Value::from("Lima")], vec![Value::from("Oslo")]]
        );
        plugin.destroy();
    }

    #[tokio::test]
    async fn test_background_sync_follows_data_changes() {
        let mut store = store();
        let mut plugin = SqlQueryPlugin::default();
        init(&mut plugin, &store, serde_json::Value::Null);
        assert!(plugin.is_auto_syncing());

        let mut synced = plugin.synced_revision();
        let revision = store.state().data_revision;
        synced.wait_for(|r| *r == Some(revision)).await.unwrap();

        store
            .apply(StatePatch::UpsertRows(vec![Row::new().set("id", 3).set("city", "Pune")]))
            .unwrap();
        let mut cx = PluginContext::new(store.state(), store.view());
        plugin.on_state_change(&mut cx);

        let revision = store.state().data_revision;
        synced.wait_for(|r| *r == Some(revision)).await.unwrap();
        let result = plugin.execute_query("SELECT COUNT(*) FROM grid_data").await;
        assert_eq!(result.values, vec![vec![Value::Int(3)]]);

        plugin.destroy();
        assert!(plugin.task.is_none());
    }
}
