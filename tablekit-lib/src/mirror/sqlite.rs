//! SQLite-backed mirror synchronizer

use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::rusqlite;
use log::debug;
use log::trace;
use log::warn;
use tokio::sync::Mutex;
use tokio::sync::OnceCell;

use crate::error::MirrorError;
use crate::model::ColumnDef;
use crate::model::Row;
use crate::model::Value;

use super::MirrorColumn;
use super::MirrorConfig;
use super::QueryResult;
use super::SchemaColumn;
use super::SqlType;
use super::create_table_sql;
use super::from_sql;
use super::insert_sql;
use super::mirror_columns;
use super::quote_ident;
use super::to_sql;

/// SQLite's default cap on bind parameters per statement.
const MAX_BIND_PARAMS: usize = 32_766;

/// Mirrors grid rows into an in-memory SQLite table.
///
/// The engine opens lazily on the first [`sync_data`](Self::sync_data). Each
/// sync drops and recreates the table inside one transaction, so queries see
/// either the previous snapshot or the new one.
///
/// # Example
///
/// ```
/// use tablekit_lib::mirror::MirrorSynchronizer;
/// use tablekit_lib::model::{ColumnDef, Row};
///
/// # tokio_test_block_on(async {
/// let mirror = MirrorSynchronizer::default();
/// let rows = vec![Row::new().set("id", 1).set("name", "Ada")];
/// let columns = vec![ColumnDef::field("id"), ColumnDef::field("name")];
/// mirror.sync_data(&rows, &columns).await.unwrap();
///
/// let result = mirror.execute_query("SELECT name FROM grid_data").await;
/// assert_eq!(result.row_count, 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
pub struct MirrorSynchronizer {
    config: MirrorConfig,
    client: OnceCell<Client>,
    columns: RwLock<Vec<MirrorColumn>>,
    synced: AtomicBool,
    sync_lock: Mutex<()>,
}

impl MirrorSynchronizer {
    /// Creates a synchronizer. No engine is opened until the first sync.
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
            columns: RwLock::new(Vec::new()),
            synced: AtomicBool::new(false),
            sync_lock: Mutex::new(()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Returns the mirrored table name.
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Returns `true` once a sync has completed.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// Returns the columns mirrored by the last sync.
    pub fn columns(&self) -> Vec<MirrorColumn> {
        self.columns.read().map(|c| c.clone()).unwrap_or_default()
    }

    async fn client(&self) -> Result<&Client, MirrorError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                debug!("mirror: opening in-memory engine");
                ClientBuilder::new().path(":memory:").open().await
            })
            .await?;
        Ok(client)
    }

    /// Rebuilds the mirror table from `rows` and `columns`.
    ///
    /// Returns the number of rows written.
    pub async fn sync_data(&self, rows: &[Row], columns: &[ColumnDef]) -> Result<usize, MirrorError> {
        let _guard = self.sync_lock.lock().await;
        let client = self.client().await?;
        let started = Instant::now();

        let mirrored = mirror_columns(columns, rows);
        let table = self.config.table_name.clone();
        let drop_sql = format!("DROP TABLE IF EXISTS {}", quote_ident(&table));
        let create_sql = (!mirrored.is_empty()).then(|| create_table_sql(&table, &mirrored));

        let records: Vec<Vec<rusqlite::types::Value>> = if mirrored.is_empty() {
            Vec::new()
        } else {
            rows.iter().map(|row| record(row, &mirrored)).collect()
        };
        let row_count = records.len();
        let batch_size = self
            .config
            .batch_size
            .min(MAX_BIND_PARAMS / mirrored.len().max(1))
            .max(1);
        let insert_columns = mirrored.clone();

        client
            .conn_mut(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(&drop_sql, [])?;
                if let Some(create_sql) = &create_sql {
                    tx.execute(create_sql, [])?;
                    for batch in records.chunks(batch_size) {
                        let sql = insert_sql(&table, &insert_columns, batch.len());
                        tx.execute(&sql, rusqlite::params_from_iter(batch.iter().flatten()))?;
                    }
                }
                tx.commit()
            })
            .await?;

        if let Ok(mut columns) = self.columns.write() {
            *columns = mirrored;
        }
        self.synced.store(true, Ordering::Release);
        debug!(
            "mirror: synced {} rows into '{}' in {:.2}ms",
            row_count,
            self.config.table_name,
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(row_count)
    }

    /// Runs a read-only query against the mirror.
    ///
    /// Never fails: errors, including running before the first sync and
    /// statements that would write, come back in [`QueryResult::error`].
    pub async fn execute_query(&self, sql: &str) -> QueryResult {
        let started = Instant::now();
        match self.run_query(sql).await {
            Ok((columns, values)) => {
                let elapsed = elapsed_ms(started);
                trace!("mirror: query returned {} rows in {:.2}ms", values.len(), elapsed);
                QueryResult::success(columns, values, elapsed)
            }
            Err(e) => {
                warn!("mirror: query failed: {}", e);
                QueryResult::failed(e.to_string(), elapsed_ms(started))
            }
        }
    }

    async fn run_query(&self, sql: &str) -> Result<(Vec<String>, Vec<Vec<Value>>), MirrorError> {
        let sql = sql.trim().to_string();
        if sql.is_empty() {
            return Err(MirrorError::EmptyQuery);
        }
        let client = match self.client.get() {
            Some(client) if self.is_synced() => client,
            _ => return Err(MirrorError::SyncNotReady),
        };

        let output = client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                if !stmt.readonly() {
                    return Ok(None);
                }
                let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
                let width = columns.len();
                let mut values = Vec::new();
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let mut record = Vec::with_capacity(width);
                    for i in 0..width {
                        record.push(from_sql(row.get_ref(i)?));
                    }
                    values.push(record);
                }
                Ok(Some((columns, values)))
            })
            .await?;

        output.ok_or(MirrorError::NotReadOnly)
    }

    /// Returns the columns of the mirror table as SQLite reports them.
    ///
    /// Empty before the first sync or when nothing is mirrored.
    pub async fn get_schema(&self) -> Vec<SchemaColumn> {
        let Some(client) = self.client.get() else {
            return Vec::new();
        };
        let pragma = format!("PRAGMA table_info({})", quote_ident(&self.config.table_name));
        let result = client
            .conn(move |conn| {
                let mut stmt = conn.prepare(&pragma)?;
                let rows = stmt.query_map([], |row| {
                    Ok(SchemaColumn {
                        name: row.get(1)?,
                        sql_type: row.get(2)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await;

        match result {
            Ok(schema) => schema,
            Err(e) => {
                warn!("mirror: schema lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Suggests queries for the mirrored table.
    pub fn sample_queries(&self) -> Vec<String> {
        let table = quote_ident(&self.config.table_name);
        let columns = self.columns();
        let mut queries = vec![
            format!("SELECT * FROM {} LIMIT 10", table),
            format!("SELECT COUNT(*) AS row_count FROM {}", table),
        ];

        let numeric = columns
            .iter()
            .find(|c| matches!(c.sql_type, SqlType::Integer | SqlType::Real));
        let text = columns.iter().find(|c| c.sql_type == SqlType::Text);

        if let Some(numeric) = numeric {
            let col = quote_ident(&numeric.name);
            queries.push(format!(
                "SELECT AVG({col}) AS avg, MIN({col}) AS min, MAX({col}) AS max FROM {table}"
            ));
            queries.push(format!("SELECT * FROM {table} ORDER BY {col} DESC LIMIT 10"));
        }
        if let Some(text) = text {
            let col = quote_ident(&text.name);
            queries.push(format!(
                "SELECT {col}, COUNT(*) AS count FROM {table} GROUP BY {col} ORDER BY count DESC LIMIT 10"
            ));
        }
        if let (Some(numeric), Some(text)) = (numeric, text) {
            queries.push(format!(
                "SELECT {t}, AVG({n}) AS avg FROM {table} GROUP BY {t} ORDER BY avg DESC",
                t = quote_ident(&text.name),
                n = quote_ident(&numeric.name),
            ));
        }
        queries
    }
}

impl Default for MirrorSynchronizer {
    fn default() -> Self {
        Self::new(MirrorConfig::default())
    }
}

impl std::fmt::Debug for MirrorSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorSynchronizer")
            .field("config", &self.config)
            .field("synced", &self.is_synced())
            .finish()
    }
}

fn record(row: &Row, columns: &[MirrorColumn]) -> Vec<rusqlite::types::Value> {
    columns
        .iter()
        .map(|c| to_sql(row.value(&c.name), c.sql_type))
        .collect()
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> (Vec<Row>, Vec<ColumnDef>) {
        let rows = vec![
            Row::new().set("id", 1).set("name", "Ada").set("salary", 120_000.0).set("active", true),
            Row::new().set("id", 2).set("name", "Brian").set("salary", 95_500.5).set("active", false),
            Row::new().set("id", 3).set("name", "Chen"),
        ];
        let columns = vec![
            ColumnDef::field("id"),
            ColumnDef::field("name"),
            ColumnDef::field("salary"),
            ColumnDef::field("active"),
            ColumnDef::field("ssn").with_hidden(true),
        ];
        (rows, columns)
    }

    #[tokio::test]
    async fn test_query_before_sync_is_structured_error() {
        let mirror = MirrorSynchronizer::default();
        let result = mirror.execute_query("SELECT 1").await;
        assert_eq!(result.error.as_deref(), Some("Mirror not initialized: call sync_data first"));
        assert!(mirror.get_schema().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_and_query() {
        let mirror = MirrorSynchronizer::default();
        let (rows, columns) = staff();
        assert_eq!(mirror.sync_data(&rows, &columns).await.unwrap(), 3);

        let result = mirror
            .execute_query("SELECT name, active FROM grid_data WHERE salary > 100000")
            .await;
        assert!(result.is_ok(), "{:?}", result.error);
        assert_eq!(result.columns, vec!["name", "active"]);
        assert_eq!(result.values, vec![vec![Value::from("Ada"), Value::Int(1)]]);

        let schema = mirror.get_schema().await;
        let names: Vec<&str> = schema.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "salary", "active"]);
        assert_eq!(schema[2].sql_type, "INTEGER");
    }

    #[tokio::test]
    async fn test_resync_replaces_table() {
        let mirror = MirrorSynchronizer::new(MirrorConfig::default().with_batch_size(2));
        let (rows, columns) = staff();
        mirror.sync_data(&rows, &columns).await.unwrap();
        mirror.sync_data(&rows[..1], &columns).await.unwrap();

        let result = mirror.execute_query("SELECT COUNT(*) FROM grid_data").await;
        assert_eq!(result.values, vec![vec![Value::Int(1)]]);
    }

    #[tokio::test]
    async fn test_write_statements_rejected() {
        let mirror = MirrorSynchronizer::default();
        let (rows, columns) = staff();
        mirror.sync_data(&rows, &columns).await.unwrap();

        let result = mirror.execute_query("DELETE FROM grid_data").await;
        assert_eq!(result.error.as_deref(), Some("Only read-only statements can run against the mirror"));
        let count = mirror.execute_query("SELECT COUNT(*) FROM grid_data").await;
        assert_eq!(count.values, vec![vec![Value::Int(3)]]);

        let result = mirror.execute_query("   ").await;
        assert_eq!(result.error.as_deref(), Some("Query is empty"));
    }

    #[tokio::test]
    async fn test_sample_queries_follow_columns() {
        let mirror = MirrorSynchronizer::default();
        assert_eq!(mirror.sample_queries().len(), 2);

        let (rows, columns) = staff();
        mirror.sync_data(&rows, &columns).await.unwrap();
        let queries = mirror.sample_queries();
        assert!(queries.iter().any(|q| q.contains("AVG(\"id\")")));
        assert!(queries.iter().any(|q| q.contains("GROUP BY \"name\"")));
        for query in queries {
            let result = mirror.execute_query(&query).await;
            assert!(result.is_ok(), "{}: {:?}", query, result.error);
        }
    }
}
