//! Relational mirror error types

/// Errors from the relational mirror.
///
/// `sync_data` returns these directly. `execute_query` never fails; it
/// renders them into `QueryResult::error` instead.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The embedded SQLite engine failed.
    #[error("SQLite error: {0}")]
    Engine(#[from] async_sqlite::Error),

    /// A query ran before the first successful sync.
    #[error("Mirror not initialized: call sync_data first")]
    SyncNotReady,

    /// The query text was blank.
    #[error("Query is empty")]
    EmptyQuery,

    /// The statement would modify the database.
    #[error("Only read-only statements can run against the mirror")]
    NotReadOnly,
}
