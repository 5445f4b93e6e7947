//! Relational mirror of the grid data
//!
//! Rows and columns are copied into an in-memory SQLite table so that a query
//! collaborator can run read-only SQL over the grid. The mirror is rebuilt in
//! full on every sync.

mod config;
mod result;
mod schema;
mod sqlite;

pub use config::*;
pub use result::*;
pub use schema::*;
pub use sqlite::*;
