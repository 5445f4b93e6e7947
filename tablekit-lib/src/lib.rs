//! Embeddable tabular grid engine
//!
//! Owns row and column state, derives the visible window through a
//! sort → filter → paginate pipeline, composes feature plugins over the
//! state, mirrors the data into SQLite for ad-hoc queries and drives
//! synthetic live updates.

pub mod error;
pub mod interaction;
pub mod live;
pub mod mirror;
pub mod model;
pub mod pipeline;
pub mod plugin;
pub mod state;

mod config;
mod grid;

pub use config::*;
pub use grid::*;
