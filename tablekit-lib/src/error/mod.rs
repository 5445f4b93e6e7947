//! Error types

mod grid;
mod mirror;
mod plugin;

pub use grid::*;
pub use mirror::*;
pub use plugin::*;
