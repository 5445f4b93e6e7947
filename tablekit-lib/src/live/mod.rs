//! Live-mutation tick engine
//!
//! Simulates a streaming feed by perturbing numeric cells on a timer and
//! tracks how long each tick takes.

mod config;
mod engine;
mod generator;
mod metrics;

pub use config::*;
pub use engine::*;
pub use generator::*;
pub use metrics::*;
