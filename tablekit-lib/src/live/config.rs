//! Live-mutation configuration

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Shortest allowed tick interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How rows are picked on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMode {
    /// Independent uniform picks; the same row may be picked twice.
    #[default]
    Random,
    /// A contiguous window that continues where the previous tick stopped.
    Sequential,
    /// A contiguous window starting at a random row.
    Batch,
}

impl std::str::FromStr for MutationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            "batch" => Ok(Self::Batch),
            other => Err(format!("unknown mutation mode '{}'", other)),
        }
    }
}

/// Configuration for the [`LiveMutationEngine`](super::LiveMutationEngine).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tablekit_lib::live::{LiveMutationConfig, MutationMode};
///
/// let config = LiveMutationConfig::default()
///     .with_interval(Duration::from_millis(50))
///     .with_rows_per_tick(25)
///     .with_mode(MutationMode::Batch)
///     .with_update_fields(["price", "volume"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMutationConfig {
    /// Time between ticks.
    ///
    /// Default: 100ms
    pub interval: Duration,

    /// Rows picked per tick.
    ///
    /// Default: 10
    pub rows_per_tick: usize,

    /// Row picking strategy.
    pub mode: MutationMode,

    /// Numeric fields perturbed on each picked row. Other fields and
    /// non-numeric values are left alone.
    pub update_fields: Vec<String>,

    /// Seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for LiveMutationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            rows_per_tick: 10,
            mode: MutationMode::Random,
            update_fields: Vec::new(),
            seed: None,
        }
    }
}

impl LiveMutationConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick interval (at least [`MIN_INTERVAL`]).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Sets the rows picked per tick.
    pub fn with_rows_per_tick(mut self, rows_per_tick: usize) -> Self {
        self.rows_per_tick = rows_per_tick;
        self
    }

    /// Sets the row picking strategy.
    pub fn with_mode(mut self, mode: MutationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the perturbed fields.
    pub fn with_update_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_INTERVAL)
    }
}
