//! Tick planning: which rows change and how

use log::trace;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::model::Row;
use crate::model::Value;
use crate::state::CellUpdate;

use super::LiveMutationConfig;
use super::MutationMode;

/// Largest relative change applied to a value in one tick (±5%).
const JITTER: f64 = 0.10;

/// Cell updates for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickPlan {
    /// Raw row indices picked, in pick order. May repeat in random mode.
    pub indices: Vec<usize>,
    pub updates: Vec<CellUpdate>,
}

/// Picks rows and perturbs their numeric fields.
///
/// Seeded generators produce the same picks and values for the same inputs.
#[derive(Debug)]
pub struct TickGenerator {
    rng: StdRng,
    cursor: usize,
}

impl TickGenerator {
    /// Creates a generator, seeded for reproducible runs when `seed` is set.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, cursor: 0 }
    }

    /// Picks `count` row indices out of `len` rows.
    ///
    /// Returns nothing when there are no rows. Windows wrap around the end.
    pub fn select_indices(&mut self, mode: MutationMode, count: usize, len: usize) -> Vec<usize> {
        if len == 0 || count == 0 {
            return Vec::new();
        }
        match mode {
            MutationMode::Random => (0..count).map(|_| self.rng.random_range(0..len)).collect(),
            MutationMode::Sequential => {
                let start = self.cursor % len;
                self.cursor = (start + count) % len;
                window(start, count, len)
            }
            MutationMode::Batch => {
                let start = self.rng.random_range(0..len);
                window(start, count, len)
            }
        }
    }

    /// Nudges a numeric value by up to ±5%, never below zero.
    ///
    /// Integers stay integers. Returns `None` for non-numeric values.
    pub fn perturb(&mut self, value: &Value) -> Option<Value> {
        let r: f64 = self.rng.random();
        let jitter = |v: f64| (v + (r - 0.5) * v * JITTER).max(0.0);
        match value {
            Value::Int(v) => Some(Value::Int(jitter(*v as f64).round() as i64)),
            Value::Float(v) => Some(Value::Float(jitter(*v))),
            _ => None,
        }
    }

    /// Plans one tick against `rows`.
    pub fn plan(&mut self, config: &LiveMutationConfig, rows: &[Row]) -> TickPlan {
        let indices = self.select_indices(config.mode, config.rows_per_tick, rows.len());
        let mut updates = Vec::with_capacity(indices.len() * config.update_fields.len());
        for &index in &indices {
            for field in &config.update_fields {
                if let Some(value) = self.perturb(rows[index].value(field)) {
                    updates.push(CellUpdate::at(index, field.as_str(), value));
                }
            }
        }
        trace!("tick plan: {} rows, {} cells", indices.len(), updates.len());
        TickPlan { indices, updates }
    }
}

fn window(start: usize, count: usize, len: usize) -> Vec<usize> {
    (0..count).map(|i| (start + i) % len).collect()
}
