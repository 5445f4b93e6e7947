//! Timer-driven mutation engine

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::trace;
use log::warn;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::Interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::GridError;
use crate::grid::SharedGrid;
use crate::model::Row;
use crate::state::CellUpdate;
use crate::state::StatePatch;

use super::LiveMutationConfig;
use super::MetricsRecorder;
use super::PerformanceMetrics;
use super::TickGenerator;

/// Builds one tick's cell updates from the current rows.
pub type TickPlanner<'a> = &'a mut (dyn FnMut(&[Row]) -> Vec<CellUpdate> + Send);

/// Where the engine commits its updates.
///
/// Implementations must plan and commit under one lock so a tick sees and
/// writes one consistent state, and must check `cancel` after acquiring that
/// lock.
#[async_trait]
pub trait MutationSink: Send + Sync + 'static {
    /// Plans a tick against the current rows and commits it.
    ///
    /// Returns `Ok(false)` without planning if `cancel` fired first.
    async fn apply_tick(
        &self,
        cancel: &CancellationToken,
        plan: TickPlanner<'_>,
    ) -> Result<bool, GridError>;
}

#[async_trait]
impl MutationSink for SharedGrid {
    async fn apply_tick(
        &self,
        cancel: &CancellationToken,
        plan: TickPlanner<'_>,
    ) -> Result<bool, GridError> {
        let mut grid = self.lock().await;
        if cancel.is_cancelled() {
            return Ok(false);
        }
        let updates = plan(&grid.state().rows);
        if !updates.is_empty() {
            grid.commit(StatePatch::UpdateCells(updates))?;
        }
        Ok(true)
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs synthetic mutations against a [`MutationSink`] on a timer.
///
/// The engine is either stopped or running one timer task. The first tick
/// fires one interval after [`start`](Self::start). Config updates reach the
/// running task immediately: a new interval reschedules the timer, other
/// fields apply from the next tick.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tablekit_lib::{Grid, GridConfig};
/// use tablekit_lib::live::{LiveMutationConfig, LiveMutationEngine};
///
/// # async fn demo() {
/// let grid = Grid::new(GridConfig::default()).into_shared();
/// let mut engine = LiveMutationEngine::new(
///     grid,
///     LiveMutationConfig::default().with_update_fields(["price"]),
/// );
/// engine.start();
/// tokio::time::sleep(Duration::from_secs(1)).await;
/// engine.stop().await;
/// println!("{:?}", engine.metrics());
/// # }
/// ```
pub struct LiveMutationEngine<S: MutationSink> {
    sink: Arc<S>,
    config: watch::Sender<LiveMutationConfig>,
    recorder: Arc<Mutex<MetricsRecorder>>,
    running: Option<RunningTask>,
}

impl<S: MutationSink> LiveMutationEngine<S> {
    /// Creates a stopped engine.
    pub fn new(sink: S, config: LiveMutationConfig) -> Self {
        Self {
            sink: Arc::new(sink),
            config: watch::Sender::new(config),
            recorder: Arc::new(Mutex::new(MetricsRecorder::default())),
            running: None,
        }
    }

    /// Starts the timer task.
    ///
    /// Returns `false` if already running or if called outside a Tokio
    /// runtime.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("live: start called outside a Tokio runtime");
                return false;
            }
        };

        let cancel = CancellationToken::new();
        let task = run(
            Arc::clone(&self.sink),
            self.config.subscribe(),
            Arc::clone(&self.recorder),
            cancel.clone(),
        );
        debug!("live: started");
        self.running = Some(RunningTask {
            cancel,
            handle: handle.spawn(task),
        });
        true
    }

    /// Stops the timer task and waits for it to wind down.
    ///
    /// Once this returns no further tick commits, including one that was
    /// waiting on the sink's lock when `stop` was called.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };
        running.cancel.cancel();
        running.handle.abort();
        // Cancelled or aborted; either way the task is done.
        let _ = running.handle.await;
        debug!("live: stopped");
        true
    }

    /// Starts if stopped, stops if running. Returns `true` if now running.
    pub async fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop().await;
            false
        } else {
            self.start()
        }
    }

    /// Returns `true` while the timer task is active.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Replaces the configuration, rescheduling the timer if the interval
    /// changed.
    pub fn update_config(&self, config: LiveMutationConfig) {
        self.config.send_replace(config);
    }

    /// Returns the current configuration.
    pub fn config(&self) -> LiveMutationConfig {
        self.config.borrow().clone()
    }

    /// Returns the metrics so far.
    pub fn metrics(&self) -> PerformanceMetrics {
        self.recorder
            .lock()
            .map(|r| r.snapshot())
            .unwrap_or_default()
    }

    /// Clears the metrics.
    pub fn reset_metrics(&self) {
        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.reset();
        }
    }

    /// Returns the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: MutationSink> Drop for LiveMutationEngine<S> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.handle.abort();
        }
    }
}

impl<S: MutationSink> std::fmt::Debug for LiveMutationEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMutationEngine")
            .field("config", &*self.config.borrow())
            .field("running", &self.is_running())
            .field("metrics", &self.metrics())
            .finish()
    }
}

fn timer(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run<S: MutationSink>(
    sink: Arc<S>,
    mut config: watch::Receiver<LiveMutationConfig>,
    recorder: Arc<Mutex<MetricsRecorder>>,
    cancel: CancellationToken,
) {
    let (mut period, seed) = {
        let current = config.borrow_and_update();
        (current.effective_interval(), current.seed)
    };
    let mut generator = TickGenerator::new(seed);
    let mut interval = timer(period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = config.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = config.borrow_and_update().effective_interval();
                if next != period {
                    debug!("live: interval {:?} -> {:?}", period, next);
                    period = next;
                    interval = timer(period);
                }
            }
            _ = interval.tick() => {
                let current = config.borrow().clone();
                let started = std::time::Instant::now();
                let mut planner = |rows: &[Row]| generator.plan(&current, rows).updates;

                match sink.apply_tick(&cancel, &mut planner).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => warn!("live: tick rejected: {}", e),
                }

                let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                // Rows attempted, so duplicate picks and empty grids still count.
                if let Ok(mut recorder) = recorder.lock() {
                    recorder.record(elapsed, current.rows_per_tick);
                }
                trace!("live: tick over {} rows in {:.3}ms", current.rows_per_tick, elapsed);
            }
        }
    }
    debug!("live: timer task exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid;
    use crate::GridConfig;
    use crate::model::Value;

    fn shared_grid(rows: usize) -> SharedGrid {
        let mut grid = Grid::new(GridConfig::default());
        grid.set_rows((0..rows).map(|i| Row::new().set("id", i as i64).set("price", 100.0)).collect())
            .unwrap();
        grid.into_shared()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let grid = shared_grid(100);
        let config = LiveMutationConfig::default()
            .with_interval(Duration::from_millis(50))
            .with_rows_per_tick(10)
            .with_mode(crate::live::MutationMode::Sequential)
            .with_update_fields(["price"])
            .with_seed(5);
        let mut engine = LiveMutationEngine::new(grid.clone(), config);
        assert!(engine.start());
        assert!(!engine.start());

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert!(engine.stop().await);

        let metrics = engine.metrics();
        assert_eq!(metrics.total_ticks, 3);
        assert_eq!(metrics.total_rows_mutated, 30);

        let grid = grid.lock().await;
        for (i, row) in grid.state().rows.iter().enumerate() {
            let Value::Float(price) = row.value("price") else {
                panic!("price is not a float");
            };
            if i < 30 {
                assert!((95.0..=105.0).contains(price), "row {} price {}", i, price);
            } else {
                assert_eq!(*price, 100.0);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let grid = shared_grid(10);
        let mut engine = LiveMutationEngine::new(
            grid.clone(),
            LiveMutationConfig::default().with_interval(Duration::from_millis(10)),
        );
        engine.start();

        // Hold the lock across a due tick, then stop while it waits.
        let guard = grid.lock().await;
        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(engine.stop().await);
        drop(guard);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(engine.metrics().total_ticks, 0);
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_reschedules() {
        let grid = shared_grid(5);
        let mut engine = LiveMutationEngine::new(
            grid,
            LiveMutationConfig::default().with_interval(Duration::from_secs(10)),
        );
        engine.start();
        tokio::time::sleep(Duration::from_millis(5)).await;

        engine.update_config(engine.config().with_interval(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.metrics().total_ticks, 2);

        assert!(!engine.toggle().await);
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_grid_still_counts_ticks() {
        let grid = shared_grid(0);
        let mut engine = LiveMutationEngine::new(
            grid.clone(),
            LiveMutationConfig::default()
                .with_interval(Duration::from_millis(10))
                .with_rows_per_tick(7)
                .with_update_fields(["price"]),
        );
        engine.start();
        tokio::time::sleep(Duration::from_millis(35)).await;
        engine.stop().await;

        let metrics = engine.metrics();
        assert_eq!(metrics.total_ticks, 3);
        assert_eq!(metrics.total_rows_mutated, 21);
        assert!(grid.lock().await.state().rows.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_duplicates_count_as_attempted() {
        let grid = shared_grid(2);
        let mut engine = LiveMutationEngine::new(
            grid,
            LiveMutationConfig::default()
                .with_interval(Duration::from_millis(10))
                .with_rows_per_tick(5)
                .with_update_fields(["price"])
                .with_seed(9),
        );
        engine.start();
        tokio::time::sleep(Duration::from_millis(25)).await;
        engine.stop().await;
        assert_eq!(engine.metrics().total_rows_mutated, 10);
    }
}
