//! Column resize drag sessions

use std::time::Duration;

use log::debug;
use log::trace;
use tokio::time::Instant;
use uuid::Uuid;

/// Minimum spacing between two applied width updates.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Width limits applied to every resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeBounds {
    pub min_width: u32,
    pub max_width: u32,
}

impl ResizeBounds {
    /// Creates bounds, swapping the ends if given in the wrong order.
    pub fn new(min_width: u32, max_width: u32) -> Self {
        Self {
            min_width: min_width.min(max_width),
            max_width: max_width.max(min_width),
        }
    }

    /// Clamps a computed width into the bounds.
    pub fn clamp(&self, width: f64) -> u32 {
        let width = width.round().clamp(self.min_width as f64, self.max_width as f64);
        width as u32
    }
}

impl Default for ResizeBounds {
    fn default() -> Self {
        Self {
            min_width: 40,
            max_width: 1000,
        }
    }
}

/// An active drag on one column edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    /// Unique id of this drag.
    pub id: Uuid,
    /// Column being resized.
    pub col_id: String,
    /// Pointer x at drag start.
    pub start_x: f64,
    /// Column width at drag start.
    pub start_width: u32,
    /// Last width handed out by [`ResizeSessionManager::on_frame`].
    pub width: u32,
}

/// A width to apply to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeUpdate {
    pub col_id: String,
    pub width: u32,
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Dragging(ResizeSession),
}

/// Drives the `Idle → Dragging → Idle` resize state machine.
///
/// Pointer moves only record the latest position and request a frame. The
/// caller runs [`on_frame`](Self::on_frame) on its frame clock; each frame
/// applies at most one width, and a frame arriving within
/// [`FRAME_INTERVAL`] of the previous applied update drops the pending
/// position instead of queueing it.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tablekit_lib::interaction::{ResizeBounds, ResizeSessionManager};
/// use tokio::time::Instant;
///
/// let mut resize = ResizeSessionManager::new(ResizeBounds::new(40, 400));
/// resize.start_resize("name", 100.0, 150);
/// resize.pointer_move(160.0);
///
/// let update = resize.on_frame(Instant::now()).unwrap();
/// assert_eq!(update.width, 210);
/// assert_eq!(resize.end_resize().unwrap().width, 210);
/// ```
#[derive(Debug, Default)]
pub struct ResizeSessionManager {
    bounds: ResizeBounds,
    phase: Phase,
    pending_x: Option<f64>,
    frame_requested: bool,
    last_applied: Option<Instant>,
}

impl ResizeSessionManager {
    /// Creates an idle manager.
    pub fn new(bounds: ResizeBounds) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    /// Returns the width bounds.
    pub fn bounds(&self) -> ResizeBounds {
        self.bounds
    }

    /// Replaces the width bounds for later updates.
    pub fn set_bounds(&mut self, bounds: ResizeBounds) {
        self.bounds = bounds;
    }

    /// Starts a drag, ending any active one first. Returns the session id.
    pub fn start_resize(&mut self, col_id: impl Into<String>, start_x: f64, start_width: u32) -> Uuid {
        self.end_resize();
        let session = ResizeSession {
            id: Uuid::new_v4(),
            col_id: col_id.into(),
            start_x,
            start_width,
            width: start_width,
        };
        debug!("resize: start '{}' at {} ({})", session.col_id, start_width, session.id);
        let id = session.id;
        self.phase = Phase::Dragging(session);
        id
    }

    /// Records a pointer position.
    ///
    /// Returns `true` when this call requested a new frame, `false` when a
    /// frame was already pending or no drag is active.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.pending_x = Some(x);
        if self.frame_requested {
            return false;
        }
        self.frame_requested = true;
        true
    }

    /// Runs one frame, returning the width to apply if any.
    pub fn on_frame(&mut self, now: Instant) -> Option<ResizeUpdate> {
        if !std::mem::take(&mut self.frame_requested) {
            return None;
        }
        let x = self.pending_x.take()?;
        if self
            .last_applied
            .is_some_and(|last| now.saturating_duration_since(last) < FRAME_INTERVAL)
        {
            trace!("resize: frame throttled, dropping x={}", x);
            return None;
        }

        let bounds = self.bounds;
        let Phase::Dragging(session) = &mut self.phase else {
            return None;
        };
        session.width = bounds.clamp(session.start_width as f64 + (x - session.start_x));
        self.last_applied = Some(now);
        Some(ResizeUpdate {
            col_id: session.col_id.clone(),
            width: session.width,
        })
    }

    /// Ends the drag, cancelling any pending frame.
    ///
    /// Returns the final applied width, or `None` when idle.
    pub fn end_resize(&mut self) -> Option<ResizeUpdate> {
        self.pending_x = None;
        self.frame_requested = false;
        self.last_applied = None;
        match std::mem::take(&mut self.phase) {
            Phase::Idle => None,
            Phase::Dragging(session) => {
                debug!("resize: end '{}' at {} ({})", session.col_id, session.width, session.id);
                Some(ResizeUpdate {
                    col_id: session.col_id,
                    width: session.width,
                })
            }
        }
    }

    /// Returns the active session, if any.
    pub fn session(&self) -> Option<&ResizeSession> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Dragging(session) => Some(session),
        }
    }

    /// Returns `true` while a drag is active.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    /// Returns `true` if a frame has been requested and not yet run.
    pub fn frame_pending(&self) -> bool {
        self.frame_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_width_clamped_to_bounds() {
        let mut resize = ResizeSessionManager::new(ResizeBounds::new(50, 300));
        let t0 = Instant::now();
        resize.start_resize("a", 200.0, 100);

        resize.pointer_move(0.0);
        assert_eq!(resize.on_frame(t0).unwrap().width, 50);

        resize.pointer_move(900.0);
        assert_eq!(resize.on_frame(t0 + ms(20)).unwrap().width, 300);
    }

    #[test]
    fn test_moves_coalesce_into_one_frame() {
        let mut resize = ResizeSessionManager::default();
        resize.start_resize("a", 0.0, 100);
        assert!(resize.pointer_move(10.0));
        assert!(!resize.pointer_move(20.0));
        assert!(!resize.pointer_move(30.0));

        let update = resize.on_frame(Instant::now()).unwrap();
        assert_eq!(update.width, 130);
        assert!(!resize.frame_pending());
    }

    #[test]
    fn test_frames_within_interval_are_dropped() {
        let mut resize = ResizeSessionManager::default();
        let t0 = Instant::now();
        resize.start_resize("a", 0.0, 100);

        resize.pointer_move(10.0);
        assert!(resize.on_frame(t0).is_some());

        resize.pointer_move(20.0);
        assert!(resize.on_frame(t0 + ms(8)).is_none());
        // The dropped position isn't replayed on the next frame.
        assert!(resize.on_frame(t0 + ms(40)).is_none());

        resize.pointer_move(30.0);
        assert_eq!(resize.on_frame(t0 + ms(40)).unwrap().width, 130);
    }

    #[test]
    fn test_end_cancels_pending_frame() {
        let mut resize = ResizeSessionManager::default();
        resize.start_resize("a", 0.0, 100);
        resize.pointer_move(10.0);
        resize.on_frame(Instant::now());
        resize.pointer_move(50.0);

        let last = resize.end_resize().unwrap();
        assert_eq!(last.width, 110);
        assert!(!resize.is_dragging());
        assert!(resize.on_frame(Instant::now()).is_none());
        assert!(!resize.pointer_move(60.0));
        assert!(resize.end_resize().is_none());
    }

    #[test]
    fn test_new_session_replaces_active() {
        let mut resize = ResizeSessionManager::default();
        let first = resize.start_resize("a", 0.0, 100);
        resize.pointer_move(10.0);
        let second = resize.start_resize("b", 0.0, 200);
        assert_ne!(first, second);
        assert_eq!(resize.session().unwrap().col_id, "b");
        assert!(!resize.frame_pending());
    }
}
