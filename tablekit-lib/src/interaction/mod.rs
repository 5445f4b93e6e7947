//! Short-lived pointer interaction sessions

mod resize;

pub use resize::*;
