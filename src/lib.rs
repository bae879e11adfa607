//! Loader and plot geometry for binary N-body trajectory dumps.
//!
//! A dump is two little-endian `i32` counts (particles, steps) followed by
//! `steps * 2 * particles` little-endian `f32` positions laid out as
//! `[step][axis][particle]`.

pub mod trajectory;
pub mod view;

pub use trajectory::{Axis2, Bounds, LoadError, Trajectory};
pub use view::{ticks, Limits, Viewport};
