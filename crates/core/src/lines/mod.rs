//! Ruling lines: classification of vector geometry and the line registry.

mod classify;
mod registry;

pub use classify::{classify_path, line_shape};
pub use registry::{LineRegistry, LineSegment, Orientation};
