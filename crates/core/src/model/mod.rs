//! Input model: page elements, node references and snapshots.

mod element;
mod node;
mod snapshot;

pub use element::{
    Figure, Fill, Geometry, GlyphRun, ImageElement, PageElement, PathElement, Segment,
};
pub use node::{ElementId, NodeRef};
pub use snapshot::{PageSnapshot, PageSource, SnapshotBuilder};
