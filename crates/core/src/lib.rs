//! fixsom - semantic structure recovery for fixed-layout pages.
//!
//! Takes one page of absolutely positioned glyph runs, images and vector
//! paths in markup order and infers paragraphs, tables, images and
//! reading-order groups from them.
//!
//! ```
//! use fixsom_core::model::SnapshotBuilder;
//! use fixsom_core::som::BoxKind;
//!
//! let mut page = SnapshotBuilder::new();
//! page.add_text("Hello,", 0.0, 0.0, 10.0);
//! page.add_text("world", 0.0, 12.0, 10.0);
//! let som = fixsom_core::reconstruct(&page.finish());
//! assert_eq!(som.count(BoxKind::FixedBlock), 1);
//! ```

pub mod construct;
pub mod error;
pub mod lines;
pub mod model;
pub mod params;
pub mod som;
pub mod table;
pub mod utils;

pub use construct::{PageConstructor, reconstruct, reconstruct_pages, reconstruct_with};
pub use error::{Result, SomError};
pub use model::{NodeRef, PageElement, PageSnapshot, PageSource};
pub use params::SomParams;
pub use som::{Page, SemanticBox};
