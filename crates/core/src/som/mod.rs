//! Output model: semantic boxes and the reconstructed page.

mod boxes;
mod page;

pub use boxes::{
    BoxKind, FixedBlock, Group, ImageBox, SemanticBox, Table, TableCell, TableRow, TextRun,
    reading_order, sort_by_reading_position,
};
pub(crate) use boxes::on_same_line;
pub use page::{Page, PageStats};
