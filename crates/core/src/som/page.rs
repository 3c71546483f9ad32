//! The reconstructed page: root of the semantic object model.

use crate::model::NodeRef;
use crate::utils::{BBox, HasBBox};

use super::boxes::{BoxKind, SemanticBox, TableCell};

/// Summary counters of one reconstruction, for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageStats {
    pub elements: usize,
    pub skipped: usize,
    pub horizontal_lines: usize,
    pub vertical_lines: usize,
    pub text_runs: usize,
    pub images: usize,
    pub tables: usize,
    pub combine_merges: usize,
    pub groups: usize,
}

/// The semantic object model of one page.
///
/// Holds the top-level forest of groups, tables, blocks and images, sorted
/// by reading position. Immutable once returned by the constructor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Page {
    boxes: Vec<SemanticBox>,
    stats: PageStats,
}

impl Page {
    /// Wraps finished boxes; table and group counts are filled in here.
    pub(crate) fn new(boxes: Vec<SemanticBox>, stats: PageStats) -> Self {
        let mut page = Self { boxes, stats };
        page.stats.tables = page.count(BoxKind::Table);
        page.stats.groups = page.count(BoxKind::Group);
        page
    }

    /// Top-level boxes in reading order.
    pub fn boxes(&self) -> &[SemanticBox] {
        &self.boxes
    }

    pub fn stats(&self) -> &PageStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Bounding rectangle of all content.
    pub fn bbox(&self) -> BBox {
        self.boxes
            .iter()
            .fold(BBox::EMPTY, |acc, b| acc.union(&b.bbox()))
    }

    /// Every leaf box (text runs and images), depth first.
    pub fn leaves(&self) -> Vec<&SemanticBox> {
        let mut out = Vec::new();
        for b in &self.boxes {
            b.collect_leaves(&mut out);
        }
        out
    }

    /// Leaf boxes whose rectangles intersect `rect`.
    pub fn boxes_in_rect(&self, rect: BBox) -> Vec<&SemanticBox> {
        self.leaves()
            .into_iter()
            .filter(|b| b.bbox().intersects(&rect))
            .collect()
    }

    /// Leaf boxes created from the element `node`.
    pub fn find_by_node(&self, node: &NodeRef) -> Vec<&SemanticBox> {
        self.leaves()
            .into_iter()
            .filter(|b| match b {
                SemanticBox::TextRun(r) => &r.node == node,
                SemanticBox::Image(i) => &i.node == node,
                _ => false,
            })
            .collect()
    }

    /// Counts boxes of `kind` anywhere in the tree.
    pub fn count(&self, kind: BoxKind) -> usize {
        fn walk(b: &SemanticBox, kind: BoxKind) -> usize {
            let own = usize::from(b.kind() == kind);
            let nested: usize = match b {
                SemanticBox::TextRun(_) | SemanticBox::Image(_) => 0,
                SemanticBox::FixedBlock(blk) => blk.children.iter().map(|c| walk(c, kind)).sum(),
                SemanticBox::Group(g) => g.children.iter().map(|c| walk(c, kind)).sum(),
                SemanticBox::TableCell(c) => c.children.iter().map(|c| walk(c, kind)).sum(),
                SemanticBox::TableRow(r) => r
                    .cells
                    .iter()
                    .map(|c| usize::from(kind == BoxKind::TableCell) + cell_walk(c, kind))
                    .sum(),
                SemanticBox::Table(t) => t
                    .rows
                    .iter()
                    .map(|r| {
                        usize::from(kind == BoxKind::TableRow)
                            + r.cells
                                .iter()
                                .map(|c| usize::from(kind == BoxKind::TableCell) + cell_walk(c, kind))
                                .sum::<usize>()
                    })
                    .sum(),
            };
            own + nested
        }
        fn cell_walk(c: &TableCell, kind: BoxKind) -> usize {
            c.children.iter().map(|b| walk(b, kind)).sum()
        }
        self.boxes.iter().map(|b| walk(b, kind)).sum()
    }

    /// Indented one-box-per-line dump of the tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for b in &self.boxes {
            b.write_outline(0, &mut out);
        }
        out
    }
}
