//! Semantic box types: the nodes of the reconstructed tree.

use std::cmp::Ordering;
use std::fmt::Write as _;

use smol_str::SmolStr;

use crate::model::NodeRef;
use crate::utils::{BBox, HasBBox, Matrix};

/// Markup order used by containers that hold nothing yet.
pub(crate) const NO_ORDER: usize = usize::MAX;

/// A slice of a glyph run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextRun {
    pub bbox: BBox,
    pub transform: Matrix,
    /// Average glyph advance in page units.
    pub default_char_width: f64,
    pub node: NodeRef,
    /// First char offset into the source run's text.
    pub start: usize,
    /// One past the last char offset into the source run's text.
    pub end: usize,
    pub text: SmolStr,
    pub is_whitespace: bool,
    /// Markup index of the source element.
    pub order: usize,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImageBox {
    pub bbox: BBox,
    pub transform: Matrix,
    pub node: NodeRef,
    pub order: usize,
}

/// A paragraph candidate: text runs, or exactly one floating image.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FixedBlock {
    pub children: Vec<SemanticBox>,
    pub bbox: BBox,
    /// Height of the tallest run on the last line.
    pub line_height: f64,
    /// Union of the runs on the last line.
    pub last_line: BBox,
    pub is_floating_image: bool,
    pub is_whitespace: bool,
    pub transform: Matrix,
    pub order: usize,
}

/// Returns true if two boxes sit on the same visual line: their vertical
/// extents overlap and their union is not much taller than the taller box.
pub(crate) fn on_same_line(a: &BBox, b: &BBox, height_ratio: f64) -> bool {
    if !a.is_voverlap(b) {
        return false;
    }
    let tallest = a.height().max(b.height());
    if tallest <= 0.0 {
        return false;
    }
    let union = a.bottom.max(b.bottom) - a.top.min(b.top);
    union / tallest < height_ratio
}

impl FixedBlock {
    pub fn from_run(run: TextRun) -> Self {
        Self {
            bbox: run.bbox,
            line_height: run.bbox.height(),
            last_line: run.bbox,
            is_floating_image: false,
            is_whitespace: run.is_whitespace,
            transform: run.transform,
            order: run.order,
            children: vec![SemanticBox::TextRun(run)],
        }
    }

    pub fn from_image(image: ImageBox) -> Self {
        Self {
            bbox: image.bbox,
            line_height: image.bbox.height(),
            last_line: image.bbox,
            is_floating_image: true,
            is_whitespace: false,
            transform: image.transform,
            order: image.order,
            children: vec![SemanticBox::Image(image)],
        }
    }

    /// Appends a run, extending the last line or starting a new one.
    pub fn push_run(&mut self, run: TextRun, same_line_ratio: f64) {
        if on_same_line(&self.last_line, &run.bbox, same_line_ratio) {
            self.last_line = self.last_line.union(&run.bbox);
            self.line_height = self.line_height.max(run.bbox.height());
        } else {
            self.last_line = run.bbox;
            self.line_height = run.bbox.height();
        }
        self.bbox = self.bbox.union(&run.bbox);
        self.is_whitespace &= run.is_whitespace;
        self.order = self.order.min(run.order);
        self.children.push(SemanticBox::TextRun(run));
    }

    /// Absorbs another block; its children follow this block's children.
    pub fn merge(&mut self, other: FixedBlock) {
        if other.last_line.bottom > self.last_line.bottom {
            self.last_line = other.last_line;
            self.line_height = other.line_height;
        }
        self.bbox = self.bbox.union(&other.bbox);
        self.is_whitespace &= other.is_whitespace;
        self.order = self.order.min(other.order);
        self.children.extend(other.children);
    }

    /// Iterates the text runs of the block.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.children.iter().filter_map(|c| match c {
            SemanticBox::TextRun(r) => Some(r),
            _ => None,
        })
    }

    /// True if any run of the block was cut from the glyph run `node`.
    pub fn has_run_from(&self, node: &NodeRef) -> bool {
        self.runs().any(|r| &r.node == node)
    }

    /// Concatenated run text; runs on different lines are joined by a newline.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev: Option<&BBox> = None;
        for run in self.runs() {
            if let Some(p) = prev
                && run.bbox.top >= p.bottom
            {
                out.push('\n');
            }
            out.push_str(&run.text);
            prev = Some(&run.bbox);
        }
        out
    }
}

/// A rectangular table cell with its contents.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableCell {
    pub bbox: BBox,
    pub children: Vec<SemanticBox>,
}

impl TableCell {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            children: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn order(&self) -> usize {
        self.children
            .iter()
            .map(SemanticBox::markup_order)
            .min()
            .unwrap_or(NO_ORDER)
    }
}

/// Cells sharing a top and bottom boundary, left to right.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableRow {
    pub bbox: BBox,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        let bbox = cells
            .iter()
            .fold(BBox::EMPTY, |acc, c| acc.union(&c.bbox));
        Self { bbox, cells }
    }
}

/// Rows stacked top to bottom.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    pub bbox: BBox,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        let bbox = rows.iter().fold(BBox::EMPTY, |acc, r| acc.union(&r.bbox));
        Self { bbox, rows }
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.rows.iter_mut().flat_map(|r| r.cells.iter_mut())
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }

    /// True if no cell holds anything.
    pub fn is_empty(&self) -> bool {
        self.cells().all(TableCell::is_empty)
    }

    pub fn order(&self) -> usize {
        self.cells().map(TableCell::order).min().unwrap_or(NO_ORDER)
    }
}

/// An order-preserving cluster of boxes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    pub bbox: BBox,
    pub children: Vec<SemanticBox>,
}

impl Group {
    pub fn new(first: SemanticBox) -> Self {
        Self {
            bbox: first.bbox(),
            children: vec![first],
        }
    }

    pub fn push(&mut self, item: SemanticBox) {
        self.bbox = self.bbox.union(&item.bbox());
        self.children.push(item);
    }
}

/// Kind tag of a semantic box.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BoxKind {
    TextRun,
    Image,
    FixedBlock,
    TableCell,
    TableRow,
    Table,
    Group,
}

/// A node of the semantic object model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SemanticBox {
    TextRun(TextRun),
    Image(ImageBox),
    FixedBlock(FixedBlock),
    TableCell(TableCell),
    TableRow(TableRow),
    Table(Table),
    Group(Group),
}

impl HasBBox for SemanticBox {
    fn bbox(&self) -> BBox {
        match self {
            SemanticBox::TextRun(r) => r.bbox,
            SemanticBox::Image(i) => i.bbox,
            SemanticBox::FixedBlock(b) => b.bbox,
            SemanticBox::TableCell(c) => c.bbox,
            SemanticBox::TableRow(r) => r.bbox,
            SemanticBox::Table(t) => t.bbox,
            SemanticBox::Group(g) => g.bbox,
        }
    }
}

impl SemanticBox {
    pub fn kind(&self) -> BoxKind {
        match self {
            SemanticBox::TextRun(_) => BoxKind::TextRun,
            SemanticBox::Image(_) => BoxKind::Image,
            SemanticBox::FixedBlock(_) => BoxKind::FixedBlock,
            SemanticBox::TableCell(_) => BoxKind::TableCell,
            SemanticBox::TableRow(_) => BoxKind::TableRow,
            SemanticBox::Table(_) => BoxKind::Table,
            SemanticBox::Group(_) => BoxKind::Group,
        }
    }

    /// Smallest markup index of any leaf under this box.
    pub fn markup_order(&self) -> usize {
        match self {
            SemanticBox::TextRun(r) => r.order,
            SemanticBox::Image(i) => i.order,
            SemanticBox::FixedBlock(b) => b.order,
            SemanticBox::TableCell(c) => c.order(),
            SemanticBox::TableRow(r) => r.cells.iter().map(TableCell::order).min().unwrap_or(NO_ORDER),
            SemanticBox::Table(t) => t.order(),
            SemanticBox::Group(g) => g
                .children
                .iter()
                .map(SemanticBox::markup_order)
                .min()
                .unwrap_or(NO_ORDER),
        }
    }

    pub fn as_fixed_block(&self) -> Option<&FixedBlock> {
        match self {
            SemanticBox::FixedBlock(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            SemanticBox::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            SemanticBox::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SemanticBox::TextRun(_) | SemanticBox::Image(_))
    }

    /// Appends every leaf under this box, depth first, to `out`.
    pub fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a SemanticBox>) {
        match self {
            SemanticBox::TextRun(_) | SemanticBox::Image(_) => out.push(self),
            SemanticBox::FixedBlock(b) => b.children.iter().for_each(|c| c.collect_leaves(out)),
            SemanticBox::Group(g) => g.children.iter().for_each(|c| c.collect_leaves(out)),
            SemanticBox::TableCell(c) => c.children.iter().for_each(|c| c.collect_leaves(out)),
            SemanticBox::TableRow(r) => r
                .cells
                .iter()
                .flat_map(|c| c.children.iter())
                .for_each(|c| c.collect_leaves(out)),
            SemanticBox::Table(t) => t
                .cells()
                .flat_map(|c| c.children.iter())
                .for_each(|c| c.collect_leaves(out)),
        }
    }

    /// Writes an indented one-box-per-line description of this subtree.
    pub fn write_outline(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let b = self.bbox();
        let rect = format!("[{:.1} {:.1} {:.1} {:.1}]", b.x0, b.top, b.x1, b.bottom);
        match self {
            SemanticBox::TextRun(r) => {
                let _ = writeln!(
                    out,
                    "{indent}TextRun {rect} {:?} {} {}..{}",
                    r.text.as_str(),
                    r.node,
                    r.start,
                    r.end
                );
            }
            SemanticBox::Image(i) => {
                let _ = writeln!(out, "{indent}Image {rect} {}", i.node);
            }
            SemanticBox::FixedBlock(blk) => {
                let _ = writeln!(out, "{indent}FixedBlock {rect}");
                for c in &blk.children {
                    c.write_outline(depth + 1, out);
                }
            }
            SemanticBox::TableCell(c) => write_cell(c, depth, out),
            SemanticBox::TableRow(r) => write_row(r, depth, out),
            SemanticBox::Table(t) => {
                let _ = writeln!(out, "{indent}Table {rect}");
                for r in &t.rows {
                    write_row(r, depth + 1, out);
                }
            }
            SemanticBox::Group(g) => {
                let _ = writeln!(out, "{indent}Group {rect}");
                for c in &g.children {
                    c.write_outline(depth + 1, out);
                }
            }
        }
    }
}

fn write_row(row: &TableRow, depth: usize, out: &mut String) {
    let b = row.bbox;
    let _ = writeln!(
        out,
        "{}TableRow [{:.1} {:.1} {:.1} {:.1}]",
        "  ".repeat(depth),
        b.x0,
        b.top,
        b.x1,
        b.bottom
    );
    for c in &row.cells {
        write_cell(c, depth + 1, out);
    }
}

fn write_cell(cell: &TableCell, depth: usize, out: &mut String) {
    let b = cell.bbox;
    let _ = writeln!(
        out,
        "{}TableCell [{:.1} {:.1} {:.1} {:.1}]",
        "  ".repeat(depth),
        b.x0,
        b.top,
        b.x1,
        b.bottom
    );
    for c in &cell.children {
        c.write_outline(depth + 1, out);
    }
}

/// Reading position: top, then left, then markup order.
pub fn reading_order(a: &SemanticBox, b: &SemanticBox) -> Ordering {
    let (ba, bb) = (a.bbox(), b.bbox());
    ba.top
        .total_cmp(&bb.top)
        .then(ba.x0.total_cmp(&bb.x0))
        .then(a.markup_order().cmp(&b.markup_order()))
}

/// Sorts a box list and every fixed block's children by reading position.
///
/// Groups keep their construction order and tables are ordered by
/// construction, so neither is reordered internally; blocks nested
/// anywhere below them are still sorted.
pub fn sort_by_reading_position(boxes: &mut [SemanticBox]) {
    boxes.iter_mut().for_each(sort_block_children);
    boxes.sort_by(reading_order);
}

fn sort_block_children(item: &mut SemanticBox) {
    match item {
        SemanticBox::FixedBlock(b) => b.children.sort_by(reading_order),
        SemanticBox::Group(g) => g.children.iter_mut().for_each(sort_block_children),
        SemanticBox::TableCell(c) => c.children.iter_mut().for_each(sort_block_children),
        SemanticBox::TableRow(r) => r
            .cells
            .iter_mut()
            .flat_map(|c| c.children.iter_mut())
            .for_each(sort_block_children),
        SemanticBox::Table(t) => t
            .cells_mut()
            .flat_map(|c| c.children.iter_mut())
            .for_each(sort_block_children),
        SemanticBox::TextRun(_) | SemanticBox::Image(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    fn run(text: &str, bbox: BBox, order: usize) -> TextRun {
        TextRun {
            bbox,
            transform: MATRIX_IDENTITY,
            default_char_width: 5.0,
            node: NodeRef::top_level(order),
            start: 0,
            end: text.chars().count(),
            text: SmolStr::new(text),
            is_whitespace: text.chars().all(char::is_whitespace),
            order,
        }
    }

    #[test]
    fn push_run_tracks_last_line() {
        let mut block = FixedBlock::from_run(run("ab", BBox::new(0.0, 0.0, 10.0, 10.0), 0));
        block.push_run(run("cd", BBox::new(12.0, 0.0, 22.0, 12.0), 1), 1.5);
        assert_eq!(block.line_height, 12.0);
        assert_eq!(block.last_line, BBox::new(0.0, 0.0, 22.0, 12.0));

        block.push_run(run("ef", BBox::new(0.0, 14.0, 10.0, 24.0), 2), 1.5);
        assert_eq!(block.line_height, 10.0);
        assert_eq!(block.last_line, BBox::new(0.0, 14.0, 10.0, 24.0));
        assert_eq!(block.bbox, BBox::new(0.0, 0.0, 22.0, 24.0));
        assert_eq!(block.text(), "abcd\nef");
    }

    #[test]
    fn whitespace_flag_requires_every_child() {
        let mut block = FixedBlock::from_run(run("  ", BBox::new(0.0, 0.0, 10.0, 10.0), 0));
        assert!(block.is_whitespace);
        block.push_run(run("x", BBox::new(10.0, 0.0, 15.0, 10.0), 1), 1.5);
        assert!(!block.is_whitespace);
    }

    #[test]
    fn reading_order_breaks_ties_by_markup() {
        let a = SemanticBox::TextRun(run("a", BBox::new(0.0, 0.0, 5.0, 5.0), 3));
        let b = SemanticBox::TextRun(run("b", BBox::new(0.0, 0.0, 5.0, 5.0), 1));
        let c = SemanticBox::TextRun(run("c", BBox::new(0.0, -1.0, 5.0, 5.0), 9));
        let mut boxes = vec![a, b, c];
        sort_by_reading_position(&mut boxes);
        let orders: Vec<usize> = boxes.iter().map(SemanticBox::markup_order).collect();
        assert_eq!(orders, vec![9, 1, 3]);
    }

    #[test]
    fn blocks_inside_table_cells_are_sorted() {
        let mut block = FixedBlock::from_run(run("world", BBox::new(40.0, 10.0, 65.0, 20.0), 0));
        block.push_run(run("hello", BBox::new(10.0, 10.0, 35.0, 20.0), 1), 1.5);
        let mut cell = TableCell::new(BBox::new(0.0, 0.0, 100.0, 40.0));
        cell.children
            .push(SemanticBox::Group(Group::new(SemanticBox::FixedBlock(block))));
        let table = Table::new(vec![TableRow::new(vec![
            cell,
            TableCell::new(BBox::new(100.0, 0.0, 200.0, 40.0)),
        ])]);

        let mut boxes = vec![SemanticBox::Group(Group::new(SemanticBox::Table(table)))];
        sort_by_reading_position(&mut boxes);

        let mut leaves = Vec::new();
        boxes[0].collect_leaves(&mut leaves);
        let texts: Vec<&str> = leaves
            .iter()
            .filter_map(|b| match b {
                SemanticBox::TextRun(r) => Some(r.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn same_line_requires_overlap_and_small_union() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(on_same_line(&a, &BBox::new(20.0, 2.0, 30.0, 12.0), 1.5));
        // union height 16 / 10 is past the ratio
        assert!(!on_same_line(&a, &BBox::new(20.0, 6.0, 30.0, 16.0), 1.5));
        assert!(!on_same_line(&a, &BBox::new(20.0, 10.0, 30.0, 20.0), 1.5));
    }
}
