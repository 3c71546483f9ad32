//! Incremental paragraph assembly.
//!
//! Text runs arrive in markup order. Each run extends the current block
//! when the combinability rules allow it, otherwise the earlier blocks are
//! searched (most recent first) and only then is a new block started.
//! Images always get a block of their own.

use tracing::trace;

use crate::lines::LineRegistry;
use crate::params::SomParams;
use crate::som::{FixedBlock, ImageBox, TextRun, on_same_line};

/// Why a run was refused by a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    FloatingImage,
    AboveLastLine,
    Whitespace,
    Transform,
    LineHeight,
    TooFar,
    SameSource,
    Separator,
}

/// Runs the combinability rules for `run` against `block`, in order.
///
/// `is_current` tells whether `block` is the block the previous run went
/// into, which is what markup adjacency means here.
pub(crate) fn check_combinable(
    block: &FixedBlock,
    run: &TextRun,
    is_current: bool,
    registry: &LineRegistry,
    params: &SomParams,
) -> Result<(), Rejection> {
    if block.is_floating_image {
        return Err(Rejection::FloatingImage);
    }
    let rb = &run.bbox;
    if rb.bottom <= block.last_line.top {
        return Err(Rejection::AboveLastLine);
    }
    if run.is_whitespace || block.is_whitespace {
        let touch = rb.inflate(params.whitespace_inflate_chars * run.default_char_width, 0.0);
        if !is_current || !touch.intersects(&block.bbox) {
            return Err(Rejection::Whitespace);
        }
    }
    if run.transform != block.transform {
        return Err(Rejection::Transform);
    }

    let same_row = rb.is_voverlap(&block.last_line);
    if !same_row {
        let (a, b) = (block.line_height, rb.height());
        let tallest = a.max(b);
        if tallest <= 0.0 || (a - b).abs() / tallest > params.line_height_tolerance {
            return Err(Rejection::LineHeight);
        }
    }

    let dx = if is_current && on_same_line(&block.last_line, rb, params.same_line_height_ratio) {
        params.consecutive_inflate
    } else {
        params.char_inflate_ratio * run.default_char_width
    };
    let dy = params.line_gap_ratio * rb.height();
    if !rb.inflate(dx, dy).intersects(&block.bbox) {
        return Err(Rejection::TooFar);
    }

    if block.has_run_from(&run.node) {
        return Err(Rejection::SameSource);
    }

    let nearest = if same_row { &block.last_line } else { &block.bbox };
    if registry.separates(nearest, rb) {
        return Err(Rejection::Separator);
    }
    Ok(())
}

/// Builds the top-level blocks of a page.
pub(crate) struct BlockAssembler<'a> {
    registry: &'a LineRegistry,
    params: &'a SomParams,
    blocks: Vec<FixedBlock>,
    current: Option<usize>,
}

impl<'a> BlockAssembler<'a> {
    pub fn new(registry: &'a LineRegistry, params: &'a SomParams) -> Self {
        Self {
            registry,
            params,
            blocks: Vec::new(),
            current: None,
        }
    }

    pub fn add_run(&mut self, run: TextRun) {
        let target = self.find_block(&run);
        match target {
            Some(idx) => {
                self.blocks[idx].push_run(run, self.params.same_line_height_ratio);
                self.current = Some(idx);
            }
            None => {
                self.blocks.push(FixedBlock::from_run(run));
                self.current = Some(self.blocks.len() - 1);
            }
        }
    }

    pub fn add_image(&mut self, image: ImageBox) {
        self.blocks.push(FixedBlock::from_image(image));
        self.current = Some(self.blocks.len() - 1);
    }

    fn find_block(&self, run: &TextRun) -> Option<usize> {
        if let Some(cur) = self.current {
            match check_combinable(&self.blocks[cur], run, true, self.registry, self.params) {
                Ok(()) => return Some(cur),
                Err(reason) => {
                    trace!(node = %run.node, start = run.start, ?reason, "current block rejected run")
                }
            }
        }
        (0..self.blocks.len())
            .rev()
            .filter(|&idx| Some(idx) != self.current)
            .find(|&idx| {
                check_combinable(&self.blocks[idx], run, false, self.registry, self.params).is_ok()
            })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn finish(self) -> Vec<FixedBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeRef;
    use crate::utils::{BBox, MATRIX_IDENTITY};
    use smol_str::SmolStr;

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

    fn check(block: &FixedBlock, r: &TextRun, is_current: bool) -> Result<(), Rejection> {
        check_combinable(
            block,
            r,
            is_current,
            &LineRegistry::default(),
            &SomParams::default(),
        )
    }

    #[test]
    fn next_line_of_a_paragraph_is_accepted() {
        let block = FixedBlock::from_run(run("first", BBox::new(0.0, 0.0, 50.0, 10.0), 0));
        let next = run("second", BBox::new(0.0, 12.0, 60.0, 22.0), 1);
        assert_eq!(check(&block, &next, true), Ok(()));
        assert_eq!(check(&block, &next, false), Ok(()));
    }

    #[test]
    fn rules_reject_in_order() {
        let image = FixedBlock::from_image(ImageBox {
            bbox: BBox::new(0.0, 0.0, 50.0, 50.0),
            transform: MATRIX_IDENTITY,
            node: NodeRef::top_level(0),
            order: 0,
        });
        let r = run("x", BBox::new(0.0, 10.0, 5.0, 20.0), 1);
        assert_eq!(check(&image, &r, true), Err(Rejection::FloatingImage));

        let block = FixedBlock::from_run(run("body", BBox::new(0.0, 100.0, 40.0, 110.0), 0));
        let above = run("up", BBox::new(0.0, 80.0, 10.0, 90.0), 1);
        assert_eq!(check(&block, &above, true), Err(Rejection::AboveLastLine));

        let mut rotated = run("rot", BBox::new(42.0, 100.0, 60.0, 110.0), 1);
        rotated.transform = (0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        assert_eq!(check(&block, &rotated, true), Err(Rejection::Transform));

        let footnote = run("tiny", BBox::new(0.0, 112.0, 20.0, 117.0), 1);
        assert_eq!(check(&block, &footnote, true), Err(Rejection::LineHeight));

        let far = run("far", BBox::new(0.0, 150.0, 20.0, 160.0), 1);
        assert_eq!(check(&block, &far, true), Err(Rejection::TooFar));

        let mut sibling = run("sib", BBox::new(45.0, 100.0, 60.0, 110.0), 1);
        sibling.node = NodeRef::top_level(0);
        assert_eq!(check(&block, &sibling, true), Err(Rejection::SameSource));
    }

    #[test]
    fn consecutive_same_line_fragments_bridge_wide_gaps() {
        let block = FixedBlock::from_run(run("left", BBox::new(0.0, 0.0, 40.0, 10.0), 0));
        let gapped = run("right", BBox::new(180.0, 0.0, 220.0, 10.0), 1);
        assert_eq!(check(&block, &gapped, true), Ok(()));
        assert_eq!(check(&block, &gapped, false), Err(Rejection::TooFar));
    }

    #[test]
    fn whitespace_needs_adjacency_and_contact() {
        let block = FixedBlock::from_run(run("word", BBox::new(0.0, 0.0, 40.0, 10.0), 0));
        let touching = run(" ", BBox::new(50.0, 0.0, 55.0, 10.0), 1);
        assert_eq!(check(&block, &touching, true), Ok(()));
        assert_eq!(check(&block, &touching, false), Err(Rejection::Whitespace));

        let distant = run(" ", BBox::new(80.0, 0.0, 85.0, 10.0), 1);
        assert_eq!(check(&block, &distant, true), Err(Rejection::Whitespace));
    }

    #[test]
    fn separator_between_columns_rejects() {
        let mut reg = LineRegistry::default();
        reg.add_vertical((50.0, -10.0), (50.0, 40.0));
        let params = SomParams::default();
        let block = FixedBlock::from_run(run("left", BBox::new(0.0, 0.0, 40.0, 10.0), 0));
        let right = run("right", BBox::new(60.0, 0.0, 100.0, 10.0), 1);
        assert_eq!(
            check_combinable(&block, &right, true, &reg, &params),
            Err(Rejection::Separator)
        );
    }

    #[test]
    fn assembler_searches_earlier_blocks() {
        let reg = LineRegistry::default();
        let params = SomParams::default();
        let mut asm = BlockAssembler::new(&reg, &params);
        asm.add_run(run("col1 a", BBox::new(0.0, 0.0, 60.0, 10.0), 0));
        asm.add_run(run("col2 a", BBox::new(300.0, 0.0, 360.0, 10.0), 1));
        assert_eq!(asm.len(), 2);

        // a far image breaks the current-block chain
        asm.add_image(ImageBox {
            bbox: BBox::new(500.0, 500.0, 600.0, 600.0),
            transform: MATRIX_IDENTITY,
            node: NodeRef::top_level(2),
            order: 2,
        });
        asm.add_run(run("col1 b", BBox::new(0.0, 12.0, 60.0, 22.0), 3));
        let blocks = asm.finish();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text(), "col1 a\ncol1 b");
        assert_eq!(blocks[1].runs().count(), 1);
        assert!(blocks[2].is_floating_image);
    }
}
