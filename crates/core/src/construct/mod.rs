//! Page reconstruction: from raw page elements to the semantic tree.
//!
//! One reconstruction runs these phases over a single page:
//!
//! 1. every path is classified into the line registry, so that rulings
//!    appearing late in markup still constrain earlier text;
//! 2. glyph runs and images are converted to primitives in markup order
//!    and assembled into blocks;
//! 3. tables are detected from the registry and filled with the blocks
//!    they cover;
//! 4. the combine pass merges blocks and nests tables to a fixed point;
//! 5. top-level boxes are grouped and sorted by reading position.

mod block;
mod combine;
mod element;
mod grouping;

pub use combine::combine_pass;
pub use element::{process_glyph_run, process_image, process_path};
pub use grouping::group_boxes;

use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::error::Result;
use crate::lines::{LineRegistry, classify_path};
use crate::model::{ElementId, Fill, PageElement, PageSource};
use crate::params::SomParams;
use crate::som::{Page, PageStats, SemanticBox, reading_order, sort_by_reading_position};
use crate::table::{detect_tables, populate_tables};

use block::BlockAssembler;

/// Reconstructs pages with one validated parameter set.
#[derive(Clone, Debug, Default)]
pub struct PageConstructor {
    params: SomParams,
}

impl PageConstructor {
    /// Fails if any parameter is out of range.
    pub fn new(params: SomParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SomParams {
        &self.params
    }

    /// Builds the line registry of a page from its paths.
    ///
    /// The returned flags tell, per element, whether a filled path was
    /// classified as a ruling line.
    pub fn classify_lines<S: PageSource + ?Sized>(&self, source: &S) -> (LineRegistry, Vec<bool>) {
        let params = &self.params;
        let mut registry =
            LineRegistry::new(params.line_merge_tolerance, params.separator_margin_ratio);
        let line_shaped = (0..source.len())
            .map(|id| match source.element(ElementId(id)) {
                Some(PageElement::Path(path)) => classify_path(path, params, &mut registry),
                _ => false,
            })
            .collect();
        (registry, line_shaped)
    }

    /// Reconstructs the semantic tree of one page.
    ///
    /// Never fails: malformed elements are skipped.
    pub fn reconstruct<S: PageSource + ?Sized>(&self, source: &S) -> Page {
        let params = &self.params;
        let n = source.len();
        let span = debug_span!("reconstruct", elements = n);
        let _enter = span.enter();

        let mut stats = PageStats {
            elements: n,
            ..PageStats::default()
        };

        let (registry, line_shaped) = self.classify_lines(source);
        stats.horizontal_lines = registry.horizontal_count();
        stats.vertical_lines = registry.vertical_count();
        debug!(
            horizontal = stats.horizontal_lines,
            vertical = stats.vertical_lines,
            "ruling lines registered"
        );

        let mut assembler = BlockAssembler::new(&registry, params);
        for id in 0..n {
            match source.element(ElementId(id)) {
                Some(PageElement::GlyphRun(run)) => {
                    let runs = process_glyph_run(run, id, &registry, params);
                    if runs.is_empty() {
                        stats.skipped += 1;
                    }
                    stats.text_runs += runs.len();
                    for r in runs {
                        assembler.add_run(r);
                    }
                }
                Some(PageElement::Image(image)) => match process_image(image, id) {
                    Some(b) => {
                        stats.images += 1;
                        assembler.add_image(b);
                    }
                    None => stats.skipped += 1,
                },
                Some(PageElement::Path(path))
                    if path.fill == Some(Fill::Image) && !line_shaped[id] =>
                {
                    match process_path(path, false, id) {
                        Some(b) => {
                            stats.images += 1;
                            assembler.add_image(b);
                        }
                        None => stats.skipped += 1,
                    }
                }
                _ => {}
            }
        }
        debug!(
            text_runs = stats.text_runs,
            images = stats.images,
            blocks = assembler.len(),
            skipped = stats.skipped,
            "blocks assembled"
        );

        let tables = detect_tables(&registry, params);
        let (tables, blocks) = populate_tables(tables, assembler.finish(), params);
        let mut boxes: Vec<SemanticBox> = blocks
            .into_iter()
            .map(SemanticBox::FixedBlock)
            .chain(tables.into_iter().map(SemanticBox::Table))
            .collect();

        stats.combine_merges = combine_pass(&mut boxes, &registry, params);

        boxes.sort_by(reading_order);
        let mut groups = group_boxes(boxes, params);
        sort_by_reading_position(&mut groups);
        debug!(groups = groups.len(), "page grouped");

        Page::new(groups, stats)
    }

    /// Reconstructs independent pages in parallel.
    pub fn reconstruct_pages<S: PageSource + Sync>(&self, sources: &[S]) -> Vec<Page> {
        sources.par_iter().map(|s| self.reconstruct(s)).collect()
    }
}

/// Reconstructs one page with default parameters.
pub fn reconstruct<S: PageSource + ?Sized>(source: &S) -> Page {
    PageConstructor::default().reconstruct(source)
}

/// Reconstructs one page with caller parameters, validating them first.
pub fn reconstruct_with<S: PageSource + ?Sized>(source: &S, params: &SomParams) -> Result<Page> {
    Ok(PageConstructor::new(params.clone())?.reconstruct(source))
}

/// Reconstructs independent pages in parallel with default parameters.
pub fn reconstruct_pages<S: PageSource + Sync>(sources: &[S]) -> Vec<Page> {
    PageConstructor::default().reconstruct_pages(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SnapshotBuilder;
    use crate::som::BoxKind;
    use crate::utils::BBox;

    #[test]
    fn paragraph_lines_form_one_block() {
        let mut b = SnapshotBuilder::new();
        b.add_text("The quick brown", 0.0, 0.0, 10.0);
        b.add_text("fox jumps over", 0.0, 12.0, 10.0);
        b.add_text("the lazy dog", 0.0, 24.0, 10.0);
        let page = reconstruct(&b.finish());
        assert_eq!(page.count(BoxKind::FixedBlock), 1);
        assert_eq!(page.count(BoxKind::TextRun), 3);
        assert_eq!(page.stats().text_runs, 3);
        let block = page.boxes()[0].as_group().unwrap().children[0]
            .as_fixed_block()
            .unwrap();
        assert_eq!(block.text(), "The quick brown\nfox jumps over\nthe lazy dog");
    }

    #[test]
    fn malformed_elements_are_counted_not_fatal() {
        let mut b = SnapshotBuilder::new();
        b.add_text("", 0.0, 0.0, 10.0);
        b.add_image(BBox::new(0.0, 0.0, 0.0, 0.0));
        b.add_text("ok", 0.0, 0.0, 10.0);
        let page = reconstruct(&b.finish());
        assert_eq!(page.stats().skipped, 2);
        assert_eq!(page.leaves().len(), 1);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = SomParams {
            consecutive_inflate: f64::NAN,
            ..SomParams::default()
        };
        assert!(PageConstructor::new(params.clone()).is_err());
        assert!(reconstruct_with(&SnapshotBuilder::new().finish(), &params).is_err());
    }

    #[test]
    fn empty_page_is_empty() {
        let page = reconstruct(&SnapshotBuilder::new().finish());
        assert!(page.is_empty());
        assert_eq!(page.stats().elements, 0);
    }
}
