//! Conversion of raw page elements into primitive semantic boxes.

use smol_str::SmolStr;
use tracing::trace;

use crate::lines::LineRegistry;
use crate::model::{Fill, GlyphRun, ImageElement, NodeRef, PathElement, Segment};
use crate::params::SomParams;
use crate::som::{ImageBox, TextRun};
use crate::utils::{
    BBox, Matrix, apply_matrix_rect, get_bound, matrix_is_finite, matrix_x_scale,
};

/// Char ranges of `run` that become separate text runs.
///
/// A maximal internal run of whitespace splits the glyph run only when it
/// is wider than `column_gap_space_ratio` natural spaces and a vertical
/// ruling line actually passes through it. Wide spacing alone is ordinary
/// justified or tabbed text.
fn column_pieces(
    run: &GlyphRun,
    chars: &[char],
    edges: &[f64],
    registry: &LineRegistry,
    params: &SomParams,
) -> Vec<(usize, usize)> {
    let n = chars.len();
    let threshold = params.column_gap_space_ratio * run.space_advance;
    let mut pieces = Vec::new();
    let mut piece_start = 0;
    let mut i = 0;
    while i < n {
        if !chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let gap_start = i;
        while i < n && chars[i].is_whitespace() {
            i += 1;
        }
        let gap_end = i;
        if gap_start == 0 || gap_end == n {
            continue;
        }
        let width = (edges[gap_end] - edges[gap_start]).abs();
        if width <= threshold {
            continue;
        }
        let local = BBox::new(
            edges[gap_start].min(edges[gap_end]),
            run.top,
            edges[gap_start].max(edges[gap_end]),
            run.bottom,
        );
        let gap = apply_matrix_rect(run.transform, local);
        if registry.is_vertically_separated(gap.x0, gap.top, gap.x1, gap.bottom) {
            trace!(node = %run.node, gap_start, gap_end, "glyph run split at separator");
            pieces.push((piece_start, gap_start));
            piece_start = gap_end;
        }
    }
    pieces.push((piece_start, n));
    pieces
}

/// Builds the text runs of one glyph run, or none if the run is malformed.
pub fn process_glyph_run(
    run: &GlyphRun,
    order: usize,
    registry: &LineRegistry,
    params: &SomParams,
) -> Vec<TextRun> {
    if !run.is_well_formed() || !matrix_is_finite(run.transform) {
        trace!(node = %run.node, "malformed glyph run skipped");
        return Vec::new();
    }
    let chars: Vec<char> = run.text.chars().collect();
    let edges = run.glyph_edges();
    let x_scale = matrix_x_scale(run.transform);

    column_pieces(run, &chars, &edges, registry, params)
        .into_iter()
        .filter(|(start, end)| end > start)
        .map(|(start, end)| {
            let (left, right) = (edges[start], edges[end]);
            let local = BBox::new(left.min(right), run.top, left.max(right), run.bottom);
            let mut char_width = (right - left).abs() / (end - start) as f64;
            if char_width <= 0.0 {
                char_width = run.em_size * 0.5;
            }
            let slice = &chars[start..end];
            TextRun {
                bbox: apply_matrix_rect(run.transform, local),
                transform: run.transform,
                default_char_width: char_width * x_scale,
                node: run.node.clone(),
                start,
                end,
                text: slice.iter().copied().collect::<SmolStr>(),
                is_whitespace: slice.iter().all(|c| c.is_whitespace()),
                order,
            }
        })
        .collect()
}

fn image_box(bounds: BBox, transform: Matrix, node: &NodeRef, order: usize) -> Option<ImageBox> {
    if !matrix_is_finite(transform) || !bounds.is_finite() {
        return None;
    }
    let bbox = apply_matrix_rect(transform, bounds);
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return None;
    }
    Some(ImageBox {
        bbox,
        transform,
        node: node.clone(),
        order,
    })
}

pub fn process_image(image: &ImageElement, order: usize) -> Option<ImageBox> {
    let boxed = image_box(image.bounds, image.transform, &image.node, order);
    if boxed.is_none() {
        trace!(node = %image.node, "degenerate image skipped");
    }
    boxed
}

/// An image-filled path becomes an image box unless it was classified as
/// a ruling line.
pub fn process_path(path: &PathElement, line_shaped: bool, order: usize) -> Option<ImageBox> {
    if path.fill != Some(Fill::Image) || line_shaped {
        return None;
    }
    let bounds = path.bounds.unwrap_or_else(|| {
        get_bound(path.geometry.figures.iter().flat_map(|f| {
            std::iter::once(f.start).chain(f.segments.iter().flat_map(|s| match *s {
                Segment::Line(p) => vec![p],
                Segment::Curve { c1, c2, end } => vec![c1, c2, end],
            }))
        }))
    });
    let boxed = image_box(bounds, path.transform, &path.node, order);
    if boxed.is_none() {
        trace!(node = %path.node, "degenerate image fill skipped");
    }
    boxed
}
