//! Classification of vector paths into ruling lines.
//!
//! Stroked straight segments become lines directly. Filled figures become
//! lines when their bounds are a thin rectangle: document authoring tools
//! routinely draw table grids either way.

use tracing::trace;

use crate::model::{Figure, PathElement, Segment};
use crate::params::SomParams;
use crate::utils::{
    BBox, Matrix, Point, apply_matrix_pt, apply_matrix_rect, approx_eq, get_bound, matrix_is_finite,
};

use super::registry::{LineRegistry, Orientation};

/// Coordinates closer than this count as axis-aligned.
const AXIS_EPSILON: f64 = 0.01;

/// Returns the orientation of a thin filled rectangle, or None if the
/// rectangle is not line shaped.
pub fn line_shape(bounds: &BBox, params: &SomParams) -> Option<Orientation> {
    let (w, h) = (bounds.width(), bounds.height());
    let thin = w.min(h);
    let long = w.max(h);
    if thin.is_nan() || thin <= 0.0 || !long.is_finite() {
        return None;
    }
    if thin <= params.line_shape_max_thickness && long / thin >= params.line_shape_min_ratio {
        Some(if w >= h {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        })
    } else {
        None
    }
}

/// Registers a line through the centre of `bounds` if it is line shaped.
fn register_line_shape(bounds: &BBox, params: &SomParams, registry: &mut LineRegistry) -> bool {
    match line_shape(bounds, params) {
        Some(Orientation::Horizontal) => {
            let y = (bounds.top + bounds.bottom) / 2.0;
            registry.add_horizontal((bounds.x0, y), (bounds.x1, y));
            true
        }
        Some(Orientation::Vertical) => {
            let x = (bounds.x0 + bounds.x1) / 2.0;
            registry.add_vertical((x, bounds.top), (x, bounds.bottom));
            true
        }
        None => false,
    }
}

/// Page-space vertices of a curve-free figure, closing point included.
/// Returns None as soon as a curve is seen.
fn straight_vertices(figure: &Figure, m: Matrix) -> Option<Vec<Point>> {
    let mut pts = Vec::with_capacity(figure.segments.len() + 2);
    pts.push(apply_matrix_pt(m, figure.start));
    for seg in &figure.segments {
        match seg {
            Segment::Line(p) => pts.push(apply_matrix_pt(m, *p)),
            Segment::Curve { .. } => return None,
        }
    }
    if figure.closed && pts.last() != pts.first() {
        pts.push(pts[0]);
    }
    Some(pts)
}

fn register_stroked_figure(figure: &Figure, m: Matrix, registry: &mut LineRegistry) {
    let Some(pts) = straight_vertices(figure, m) else {
        trace!("curved figure skipped for line detection");
        return;
    };
    for pair in pts.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        if approx_eq(p.1, q.1, AXIS_EPSILON) {
            registry.add_horizontal(p, q);
        } else if approx_eq(p.0, q.0, AXIS_EPSILON) {
            registry.add_vertical(p, q);
        }
    }
}

/// Feeds the ruling lines of `path` into `registry`.
///
/// Returns true if any filled figure (or the path's own bounds, for a
/// single-figure path) has line shape.
pub fn classify_path(path: &PathElement, params: &SomParams, registry: &mut LineRegistry) -> bool {
    let m = path.transform;
    if !matrix_is_finite(m) {
        trace!(node = %path.node, "path with non-finite transform skipped");
        return false;
    }

    if path.stroke {
        for figure in &path.geometry.figures {
            register_stroked_figure(figure, m, registry);
        }
    }

    if path.fill.is_none() {
        return false;
    }

    let figures = &path.geometry.figures;
    let standalone = figures.len() <= 1 && !figures.iter().any(Figure::has_curves);
    if standalone && let Some(bounds) = path.bounds {
        return register_line_shape(&apply_matrix_rect(m, bounds), params, registry);
    }

    let mut line_shaped = false;
    for figure in figures {
        let Some(pts) = straight_vertices(figure, m) else {
            continue;
        };
        let bounds = get_bound(pts);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            continue;
        }
        line_shaped |= register_line_shape(&bounds, params, registry);
    }
    line_shaped
}
