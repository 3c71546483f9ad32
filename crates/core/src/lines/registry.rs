//! Registry of axis-aligned ruling lines.
//!
//! Segments are grouped by their fixed coordinate (y for horizontal lines,
//! x for vertical lines). Coordinates closer than the merge tolerance are
//! the same ruling line. Each group keeps a sorted list of disjoint spans,
//! so separation queries are a binary search over groups followed by a
//! binary search over spans.

use crate::utils::{BBox, EPSILON, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A registered span of a ruling line.
///
/// For horizontal segments `coord` is y and the span runs along x; for
/// vertical segments `coord` is x and the span runs along y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub orientation: Orientation,
    pub coord: f64,
    pub start: f64,
    pub end: f64,
}

/// All spans sharing one coordinate.
#[derive(Clone, Debug)]
struct LineGroup {
    coord: f64,
    /// Sorted, disjoint `(start, end)` spans.
    spans: Vec<(f64, f64)>,
}

impl LineGroup {
    fn new(coord: f64, start: f64, end: f64) -> Self {
        Self {
            coord,
            spans: vec![(start, end)],
        }
    }

    /// Inserts a span, merging it with every span it overlaps or touches.
    fn add_span(&mut self, start: f64, end: f64, tolerance: f64) {
        let first = self.spans.partition_point(|&(_, e)| e + tolerance < start);
        let mut last = first;
        let (mut s, mut e) = (start, end);
        while last < self.spans.len() && self.spans[last].0 <= end + tolerance {
            s = s.min(self.spans[last].0);
            e = e.max(self.spans[last].1);
            last += 1;
        }
        self.spans.splice(first..last, [(s, e)]);
    }

    /// The span containing `v`, if any.
    fn span_at(&self, v: f64) -> Option<(f64, f64)> {
        let idx = self.spans.partition_point(|&(s, _)| s <= v);
        if idx == 0 {
            return None;
        }
        let span = self.spans[idx - 1];
        (v <= span.1).then_some(span)
    }
}

/// Classified ruling lines of one page.
#[derive(Clone, Debug)]
pub struct LineRegistry {
    horizontals: Vec<LineGroup>,
    verticals: Vec<LineGroup>,
    tolerance: f64,
    margin_ratio: f64,
}

impl Default for LineRegistry {
    fn default() -> Self {
        Self::new(0.1, 0.1)
    }
}

impl LineRegistry {
    /// `tolerance` merges near-equal coordinates; `margin_ratio` is the
    /// fraction of the tested extent a separator may miss at each end.
    pub fn new(tolerance: f64, margin_ratio: f64) -> Self {
        Self {
            horizontals: Vec::new(),
            verticals: Vec::new(),
            tolerance,
            margin_ratio,
        }
    }

    /// Registers a horizontal segment. Degenerate segments are ignored.
    pub fn add_horizontal(&mut self, p1: Point, p2: Point) {
        let y = (p1.1 + p2.1) / 2.0;
        Self::insert(
            &mut self.horizontals,
            y,
            p1.0.min(p2.0),
            p1.0.max(p2.0),
            self.tolerance,
        );
    }

    /// Registers a vertical segment. Degenerate segments are ignored.
    pub fn add_vertical(&mut self, p1: Point, p2: Point) {
        let x = (p1.0 + p2.0) / 2.0;
        Self::insert(
            &mut self.verticals,
            x,
            p1.1.min(p2.1),
            p1.1.max(p2.1),
            self.tolerance,
        );
    }

    fn insert(groups: &mut Vec<LineGroup>, coord: f64, start: f64, end: f64, tolerance: f64) {
        if !(coord.is_finite() && start.is_finite() && end.is_finite()) || end - start <= EPSILON {
            return;
        }
        let idx = groups.partition_point(|g| g.coord < coord - tolerance);
        match groups.get_mut(idx) {
            Some(g) if (g.coord - coord).abs() < tolerance => g.add_span(start, end, tolerance),
            _ => groups.insert(idx, LineGroup::new(coord, start, end)),
        }
    }

    /// True if a horizontal line runs between the top and bottom of the
    /// rectangle and spans its width.
    pub fn is_horizontally_separated(&self, left: f64, top: f64, right: f64, bottom: f64) -> bool {
        self.is_separated(&self.horizontals, top, bottom, left, right)
    }

    /// True if a vertical line runs between the left and right of the
    /// rectangle and spans its height.
    pub fn is_vertically_separated(&self, left: f64, top: f64, right: f64, bottom: f64) -> bool {
        self.is_separated(&self.verticals, left, right, top, bottom)
    }

    /// True if a ruling line runs between two boxes.
    ///
    /// Side by side boxes (overlapping vertical extents) need a vertical
    /// line in the horizontal gap covering their shared height. Stacked
    /// boxes need a horizontal line in the vertical gap covering the
    /// horizontal extent they share, or the gap between them if they
    /// share none, or a vertical line in the horizontal gap spanning both.
    /// Boxes that overlap on both axes are never separated.
    pub fn separates(&self, a: &BBox, b: &BBox) -> bool {
        if a.is_voverlap(b) {
            let (left, right) = if a.x0 <= b.x0 { (a, b) } else { (b, a) };
            if left.x1 > right.x0 {
                return false;
            }
            let top = a.top.max(b.top);
            let bottom = a.bottom.min(b.bottom);
            self.is_vertically_separated(left.x1, top, right.x0, bottom)
        } else {
            let (upper, lower) = if a.top <= b.top { (a, b) } else { (b, a) };
            let (lo, hi) = (a.x0.max(b.x0), a.x1.min(b.x1));
            if lo <= hi {
                return self.is_horizontally_separated(lo, upper.bottom, hi, lower.top);
            }
            // diagonal neighbours: either rule counts
            self.is_horizontally_separated(hi, upper.bottom, lo, lower.top)
                || self.is_vertically_separated(hi, upper.top, lo, lower.bottom)
        }
    }

    /// `low..high` bounds the line coordinate (exclusive); `perp_low..perp_high`
    /// is the extent the line must cover, less the allowed margin.
    fn is_separated(
        &self,
        groups: &[LineGroup],
        low: f64,
        high: f64,
        perp_low: f64,
        perp_high: f64,
    ) -> bool {
        if groups.is_empty() || high <= low || perp_high < perp_low {
            return false;
        }
        let margin = self.margin_ratio * (perp_high - perp_low);
        let need_start = perp_low + margin;
        let need_end = perp_high - margin;
        let first = groups.partition_point(|g| g.coord <= low);
        groups[first..]
            .iter()
            .take_while(|g| g.coord < high)
            .any(|g| matches!(g.span_at(need_start), Some((_, end)) if end >= need_end))
    }

    /// Number of distinct horizontal lines.
    pub fn horizontal_count(&self) -> usize {
        self.horizontals.len()
    }

    /// Number of distinct vertical lines.
    pub fn vertical_count(&self) -> usize {
        self.verticals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizontals.is_empty() && self.verticals.is_empty()
    }

    /// Every horizontal span, top to bottom then left to right.
    pub fn horizontal_segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        Self::segments(&self.horizontals, Orientation::Horizontal)
    }

    /// Every vertical span, left to right then top to bottom.
    pub fn vertical_segments(&self) -> impl Iterator<Item = LineSegment> + '_ {
        Self::segments(&self.verticals, Orientation::Vertical)
    }

    fn segments(
        groups: &[LineGroup],
        orientation: Orientation,
    ) -> impl Iterator<Item = LineSegment> + '_ {
        groups.iter().flat_map(move |g| {
            g.spans.iter().map(move |&(start, end)| LineSegment {
                orientation,
                coord: g.coord,
                start,
                end,
            })
        })
    }
}
