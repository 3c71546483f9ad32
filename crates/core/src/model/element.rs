//! Page elements as supplied by the layout collaborator.
//!
//! Coordinates inside an element are local; `transform` maps them to page
//! space (top-down, y grows downward).

use crate::utils::{BBox, Matrix, Point};

use super::node::NodeRef;

/// A positioned run of glyphs with its shaping results.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlyphRun {
    pub node: NodeRef,
    /// Unicode text, one advance per `char`.
    pub text: String,
    /// Advance width of each character in local units.
    pub advances: Vec<f64>,
    /// Left edge of the first glyph in local units.
    pub origin_x: f64,
    /// Top of the alignment box in local units.
    pub top: f64,
    /// Bottom of the alignment box in local units.
    pub bottom: f64,
    /// Font rendering size.
    pub em_size: f64,
    /// The font's natural advance for a space character, in local units.
    pub space_advance: f64,
    pub transform: Matrix,
}

impl GlyphRun {
    /// Local-space x positions of every glyph boundary (`len = chars + 1`).
    pub fn glyph_edges(&self) -> Vec<f64> {
        let mut edges = Vec::with_capacity(self.advances.len() + 1);
        let mut x = self.origin_x;
        edges.push(x);
        for adv in &self.advances {
            x += adv;
            edges.push(x);
        }
        edges
    }

    /// True if the run can be turned into text boxes at all.
    pub fn is_well_formed(&self) -> bool {
        let chars = self.text.chars().count();
        chars > 0
            && chars == self.advances.len()
            && self.em_size > 0.0
            && self.em_size.is_finite()
            && self.space_advance.is_finite()
            && self.origin_x.is_finite()
            && self.top.is_finite()
            && self.bottom.is_finite()
            && self.bottom > self.top
            && self.advances.iter().all(|a| a.is_finite())
    }
}

/// A raster image placed on the page.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageElement {
    pub node: NodeRef,
    pub bounds: BBox,
    pub transform: Matrix,
}

/// How a path is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fill {
    Solid,
    /// The fill paints an image (an image brush).
    Image,
}

/// One segment of a figure; each segment starts where the previous one ended.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Segment {
    Line(Point),
    /// Cubic bezier; any curve shape is reported this way.
    Curve { c1: Point, c2: Point, end: Point },
}

impl Segment {
    pub fn end(&self) -> Point {
        match self {
            Segment::Line(p) => *p,
            Segment::Curve { end, .. } => *end,
        }
    }
}

/// A connected sub-path.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Figure {
    pub start: Point,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Figure {
    pub fn has_curves(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Curve { .. }))
    }

    /// A closed axis-aligned rectangle figure.
    pub fn rect(r: BBox) -> Self {
        Self {
            start: (r.x0, r.top),
            segments: vec![
                Segment::Line((r.x1, r.top)),
                Segment::Line((r.x1, r.bottom)),
                Segment::Line((r.x0, r.bottom)),
            ],
            closed: true,
        }
    }

    /// An open two-point figure.
    pub fn line(p0: Point, p1: Point) -> Self {
        Self {
            start: p0,
            segments: vec![Segment::Line(p1)],
            closed: false,
        }
    }
}

/// Vector geometry of a path as a list of figures.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub figures: Vec<Figure>,
}

/// A vector path.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathElement {
    pub node: NodeRef,
    pub fill: Option<Fill>,
    pub stroke: bool,
    pub geometry: Geometry,
    /// Resolved local bounds of the filled area, when the collaborator has them.
    pub bounds: Option<BBox>,
    pub transform: Matrix,
}

/// One element of the page, in markup order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageElement {
    GlyphRun(GlyphRun),
    Image(ImageElement),
    Path(PathElement),
}

impl PageElement {
    pub fn node(&self) -> &NodeRef {
        match self {
            PageElement::GlyphRun(g) => &g.node,
            PageElement::Image(i) => &i.node,
            PageElement::Path(p) => &p.node,
        }
    }

    pub fn transform(&self) -> Matrix {
        match self {
            PageElement::GlyphRun(g) => g.transform,
            PageElement::Image(i) => i.transform,
            PageElement::Path(p) => p.transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    fn run(text: &str, advances: Vec<f64>) -> GlyphRun {
        GlyphRun {
            node: NodeRef::top_level(0),
            text: text.to_string(),
            advances,
            origin_x: 10.0,
            top: 0.0,
            bottom: 12.0,
            em_size: 12.0,
            space_advance: 3.0,
            transform: MATRIX_IDENTITY,
        }
    }

    #[test]
    fn glyph_edges_accumulate_advances() {
        let g = run("ab", vec![5.0, 6.0]);
        assert_eq!(g.glyph_edges(), vec![10.0, 15.0, 21.0]);
    }

    #[test]
    fn malformed_runs_are_detected() {
        assert!(run("ab", vec![5.0, 6.0]).is_well_formed());
        assert!(!run("", vec![]).is_well_formed());
        assert!(!run("ab", vec![5.0]).is_well_formed());
        let mut g = run("a", vec![5.0]);
        g.em_size = 0.0;
        assert!(!g.is_well_formed());
        let mut g = run("a", vec![f64::NAN]);
        g.em_size = 12.0;
        assert!(!g.is_well_formed());
    }
}
