//! Read-only page snapshots and a builder that assigns node references.

use crate::error::{Result, SomError};
use crate::utils::{BBox, MATRIX_IDENTITY, Matrix, Point, mult_matrix};

use super::element::{Figure, Fill, Geometry, GlyphRun, ImageElement, PageElement, PathElement};
use super::node::{ElementId, NodeRef};

/// Read-only view of one page's elements in markup order.
///
/// The caller guarantees the element list does not change while a
/// reconstruction borrows it.
pub trait PageSource {
    fn len(&self) -> usize;

    fn element(&self, id: ElementId) -> Option<&PageElement>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps a node reference back to the element it was created from.
    fn resolve(&self, node: &NodeRef) -> Result<&PageElement> {
        match self.element(node.element()) {
            Some(el) if el.node() == node => Ok(el),
            _ => Err(SomError::UnknownNode(node.clone())),
        }
    }
}

/// An owned list of page elements.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSnapshot {
    pub elements: Vec<PageElement>,
}

impl PageSnapshot {
    pub fn new(elements: Vec<PageElement>) -> Self {
        Self { elements }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageElement> {
        self.elements.iter()
    }
}

impl PageSource for PageSnapshot {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, id: ElementId) -> Option<&PageElement> {
        self.elements.get(id.0)
    }
}

impl PageSource for [PageElement] {
    fn len(&self) -> usize {
        <[PageElement]>::len(self)
    }

    fn element(&self, id: ElementId) -> Option<&PageElement> {
        self.get(id.0)
    }
}

struct Container {
    transform: Matrix,
    index: u32,
    children: u32,
}

/// Builds a `PageSnapshot`, assigning node references and composing the
/// transforms of nested grouping containers.
///
/// Synthetic text uses a monospace metric: every glyph advances half an em,
/// including spaces.
pub struct SnapshotBuilder {
    elements: Vec<PageElement>,
    stack: Vec<Container>,
    root_children: u32,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            stack: Vec::new(),
            root_children: 0,
        }
    }

    fn current_transform(&self) -> Matrix {
        self.stack
            .last()
            .map(|c| c.transform)
            .unwrap_or(MATRIX_IDENTITY)
    }

    fn next_child(&mut self) -> u32 {
        let counter = match self.stack.last_mut() {
            Some(c) => &mut c.children,
            None => &mut self.root_children,
        };
        let idx = *counter;
        *counter += 1;
        idx
    }

    fn next_node(&mut self) -> NodeRef {
        let own = self.next_child();
        let path = self.stack.iter().map(|c| c.index).chain([own]);
        NodeRef::new(ElementId(self.elements.len()), path)
    }

    /// Opens a grouping container whose transform applies to everything
    /// added until the matching `end_container`.
    pub fn begin_container(&mut self, transform: Matrix) {
        let index = self.next_child();
        let transform = mult_matrix(transform, self.current_transform());
        self.stack.push(Container {
            transform,
            index,
            children: 0,
        });
    }

    pub fn end_container(&mut self) -> Result<()> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or(SomError::ContainerUnderflow)
    }

    /// Adds a monospace glyph run whose alignment box starts at `(x, top)`.
    pub fn add_text(&mut self, text: &str, x: f64, top: f64, em_size: f64) -> NodeRef {
        let advances = vec![em_size * 0.5; text.chars().count()];
        self.add_text_with_advances(text, x, top, em_size, advances, em_size * 0.5)
    }

    pub fn add_text_with_advances(
        &mut self,
        text: &str,
        x: f64,
        top: f64,
        em_size: f64,
        advances: Vec<f64>,
        space_advance: f64,
    ) -> NodeRef {
        let node = self.next_node();
        let transform = self.current_transform();
        self.elements.push(PageElement::GlyphRun(GlyphRun {
            node: node.clone(),
            text: text.to_string(),
            advances,
            origin_x: x,
            top,
            bottom: top + em_size,
            em_size,
            space_advance,
            transform,
        }));
        node
    }

    pub fn add_image(&mut self, bounds: BBox) -> NodeRef {
        let node = self.next_node();
        let transform = self.current_transform();
        self.elements.push(PageElement::Image(ImageElement {
            node: node.clone(),
            bounds,
            transform,
        }));
        node
    }

    /// Adds a stroked straight line.
    pub fn add_line(&mut self, p0: Point, p1: Point) -> NodeRef {
        let geometry = Geometry {
            figures: vec![Figure::line(p0, p1)],
        };
        self.add_path(None, true, geometry, None)
    }

    /// Adds a solid filled rectangle.
    pub fn add_filled_rect(&mut self, rect: BBox) -> NodeRef {
        let geometry = Geometry {
            figures: vec![Figure::rect(rect)],
        };
        self.add_path(Some(Fill::Solid), false, geometry, Some(rect))
    }

    pub fn add_path(
        &mut self,
        fill: Option<Fill>,
        stroke: bool,
        geometry: Geometry,
        bounds: Option<BBox>,
    ) -> NodeRef {
        let node = self.next_node();
        let transform = self.current_transform();
        self.elements.push(PageElement::Path(PathElement {
            node: node.clone(),
            fill,
            stroke,
            geometry,
            bounds,
            transform,
        }));
        node
    }

    pub fn finish(self) -> PageSnapshot {
        PageSnapshot::new(self.elements)
    }
}
