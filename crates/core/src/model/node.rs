//! Node references: opaque handles from semantic boxes back to page elements.

use std::fmt;

use smallvec::SmallVec;

/// Index of an element in a page snapshot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub usize);

/// Page-scoped identifier of a source element.
///
/// Holds the element's index in the snapshot plus the child-index path
/// through any nested grouping containers. The reconstruction core only
/// compares and copies these; it never interprets the path.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRef {
    element: ElementId,
    path: SmallVec<[u32; 4]>,
}

impl NodeRef {
    pub fn new(element: ElementId, path: impl IntoIterator<Item = u32>) -> Self {
        Self {
            element,
            path: path.into_iter().collect(),
        }
    }

    /// A reference to a top-level element with a single-step path.
    ///
    /// Meant for synthetic snapshots. Indices past `u32::MAX` saturate in
    /// the path; the element id keeps the full index.
    pub fn top_level(index: usize) -> Self {
        let step = u32::try_from(index).unwrap_or(u32::MAX);
        Self::new(ElementId(index), [step])
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn path(&self) -> &[u32] {
        &self.path
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.element.0)?;
        for (i, step) in self.path.iter().enumerate() {
            let sep = if i == 0 { '[' } else { '/' };
            write!(f, "{sep}{step}")?;
        }
        if !self.path.is_empty() {
            f.write_str("]")?;
        }
        Ok(())
    }
}
