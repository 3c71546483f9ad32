//! Geometric helpers shared by every reconstruction phase.
//!
//! Provides:
//! - Point and Matrix aliases with the affine operations used on page input
//! - `BBox`, a top-down axis-aligned rectangle (y grows downward)
//! - the `HasBBox` trait implemented by every semantic box

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Multiplies two matrices in row-vector convention: result = m1 * m0.
/// The result applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle.
///
/// The result is not a rotated rectangle but the axis-aligned rectangle that
/// tightly fits the outside of the transformed corners.
pub fn apply_matrix_rect(m: Matrix, rect: BBox) -> BBox {
    get_bound([
        apply_matrix_pt(m, (rect.x0, rect.top)),
        apply_matrix_pt(m, (rect.x1, rect.top)),
        apply_matrix_pt(m, (rect.x1, rect.bottom)),
        apply_matrix_pt(m, (rect.x0, rect.bottom)),
    ])
}

/// Length of the transformed unit x vector, used to scale horizontal advances.
pub fn matrix_x_scale(m: Matrix) -> f64 {
    let (a, b, ..) = m;
    (a * a + b * b).sqrt()
}

/// Returns true if every component of the matrix is finite.
pub fn matrix_is_finite(m: Matrix) -> bool {
    let (a, b, c, d, e, f) = m;
    [a, b, c, d, e, f].iter().all(|v| v.is_finite())
}

/// Compute the bounding box of a set of points.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> BBox {
    let mut bbox = BBox::EMPTY;
    for (x, y) in pts {
        bbox.x0 = bbox.x0.min(x);
        bbox.top = bbox.top.min(y);
        bbox.x1 = bbox.x1.max(x);
        bbox.bottom = bbox.bottom.max(y);
    }
    bbox
}

/// Axis-aligned rectangle in page space; `top < bottom` for a non-empty box.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    /// The empty rectangle: union identity, intersects nothing.
    pub const EMPTY: BBox = BBox {
        x0: f64::INFINITY,
        top: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        bottom: f64::NEG_INFINITY,
    };

    pub const fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.top > self.bottom
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.top.is_finite() && self.x1.is_finite() && self.bottom.is_finite()
    }

    pub fn center(&self) -> Point {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow the rectangle by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inflate(&self, dx: f64, dy: f64) -> BBox {
        BBox {
            x0: self.x0 - dx,
            top: self.top - dy,
            x1: self.x1 + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Closed-interval intersection test: touching rectangles intersect.
    pub fn intersects(&self, other: &BBox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x0 <= other.x1
            && other.x0 <= self.x1
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// True if `other` lies inside `self`, allowing `tolerance` on every side.
    pub fn contains(&self, other: &BBox, tolerance: f64) -> bool {
        other.x0 >= self.x0 - tolerance
            && other.x1 <= self.x1 + tolerance
            && other.top >= self.top - tolerance
            && other.bottom <= self.bottom + tolerance
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.0 >= self.x0 && p.0 <= self.x1 && p.1 >= self.top && p.1 <= self.bottom
    }

    /// True if the vertical extents overlap with positive length.
    pub fn is_voverlap(&self, other: &BBox) -> bool {
        self.top < other.bottom && other.top < self.bottom
    }

    /// True if the horizontal extents overlap with positive length.
    pub fn is_hoverlap(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }
}

/// Trait for objects that have a bounding box.
pub trait HasBBox {
    fn bbox(&self) -> BBox;

    fn x0(&self) -> f64 {
        self.bbox().x0
    }

    fn top(&self) -> f64 {
        self.bbox().top
    }

    fn x1(&self) -> f64 {
        self.bbox().x1
    }

    fn bottom(&self) -> f64 {
        self.bbox().bottom
    }

    fn width(&self) -> f64 {
        self.bbox().width()
    }

    fn height(&self) -> f64 {
        self.bbox().height()
    }
}

impl HasBBox for BBox {
    fn bbox(&self) -> BBox {
        *self
    }
}
