//! Coordinate and cell primitives shared by every partitioner.
//!
//! These are plain immutable value types. `NRectRange` containment is
//! half-open (`[ll, ur)`) so that adjacent cells never double-count a point
//! sitting on a shared boundary; the global upper bound is handled by the
//! right-open nudge applied in [`crate::bounds`].

use serde::{Deserialize, Serialize};

/// A 2D point with double-precision coordinates.
///
/// Immutable value type; equality is component-wise.
///
/// # Examples
///
/// ```
/// use geoshard::NPoint;
///
/// let p = NPoint::new(2.0, 3.0);
/// assert_eq!(p.x, 2.0);
/// assert_eq!(p, NPoint::new(2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NPoint {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl NPoint {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<geo::Point<f64>> for NPoint {
    fn from(p: geo::Point<f64>) -> Self {
        Self::new(p.x(), p.y())
    }
}

impl From<NPoint> for geo::Point<f64> {
    fn from(p: NPoint) -> Self {
        Self::new(p.x, p.y)
    }
}

/// An axis-aligned rectangle defined by its lower-left and upper-right
/// corners, with `ll.x <= ur.x` and `ll.y <= ur.y`.
///
/// Point containment is half-open: a point on the lower or left edge is
/// inside, a point on the upper or right edge is not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NRectRange {
    /// Lower-left corner
    pub ll: NPoint,
    /// Upper-right corner
    pub ur: NPoint,
}

impl NRectRange {
    /// Create a rectangle from its corners.
    pub fn new(ll: NPoint, ur: NPoint) -> Self {
        debug_assert!(
            ll.x <= ur.x && ll.y <= ur.y,
            "lower-left corner must not exceed upper-right corner"
        );
        Self { ll, ur }
    }

    /// Create a rectangle from raw corner coordinates.
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(NPoint::new(min_x, min_y), NPoint::new(max_x, max_y))
    }

    /// Create a degenerate (zero-area) rectangle at a single point.
    pub fn at_point(p: NPoint) -> Self {
        Self { ll: p, ur: p }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.ur.x - self.ll.x
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.ur.y - self.ll.y
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> NPoint {
        NPoint::new((self.ll.x + self.ur.x) / 2.0, (self.ll.y + self.ur.y) / 2.0)
    }

    /// Half-open containment test for a point.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoshard::{NPoint, NRectRange};
    ///
    /// let r = NRectRange::from_coords(0.0, 0.0, 1.0, 1.0);
    /// assert!(r.contains(&NPoint::new(0.0, 0.0)));
    /// assert!(!r.contains(&NPoint::new(1.0, 0.5)));
    /// ```
    pub fn contains(&self, p: &NPoint) -> bool {
        p.x >= self.ll.x && p.x < self.ur.x && p.y >= self.ll.y && p.y < self.ur.y
    }

    /// Whether `other` lies entirely within this rectangle (closed test on
    /// the shared upper edge, so a cell flush against the boundary counts).
    pub fn contains_range(&self, other: &Self) -> bool {
        other.ll.x >= self.ll.x
            && other.ur.x <= self.ur.x
            && other.ll.y >= self.ll.y
            && other.ur.y <= self.ur.y
    }

    /// Whether this rectangle and `other` share any interior area.
    pub fn intersects(&self, other: &Self) -> bool {
        self.ll.x < other.ur.x
            && other.ll.x < self.ur.x
            && self.ll.y < other.ur.y
            && other.ll.y < self.ur.y
    }

    /// The smallest rectangle containing both `self` and `other`.
    ///
    /// Used to grow a cell's extent to cover geometries whose envelope
    /// reaches beyond the cell's nominal range.
    pub fn extend(&self, other: &Self) -> Self {
        Self::new(
            NPoint::new(self.ll.x.min(other.ll.x), self.ll.y.min(other.ll.y)),
            NPoint::new(self.ur.x.max(other.ur.x), self.ur.y.max(other.ur.y)),
        )
    }
}

impl From<geo::Rect<f64>> for NRectRange {
    fn from(r: geo::Rect<f64>) -> Self {
        Self::from_coords(r.min().x, r.min().y, r.max().x, r.max().y)
    }
}

impl From<NRectRange> for geo::Rect<f64> {
    fn from(r: NRectRange) -> Self {
        Self::new(
            geo::coord! { x: r.ll.x, y: r.ll.y },
            geo::coord! { x: r.ur.x, y: r.ur.y },
        )
    }
}

/// A partition cell: an id, the nominal region assigned to the partition,
/// and the extent actually covered by its contents.
///
/// The extent starts out equal to the range and only grows when a geometry's
/// envelope reaches beyond the nominal range. It is independent bookkeeping:
/// `extent ⊇ range` is not required, and routing never consults it. Downstream
/// join logic uses it to decide whether a query may match content physically
/// stored outside its nominal cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Partition id.
    pub id: usize,
    /// The nominal region assigned to this partition.
    pub range: NRectRange,
    /// The union of the envelopes of all geometries assigned to this cell.
    pub extent: NRectRange,
}

impl Cell {
    /// Create a cell whose extent equals its nominal range.
    pub fn new(id: usize, range: NRectRange) -> Self {
        Self {
            id,
            range,
            extent: range,
        }
    }

    /// Create a cell with an explicit extent.
    pub fn with_extent(id: usize, range: NRectRange, extent: NRectRange) -> Self {
        Self { id, range, extent }
    }
}
