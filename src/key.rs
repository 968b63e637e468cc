//! The record contract partitioners route by.
//!
//! The geometry predicate library itself is an external collaborator; the
//! partitioners only ever ask a record for its representative point and its
//! axis-aligned bounding rectangle. Implementations are provided for the
//! crate's own primitives, for the `geo` types most commonly stored, and for
//! `(geometry, payload)` pairs so full records route without unwrapping.

use geo::{BoundingRect, Centroid};

use crate::types::{NPoint, NRectRange};

/// A value that can be routed by a spatial partitioner.
pub trait SpatialKey {
    /// Representative point of the geometry, used for partition routing.
    fn centroid(&self) -> NPoint;

    /// Axis-aligned bounding rectangle of the geometry.
    fn envelope(&self) -> NRectRange;
}

impl SpatialKey for NPoint {
    fn centroid(&self) -> NPoint {
        *self
    }

    fn envelope(&self) -> NRectRange {
        NRectRange::at_point(*self)
    }
}

impl SpatialKey for NRectRange {
    fn centroid(&self) -> NPoint {
        self.center()
    }

    fn envelope(&self) -> NRectRange {
        *self
    }
}

impl SpatialKey for geo::Point<f64> {
    fn centroid(&self) -> NPoint {
        NPoint::new(self.x(), self.y())
    }

    fn envelope(&self) -> NRectRange {
        NRectRange::at_point(NPoint::new(self.x(), self.y()))
    }
}

impl SpatialKey for geo::Rect<f64> {
    fn centroid(&self) -> NPoint {
        NPoint::new(self.center().x, self.center().y)
    }

    fn envelope(&self) -> NRectRange {
        NRectRange::from(*self)
    }
}

/// Polygons route by their geometric centroid and cover their bounding
/// rectangle. A polygon with no coordinates degenerates to the origin.
impl SpatialKey for geo::Polygon<f64> {
    fn centroid(&self) -> NPoint {
        Centroid::centroid(self)
            .map(NPoint::from)
            .unwrap_or_else(|| self.envelope().center())
    }

    fn envelope(&self) -> NRectRange {
        BoundingRect::bounding_rect(self)
            .map(NRectRange::from)
            .unwrap_or_else(|| NRectRange::at_point(NPoint::new(0.0, 0.0)))
    }
}

/// `(geometry, payload)` records route by their geometry.
impl<G: SpatialKey, P> SpatialKey for (G, P) {
    fn centroid(&self) -> NPoint {
        self.0.centroid()
    }

    fn envelope(&self) -> NRectRange {
        self.0.envelope()
    }
}

impl<K: SpatialKey + ?Sized> SpatialKey for &K {
    fn centroid(&self) -> NPoint {
        (**self).centroid()
    }

    fn envelope(&self) -> NRectRange {
        (**self).envelope()
    }
}
