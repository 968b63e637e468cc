//! Global data bounds: the first pass of every partitioner build.
//!
//! The scan folds every record's envelope into a running min/max, which makes
//! it an associative, commutative reduction: the execution engine may compute
//! bounds per shard with [`GlobalBounds::observe`] and combine the shard
//! results pairwise with [`GlobalBounds::merge`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GeoShardError, Result};
use crate::key::SpatialKey;
use crate::types::{NPoint, NRectRange};

/// The global bounding box of a record collection.
///
/// `max_x`/`max_y` are raw maxima as scanned; partitioners apply the
/// right-open nudge through [`GlobalBounds::expanded_by`] so that no valid
/// point falls exactly on the upper boundary of the last row or column of
/// cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalBounds {
    /// Minimum x coordinate (inclusive).
    pub min_x: f64,
    /// Maximum x coordinate.
    pub max_x: f64,
    /// Minimum y coordinate (inclusive).
    pub min_y: f64,
    /// Maximum y coordinate.
    pub max_y: f64,
}

impl GlobalBounds {
    /// Create bounds from explicit coordinates.
    ///
    /// Fails with [`GeoShardError::InvalidConfig`] if a minimum exceeds the
    /// corresponding maximum or any coordinate is not finite.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Result<Self> {
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
            return Err(GeoShardError::InvalidConfig(format!(
                "global bounds must be finite, got [{min_x}, {max_x}] x [{min_y}, {max_y}]"
            )));
        }
        if min_x > max_x || min_y > max_y {
            return Err(GeoShardError::InvalidConfig(format!(
                "global bounds minima exceed maxima: [{min_x}, {max_x}] x [{min_y}, {max_y}]"
            )));
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Scan a record collection and return its bounds.
    ///
    /// Point geometries contribute their centroid, extended geometries their
    /// full envelope (a point's envelope is the point itself, so folding
    /// envelopes covers both). Fails with [`GeoShardError::EmptyInput`] on an
    /// empty collection.
    pub fn from_keys<K: SpatialKey>(keys: &[K]) -> Result<Self> {
        let mut iter = keys.iter();
        let first = iter.next().ok_or(GeoShardError::EmptyInput)?;
        let mut bounds = Self::from_envelope(&first.envelope());
        for key in iter {
            bounds.observe(key);
        }
        debug!(
            "scanned {} records: bounds [{}, {}] x [{}, {}]",
            keys.len(),
            bounds.min_x,
            bounds.max_x,
            bounds.min_y,
            bounds.max_y
        );
        Ok(bounds)
    }

    fn from_envelope(env: &NRectRange) -> Self {
        Self {
            min_x: env.ll.x,
            max_x: env.ur.x,
            min_y: env.ll.y,
            max_y: env.ur.y,
        }
    }

    /// Fold one record into the running bounds.
    pub fn observe<K: SpatialKey>(&mut self, key: &K) {
        let env = key.envelope();
        self.min_x = self.min_x.min(env.ll.x);
        self.max_x = self.max_x.max(env.ur.x);
        self.min_y = self.min_y.min(env.ll.y);
        self.max_y = self.max_y.max(env.ur.y);
    }

    /// Combine two partial bounds. Associative and commutative, so shard
    /// results may be merged pairwise in any order.
    pub fn merge(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Apply the right-open nudge: push both maxima outward by one cell unit
    /// so the last row and column of cells are closed over the data.
    pub fn expanded_by(self, unit: f64) -> Self {
        Self {
            max_x: self.max_x + unit,
            max_y: self.max_y + unit,
            ..self
        }
    }

    /// Width of the bounds.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounds.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Half-open containment test against these bounds.
    pub fn contains(&self, p: &NPoint) -> bool {
        p.x >= self.min_x && p.x < self.max_x && p.y >= self.min_y && p.y < self.max_y
    }

    /// The bounds as a rectangle.
    pub fn to_range(self) -> NRectRange {
        NRectRange::from_coords(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}
