//! Fixed-resolution cost histogram for the BSP partitioner.
//!
//! The histogram tiles the (nudged, cell-aligned) global bounds with square
//! cells of side `side_length` and counts records per cell. It is built in
//! one pass and read-only afterwards; per-shard histograms over the same grid
//! can be combined with [`CellHistogram::merge`], making the build an
//! associative reduction like the bounds scan.

use log::debug;

use crate::bounds::GlobalBounds;
use crate::error::{GeoShardError, Result};
use crate::key::SpatialKey;
use crate::types::{NPoint, NRectRange};

/// Tolerance for mapping cell-aligned coordinates back to integer indices.
const ALIGN_EPS: f64 = 1e-9;

/// A rectangular block of histogram cells, in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellSpan {
    pub(crate) x0: usize,
    pub(crate) y0: usize,
    pub(crate) nx: usize,
    pub(crate) ny: usize,
}

impl CellSpan {
    pub(crate) fn cell_count(&self) -> usize {
        self.nx * self.ny
    }
}

/// A dense grid of record counts over the global bounds.
///
/// Cell `(x, y)` covers
/// `[origin.x + x*side, origin.x + (x+1)*side) x [origin.y + y*side, ...)`
/// and has linear index `y * num_x + x`. The cells tile the aligned bounds
/// with no gaps and no overlaps.
#[derive(Debug, Clone, PartialEq)]
pub struct CellHistogram {
    origin: NPoint,
    side_length: f64,
    num_x: usize,
    num_y: usize,
    counts: Vec<usize>,
}

impl CellHistogram {
    /// Create an empty histogram covering `bounds` (already nudged).
    ///
    /// The cell counts are `ceil(extent / side_length)` per axis, at least 1,
    /// so the grid may reach slightly beyond `bounds` on the upper side; the
    /// coverage invariant is exact with respect to [`CellHistogram::bounds`].
    pub fn new(bounds: &GlobalBounds, side_length: f64) -> Result<Self> {
        if !(side_length.is_finite() && side_length > 0.0) {
            return Err(GeoShardError::InvalidConfig(format!(
                "histogram side length must be positive and finite, got {side_length}"
            )));
        }
        let num_x = (bounds.width() / side_length).ceil().max(1.0) as usize;
        let num_y = (bounds.height() / side_length).ceil().max(1.0) as usize;
        Ok(Self {
            origin: NPoint::new(bounds.min_x, bounds.min_y),
            side_length,
            num_x,
            num_y,
            counts: vec![0; num_x * num_y],
        })
    }

    /// Build a histogram from a record collection in one pass.
    ///
    /// With `points_only` every record increments exactly the cell holding its
    /// centroid; otherwise every cell overlapped by the record's envelope is
    /// incremented, so boundary-straddling geometries are counted toward each
    /// cell they may later be replicated into.
    pub fn from_keys<K: SpatialKey>(
        bounds: &GlobalBounds,
        side_length: f64,
        points_only: bool,
        keys: &[K],
    ) -> Result<Self> {
        let mut hist = Self::new(bounds, side_length)?;
        for key in keys {
            if points_only {
                hist.observe_centroid(&key.centroid())?;
            } else {
                hist.observe_envelope(&key.envelope())?;
            }
        }
        debug!(
            "histogram: {}x{} cells of side {}, total count {}",
            hist.num_x,
            hist.num_y,
            hist.side_length,
            hist.total()
        );
        Ok(hist)
    }

    /// Increment the cell holding `p`.
    pub fn observe_centroid(&mut self, p: &NPoint) -> Result<()> {
        let idx = self.cell_index(p)?;
        self.counts[idx] += 1;
        Ok(())
    }

    /// Increment every cell overlapped by `env`.
    ///
    /// The part of `env` reaching past the grid edge is clamped away, but an
    /// envelope entirely outside the grid is a bounds violation, the same
    /// policy [`CellHistogram::observe_centroid`] applies to points.
    pub fn observe_envelope(&mut self, env: &NRectRange) -> Result<()> {
        let bounds = self.bounds();
        if env.ur.x < bounds.ll.x
            || env.ll.x >= bounds.ur.x
            || env.ur.y < bounds.ll.y
            || env.ll.y >= bounds.ur.y
        {
            let center = env.center();
            return Err(GeoShardError::OutOfBounds {
                x: center.x,
                y: center.y,
                min_x: bounds.ll.x,
                max_x: bounds.ur.x,
                min_y: bounds.ll.y,
                max_y: bounds.ur.y,
            });
        }
        let (x0, x1) = self.axis_overlap(env.ll.x, env.ur.x, self.origin.x, self.num_x);
        let (y0, y1) = self.axis_overlap(env.ll.y, env.ur.y, self.origin.y, self.num_y);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.counts[y * self.num_x + x] += 1;
            }
        }
        Ok(())
    }

    fn axis_overlap(&self, lo: f64, hi: f64, origin: f64, num: usize) -> (usize, usize) {
        let first = ((lo - origin) / self.side_length).floor().max(0.0) as usize;
        let last = ((hi - origin) / self.side_length).floor().max(0.0) as usize;
        (first.min(num - 1), last.min(num - 1))
    }

    /// Combine per-shard histograms built over identical grids.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.origin != other.origin
            || self.side_length != other.side_length
            || self.num_x != other.num_x
            || self.num_y != other.num_y
        {
            return Err(GeoShardError::InvalidConfig(
                "cannot merge histograms built over different grids".into(),
            ));
        }
        for (count, add) in self.counts.iter_mut().zip(&other.counts) {
            *count += add;
        }
        Ok(())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the histogram has no cells. Never true for a constructed
    /// histogram; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Cells along the x axis.
    pub fn num_x(&self) -> usize {
        self.num_x
    }

    /// Cells along the y axis.
    pub fn num_y(&self) -> usize {
        self.num_y
    }

    /// The configured cell side length.
    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    /// The cell-aligned rectangle tiled by the histogram.
    pub fn bounds(&self) -> NRectRange {
        NRectRange::from_coords(
            self.origin.x,
            self.origin.y,
            self.origin.x + self.num_x as f64 * self.side_length,
            self.origin.y + self.num_y as f64 * self.side_length,
        )
    }

    /// Count for one cell.
    pub fn count(&self, idx: usize) -> usize {
        self.counts[idx]
    }

    /// Sum of all cell counts.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Linear index of the cell holding `p`, or a bounds violation if `p`
    /// lies outside the grid.
    pub fn cell_index(&self, p: &NPoint) -> Result<usize> {
        let bounds = self.bounds();
        if !bounds.contains(p) {
            return Err(GeoShardError::OutOfBounds {
                x: p.x,
                y: p.y,
                min_x: bounds.ll.x,
                max_x: bounds.ur.x,
                min_y: bounds.ll.y,
                max_y: bounds.ur.y,
            });
        }
        let dx = ((p.x - self.origin.x) / self.side_length).floor() as usize;
        let dy = ((p.y - self.origin.y) / self.side_length).floor() as usize;
        // floor can land on num_x for points epsilon-close to the upper edge
        let dx = dx.min(self.num_x - 1);
        let dy = dy.min(self.num_y - 1);
        Ok(dy * self.num_x + dx)
    }

    /// The rectangle covered by cell `idx`.
    pub fn cell_range(&self, idx: usize) -> NRectRange {
        let x = idx % self.num_x;
        let y = idx / self.num_x;
        self.range_of(x, y, 1, 1)
    }

    /// Indices of every cell entirely contained in `range`.
    ///
    /// Part of the diagnostics contract: tests use this to check coverage and
    /// cost invariants, and the region merge uses the span form internally.
    pub fn cells_in(&self, range: &NRectRange) -> Vec<usize> {
        let span = self.span_of(range);
        let mut out = Vec::with_capacity(span.cell_count());
        for y in span.y0..span.y0 + span.ny {
            for x in span.x0..span.x0 + span.nx {
                out.push(y * self.num_x + x);
            }
        }
        out
    }

    /// Iterate over `(index, cell range, count)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, NRectRange, usize)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(idx, &count)| (idx, self.cell_range(idx), count))
    }

    /// The whole grid as a span.
    pub(crate) fn full_span(&self) -> CellSpan {
        CellSpan {
            x0: 0,
            y0: 0,
            nx: self.num_x,
            ny: self.num_y,
        }
    }

    /// The largest block of cells entirely contained in `range`, clamped to
    /// the grid. Cell-aligned inputs map back exactly.
    pub(crate) fn span_of(&self, range: &NRectRange) -> CellSpan {
        let rel = |v: f64, origin: f64| (v - origin) / self.side_length;
        let x0 = (rel(range.ll.x, self.origin.x) - ALIGN_EPS).ceil().max(0.0) as usize;
        let y0 = (rel(range.ll.y, self.origin.y) - ALIGN_EPS).ceil().max(0.0) as usize;
        let x1 = ((rel(range.ur.x, self.origin.x) + ALIGN_EPS).floor().max(0.0) as usize)
            .min(self.num_x);
        let y1 = ((rel(range.ur.y, self.origin.y) + ALIGN_EPS).floor().max(0.0) as usize)
            .min(self.num_y);
        CellSpan {
            x0: x0.min(self.num_x),
            y0: y0.min(self.num_y),
            nx: x1.saturating_sub(x0),
            ny: y1.saturating_sub(y0),
        }
    }

    /// Aggregate count over a span.
    pub(crate) fn span_cost(&self, span: &CellSpan) -> usize {
        let mut cost = 0;
        for y in span.y0..span.y0 + span.ny {
            let row = y * self.num_x;
            for x in span.x0..span.x0 + span.nx {
                cost += self.counts[row + x];
            }
        }
        cost
    }

    /// The rectangle covered by a block of cells.
    pub(crate) fn range_of_span(&self, span: &CellSpan) -> NRectRange {
        self.range_of(span.x0, span.y0, span.nx, span.ny)
    }

    fn range_of(&self, x: usize, y: usize, nx: usize, ny: usize) -> NRectRange {
        NRectRange::from_coords(
            self.origin.x + x as f64 * self.side_length,
            self.origin.y + y as f64 * self.side_length,
            self.origin.x + (x + nx) as f64 * self.side_length,
            self.origin.y + (y + ny) as f64 * self.side_length,
        )
    }
}
