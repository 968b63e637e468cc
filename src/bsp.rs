//! Cost-balanced binary space partitioning.
//!
//! Where the uniform grid spends partitions on empty space, the BSP
//! partitioner spends them on records: it builds a fine-grained cost
//! histogram over the data, then recursively bisects the bounding box along
//! whichever axis and position divides the cost most evenly, stopping once a
//! region's cost fits under `max_cost_per_partition`. Dense areas end up with
//! many small partitions, sparse areas with few large ones.
//!
//! The histogram pass is an associative reduction and can run sharded; the
//! region merge runs once, locally, over the (small) histogram array after
//! the reduction completes.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bounds::GlobalBounds;
use crate::config::BspConfig;
use crate::error::{GeoShardError, Result};
use crate::histogram::{CellHistogram, CellSpan};
use crate::key::SpatialKey;
use crate::partitioner::SpatialPartitioner;
use crate::types::{Cell, NRectRange};

/// Sentinel for a histogram cell not covered by any region. Routing through
/// such a cell raises [`GeoShardError::MissingRegion`].
const UNASSIGNED: usize = usize::MAX;

/// A final BSP partition: a rectangle spanning one or more contiguous
/// histogram cells, its aggregated cost, and its partition id.
///
/// Plain data with no back-reference to the record collection; the execution
/// engine owns reattachment at its shuffle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartitionRegion {
    /// Sequential partition id.
    pub id: usize,
    /// The region's rectangle, aligned to histogram cell boundaries.
    pub range: NRectRange,
    /// Aggregated histogram cost (record count) inside the region.
    pub cost: usize,
}

/// Cost-balanced BSP partitioner.
///
/// Immutable after construction; the region array is owned exclusively for
/// the partitioner's lifetime and safe to share read-only across concurrent
/// lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct BsPartitioner {
    config: BspConfig,
    side_length: f64,
    histogram: CellHistogram,
    regions: Vec<PartitionRegion>,
    cell_to_region: Vec<usize>,
}

impl BsPartitioner {
    /// Scan a record collection for bounds and build the partitioner.
    pub fn from_keys<K: SpatialKey>(keys: &[K], config: &BspConfig) -> Result<Self> {
        let bounds = GlobalBounds::from_keys(keys)?;
        Self::new(bounds, keys, config)
    }

    /// Build over explicit raw bounds; `keys` still feed the cost histogram.
    pub fn new<K: SpatialKey>(bounds: GlobalBounds, keys: &[K], config: &BspConfig) -> Result<Self> {
        config.validate()?;
        let side_length = effective_side_length(&bounds, config);
        let nudged = bounds.expanded_by(side_length);
        let histogram =
            CellHistogram::from_keys(&nudged, side_length, config.points_only, keys)?;
        Self::from_histogram(histogram, *config)
    }

    /// Build from a pre-merged histogram (for example, one combined from
    /// per-shard histograms with [`CellHistogram::merge`]).
    pub fn from_histogram(histogram: CellHistogram, config: BspConfig) -> Result<Self> {
        config.validate()?;
        let side_length = histogram.side_length();
        let mut spans = Vec::new();
        split_span(
            &histogram,
            histogram.full_span(),
            config.max_cost_per_partition,
            &mut spans,
        );
        let regions: Vec<PartitionRegion> = spans
            .iter()
            .enumerate()
            .map(|(id, span)| PartitionRegion {
                id,
                range: histogram.range_of_span(span),
                cost: histogram.span_cost(span),
            })
            .collect();

        let mut cell_to_region = vec![UNASSIGNED; histogram.len()];
        for (id, span) in spans.iter().enumerate() {
            for cell in span_cells(&histogram, span) {
                debug_assert_eq!(cell_to_region[cell], UNASSIGNED, "regions overlap");
                cell_to_region[cell] = id;
            }
        }
        debug!(
            "bsp partitioner: {} regions over {} histogram cells, max cost {}",
            regions.len(),
            histogram.len(),
            config.max_cost_per_partition
        );
        Ok(Self {
            config,
            side_length,
            histogram,
            regions,
            cell_to_region,
        })
    }

    /// The configuration the partitioner was built with.
    pub fn config(&self) -> &BspConfig {
        &self.config
    }

    /// The histogram side length actually used. Larger than the configured
    /// one when the cell threshold forced coarsening.
    pub fn side_length(&self) -> f64 {
        self.side_length
    }

    /// The underlying cost histogram (diagnostics contract).
    pub fn histogram(&self) -> &CellHistogram {
        &self.histogram
    }

    /// The final region list with aggregate costs (diagnostics contract).
    pub fn regions(&self) -> &[PartitionRegion] {
        &self.regions
    }

    fn check_id(&self, id: usize) -> Result<()> {
        if id >= self.regions.len() {
            return Err(GeoShardError::PartitionIdOutOfRange {
                id,
                num_partitions: self.regions.len(),
            });
        }
        Ok(())
    }
}

impl SpatialPartitioner for BsPartitioner {
    fn num_partitions(&self) -> usize {
        self.regions.len()
    }

    fn partition_bounds(&self, id: usize) -> Result<Cell> {
        self.check_id(id)?;
        Ok(Cell::new(id, self.regions[id].range))
    }

    fn partition_extent(&self, id: usize) -> Result<NRectRange> {
        self.check_id(id)?;
        Ok(self.regions[id].range)
    }

    /// Route a record: find the histogram cell holding its centroid, then the
    /// region covering that cell. Regions are disjoint and tile the bounds,
    /// so exactly one match exists; a missing region is a construction bug
    /// surfaced as [`GeoShardError::MissingRegion`], never retried.
    fn partition<K: SpatialKey>(&self, key: &K) -> Result<usize> {
        let cell = self.histogram.cell_index(&key.centroid())?;
        match self.cell_to_region[cell] {
            UNASSIGNED => Err(GeoShardError::MissingRegion { cell }),
            region => Ok(region),
        }
    }

    fn query_partitions(&self, range: &NRectRange) -> Vec<usize> {
        self.regions
            .iter()
            .filter(|region| region.range.intersects(range))
            .map(|region| region.id)
            .collect()
    }
}

/// Coarsen the configured side length until the nominal grid fits under the
/// cell threshold. Doubling preserves determinism and terminates because the
/// cell count shrinks quadratically.
fn effective_side_length(bounds: &GlobalBounds, config: &BspConfig) -> f64 {
    let mut side = config.side_length;
    loop {
        let nudged = bounds.expanded_by(side);
        let num_x = (nudged.width() / side).ceil().max(1.0);
        let num_y = (nudged.height() / side).ceil().max(1.0);
        if (num_x * num_y) as usize <= config.num_cell_threshold {
            if side != config.side_length {
                warn!(
                    "histogram would exceed {} cells; side length coarsened from {} to {}",
                    config.num_cell_threshold, config.side_length, side
                );
            }
            return side;
        }
        side *= 2.0;
    }
}

/// Recursively bisect `span` until its cost fits the bound. A single-cell
/// span is always final regardless of cost, which guarantees termination on
/// hot spots.
fn split_span(hist: &CellHistogram, span: CellSpan, max_cost: usize, out: &mut Vec<CellSpan>) {
    let cost = hist.span_cost(&span);
    if cost <= max_cost || span.cell_count() <= 1 {
        out.push(span);
        return;
    }
    let (low, high) = best_split(hist, &span);
    split_span(hist, low, max_cost, out);
    split_span(hist, high, max_cost, out);
}

/// Choose the axis and cell boundary dividing the span's cost most evenly.
/// Candidates are every interior cell boundary on both axes; ties go to the
/// x axis and the lower position, keeping the build deterministic.
fn best_split(hist: &CellHistogram, span: &CellSpan) -> (CellSpan, CellSpan) {
    let total = hist.span_cost(span) as i64;
    let mut best: Option<(i64, bool, usize)> = None;

    let mut consider = |diff: i64, vertical: bool, at: usize| {
        if best.is_none_or(|(d, _, _)| diff < d) {
            best = Some((diff, vertical, at));
        }
    };

    let mut acc = 0i64;
    for dx in 0..span.nx.saturating_sub(1) {
        let column = CellSpan {
            x0: span.x0 + dx,
            y0: span.y0,
            nx: 1,
            ny: span.ny,
        };
        acc += hist.span_cost(&column) as i64;
        consider((2 * acc - total).abs(), true, dx + 1);
    }
    let mut acc = 0i64;
    for dy in 0..span.ny.saturating_sub(1) {
        let row = CellSpan {
            x0: span.x0,
            y0: span.y0 + dy,
            nx: span.nx,
            ny: 1,
        };
        acc += hist.span_cost(&row) as i64;
        consider((2 * acc - total).abs(), false, dy + 1);
    }

    // span.cell_count() > 1, so at least one axis offers a candidate
    let (_, vertical, at) = best.expect("splittable span must have a candidate boundary");
    if vertical {
        (
            CellSpan { nx: at, ..*span },
            CellSpan {
                x0: span.x0 + at,
                nx: span.nx - at,
                ..*span
            },
        )
    } else {
        (
            CellSpan { ny: at, ..*span },
            CellSpan {
                y0: span.y0 + at,
                ny: span.ny - at,
                ..*span
            },
        )
    }
}

fn span_cells(hist: &CellHistogram, span: &CellSpan) -> Vec<usize> {
    let mut cells = Vec::with_capacity(span.cell_count());
    for y in span.y0..span.y0 + span.ny {
        for x in span.x0..span.x0 + span.nx {
            cells.push(y * hist.num_x() + x);
        }
    }
    cells
}
