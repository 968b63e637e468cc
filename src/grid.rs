//! Uniform grid partitioning.
//!
//! Divides the global bounds into `partitions_per_dimension^2` equal cells
//! and routes every record by the cell holding its centroid. Cheap to build
//! (one bounds pass, plus an optional extent pass) but blind to density:
//! empty regions still consume partitions and dense regions overload them.
//! [`crate::bsp::BsPartitioner`] trades build cost for balance.

use log::debug;
use rustc_hash::FxHashMap;

use crate::bounds::GlobalBounds;
use crate::config::GridConfig;
use crate::error::{GeoShardError, Result};
use crate::key::SpatialKey;
use crate::partitioner::SpatialPartitioner;
use crate::types::{Cell, NPoint, NRectRange};

/// Partitioner assigning records to a `p x p` grid of equal cells.
///
/// Immutable after construction; routing is a pure arithmetic lookup and may
/// be called concurrently from any number of workers.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGridPartitioner {
    bounds: GlobalBounds,
    partitions_per_dimension: usize,
    x_length: f64,
    y_length: f64,
    cells: Vec<Cell>,
}

impl SpatialGridPartitioner {
    /// Build a grid over explicit raw bounds (the right-open nudge is applied
    /// here, one grid unit per axis).
    pub fn new(bounds: GlobalBounds, config: &GridConfig) -> Result<Self> {
        config.validate()?;
        let ppd = config.partitions_per_dimension;
        // a collapsed axis still gets cells of positive size
        let x_unit = if bounds.width() > 0.0 {
            bounds.width() / ppd as f64
        } else {
            1.0
        };
        let y_unit = if bounds.height() > 0.0 {
            bounds.height() / ppd as f64
        } else {
            1.0
        };
        let mut bounds = bounds;
        bounds.max_x += x_unit;
        bounds.max_y += y_unit;

        let x_length = bounds.width() / ppd as f64;
        let y_length = bounds.height() / ppd as f64;
        let cells = (0..ppd * ppd)
            .map(|id| Cell::new(id, cell_range(&bounds, ppd, x_length, y_length, id)))
            .collect();
        debug!(
            "grid partitioner: {ppd}x{ppd} cells of {x_length} x {y_length} over \
             [{}, {}) x [{}, {})",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        );
        Ok(Self {
            bounds,
            partitions_per_dimension: ppd,
            x_length,
            y_length,
            cells,
        })
    }

    /// Scan a record collection for bounds and build the grid. When the
    /// configuration asks for extents, a second pass folds each record's
    /// envelope into the extent of the cell its centroid routes to.
    ///
    /// The extent pass never changes routing; it only tells downstream join
    /// logic that a cell may physically hold geometry reaching beyond its
    /// nominal square.
    pub fn from_keys<K: SpatialKey>(keys: &[K], config: &GridConfig) -> Result<Self> {
        let bounds = GlobalBounds::from_keys(keys)?;
        let mut partitioner = Self::new(bounds, config)?;
        if config.with_extent {
            partitioner.compute_extents(keys)?;
        }
        Ok(partitioner)
    }

    fn compute_extents<K: SpatialKey>(&mut self, keys: &[K]) -> Result<()> {
        let mut extents: FxHashMap<usize, NRectRange> = FxHashMap::default();
        for key in keys {
            let id = self.cell_id(&key.centroid())?;
            let env = key.envelope();
            extents
                .entry(id)
                .and_modify(|extent| *extent = extent.extend(&env))
                .or_insert(env);
        }
        for (id, extent) in extents {
            self.cells[id].extent = extent;
        }
        Ok(())
    }

    /// Number of partitions along each axis.
    pub fn partitions_per_dimension(&self) -> usize {
        self.partitions_per_dimension
    }

    /// The nudged global bounds the grid covers.
    pub fn bounds(&self) -> GlobalBounds {
        self.bounds
    }

    /// Cell id for a coordinate: `floor` division per axis, row-major.
    ///
    /// Fails with [`GeoShardError::OutOfBounds`] for coordinates outside the
    /// scanned bounds. That means the caller's inputs changed after the
    /// bounds pass, which is a data inconsistency, not a routing decision.
    pub fn cell_id(&self, p: &NPoint) -> Result<usize> {
        if !self.bounds.contains(p) {
            return Err(GeoShardError::OutOfBounds {
                x: p.x,
                y: p.y,
                min_x: self.bounds.min_x,
                max_x: self.bounds.max_x,
                min_y: self.bounds.min_y,
                max_y: self.bounds.max_y,
            });
        }
        let ppd = self.partitions_per_dimension;
        let dx = (((p.x - self.bounds.min_x) / self.x_length).floor() as usize).min(ppd - 1);
        let dy = (((p.y - self.bounds.min_y) / self.y_length).floor() as usize).min(ppd - 1);
        Ok(dy * ppd + dx)
    }

    /// Inverse mapping: reconstruct a cell's rectangle from its id. Pure
    /// function of the grid geometry.
    pub fn cell_bounds(&self, id: usize) -> Result<NRectRange> {
        self.check_id(id)?;
        Ok(cell_range(
            &self.bounds,
            self.partitions_per_dimension,
            self.x_length,
            self.y_length,
            id,
        ))
    }

    fn check_id(&self, id: usize) -> Result<()> {
        if id >= self.cells.len() {
            return Err(GeoShardError::PartitionIdOutOfRange {
                id,
                num_partitions: self.cells.len(),
            });
        }
        Ok(())
    }
}

fn cell_range(
    bounds: &GlobalBounds,
    ppd: usize,
    x_length: f64,
    y_length: f64,
    id: usize,
) -> NRectRange {
    let col = id % ppd;
    let row = id / ppd;
    // the outermost row/column closes exactly on the bounds, so the cells
    // tile the bounding box without a floating-point sliver
    let max_x = if col + 1 == ppd {
        bounds.max_x
    } else {
        bounds.min_x + (col + 1) as f64 * x_length
    };
    let max_y = if row + 1 == ppd {
        bounds.max_y
    } else {
        bounds.min_y + (row + 1) as f64 * y_length
    };
    NRectRange::from_coords(
        bounds.min_x + col as f64 * x_length,
        bounds.min_y + row as f64 * y_length,
        max_x,
        max_y,
    )
}

impl SpatialPartitioner for SpatialGridPartitioner {
    fn num_partitions(&self) -> usize {
        self.cells.len()
    }

    fn partition_bounds(&self, id: usize) -> Result<Cell> {
        self.check_id(id)?;
        Ok(self.cells[id])
    }

    fn partition_extent(&self, id: usize) -> Result<NRectRange> {
        self.check_id(id)?;
        Ok(self.cells[id].extent)
    }

    fn partition<K: SpatialKey>(&self, key: &K) -> Result<usize> {
        self.cell_id(&key.centroid())
    }

    fn query_partitions(&self, range: &NRectRange) -> Vec<usize> {
        self.cells
            .iter()
            .filter(|cell| cell.range.intersects(range) || cell.extent.intersects(range))
            .map(|cell| cell.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 9 points on the (2..=4, 2..=4) lattice.
    fn lattice() -> Vec<NPoint> {
        let mut points = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                points.push(NPoint::new(2.0 + x as f64, 2.0 + y as f64));
            }
        }
        points
    }

    #[test]
    fn test_three_by_three_lattice() {
        let grid = SpatialGridPartitioner::from_keys(&lattice(), &GridConfig::new(3)).unwrap();
        assert_eq!(grid.num_partitions(), 9);
        // corners: lower-left routes to the first cell, upper-right (inside
        // the nudged bound) to the last
        assert_eq!(grid.cell_id(&NPoint::new(2.0, 2.0)).unwrap(), 0);
        assert_eq!(grid.cell_id(&NPoint::new(4.0, 4.0)).unwrap(), 8);
    }

    #[test]
    fn test_routing_totality() {
        let points = lattice();
        let grid = SpatialGridPartitioner::from_keys(&points, &GridConfig::new(3)).unwrap();
        for p in &points {
            let id = grid.partition(p).unwrap();
            assert!(id < grid.num_partitions());
        }
    }

    #[test]
    fn test_cells_tile_the_bounds() {
        let grid = SpatialGridPartitioner::from_keys(&lattice(), &GridConfig::new(3)).unwrap();
        let bounds = grid.bounds().to_range();
        let mut area = 0.0;
        for id in 0..grid.num_partitions() {
            let range = grid.cell_bounds(id).unwrap();
            assert!(bounds.contains_range(&range));
            area += range.area();
            for other in 0..id {
                assert!(!range.intersects(&grid.cell_bounds(other).unwrap()));
            }
        }
        assert!((area - bounds.area()).abs() < 1e-9);
    }

    #[test]
    fn test_cell_bounds_inverts_cell_id() {
        let grid = SpatialGridPartitioner::from_keys(&lattice(), &GridConfig::new(3)).unwrap();
        for id in 0..grid.num_partitions() {
            let center = grid.cell_bounds(id).unwrap().center();
            assert_eq!(grid.cell_id(&center).unwrap(), id);
        }
    }

    #[test]
    fn test_out_of_bounds_lookup_fails() {
        let grid = SpatialGridPartitioner::from_keys(&lattice(), &GridConfig::new(3)).unwrap();
        assert!(matches!(
            grid.cell_id(&NPoint::new(100.0, 3.0)),
            Err(GeoShardError::OutOfBounds { .. })
        ));
        assert!(matches!(
            grid.cell_id(&NPoint::new(3.0, 1.9)),
            Err(GeoShardError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_partition_id_range_checked() {
        let grid = SpatialGridPartitioner::from_keys(&lattice(), &GridConfig::new(3)).unwrap();
        assert!(grid.partition_bounds(8).is_ok());
        assert!(matches!(
            grid.partition_bounds(9),
            Err(GeoShardError::PartitionIdOutOfRange { id: 9, .. })
        ));
    }

    #[test]
    fn test_extent_pass_grows_cells_without_changing_routing() {
        // rectangles whose centroids sit in the lower-left cell but whose
        // envelopes reach well past it
        let records = vec![
            NRectRange::from_coords(2.0, 2.0, 2.4, 2.4),
            NRectRange::from_coords(1.8, 1.8, 2.6, 2.6),
            NRectRange::from_coords(9.0, 9.0, 10.0, 10.0),
        ];
        let plain = SpatialGridPartitioner::from_keys(&records, &GridConfig::new(2)).unwrap();
        let with_extent =
            SpatialGridPartitioner::from_keys(&records, &GridConfig::new(2).with_extent()).unwrap();

        for record in &records {
            assert_eq!(
                plain.partition(record).unwrap(),
                with_extent.partition(record).unwrap()
            );
        }

        let id = with_extent.partition(&records[0]).unwrap();
        let extent = with_extent.partition_extent(id).unwrap();
        // the extent covers the envelope poking below the nominal range
        assert!(extent.ll.x <= 1.8 && extent.ll.y <= 1.8);
        // an untouched cell keeps extent == range
        let empty_id = (0..with_extent.num_partitions())
            .find(|&i| {
                records
                    .iter()
                    .all(|r| with_extent.partition(r).unwrap() != i)
            })
            .unwrap();
        let cell = with_extent.partition_bounds(empty_id).unwrap();
        assert_eq!(cell.extent, cell.range);
    }

    #[test]
    fn test_degenerate_single_location() {
        let points = vec![NPoint::new(3.0, 3.0); 4];
        let grid = SpatialGridPartitioner::from_keys(&points, &GridConfig::new(2)).unwrap();
        for p in &points {
            assert_eq!(grid.partition(p).unwrap(), 0);
        }
    }

    #[test]
    fn test_query_partitions_uses_extents() {
        let records = vec![
            NRectRange::from_coords(2.0, 2.0, 2.4, 2.4),
            NRectRange::from_coords(2.0, 2.0, 9.5, 2.2),
            NRectRange::from_coords(8.0, 8.0, 10.0, 10.0),
        ];
        let grid =
            SpatialGridPartitioner::from_keys(&records, &GridConfig::new(2).with_extent()).unwrap();
        let home = grid.partition(&records[1]).unwrap();
        // a query outside the home cell's nominal range but inside the long
        // record's envelope must still surface the home cell
        let query = NRectRange::from_coords(8.5, 2.0, 9.0, 2.3);
        assert!(!grid.partition_bounds(home).unwrap().range.intersects(&query));
        let candidates = grid.query_partitions(&query);
        assert!(candidates.contains(&home));
    }

    #[test]
    fn test_determinism() {
        let points = lattice();
        let a = SpatialGridPartitioner::from_keys(&points, &GridConfig::new(3)).unwrap();
        let b = SpatialGridPartitioner::from_keys(&points, &GridConfig::new(3)).unwrap();
        assert_eq!(a, b);
        for p in &points {
            assert_eq!(a.partition(p).unwrap(), b.partition(p).unwrap());
        }
    }
}
