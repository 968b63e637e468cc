//! The partitioning contract and the strategy factory.

use crate::bsp::BsPartitioner;
use crate::config::PartitionStrategy;
use crate::error::Result;
use crate::grid::SpatialGridPartitioner;
use crate::key::SpatialKey;
use crate::types::{Cell, NRectRange};

/// The contract every partitioning strategy satisfies.
///
/// A partitioner is immutable once built. [`SpatialPartitioner::partition`]
/// is a pure, stateless lookup: the execution engine broadcasts the
/// partitioner read-only to its workers and calls it concurrently without
/// synchronization, using the returned id to physically shuffle records.
pub trait SpatialPartitioner {
    /// Total partition count. Fixed for the grid strategy, data-dependent for
    /// BSP.
    fn num_partitions(&self) -> usize;

    /// The nominal region for a partition id. Fails for ids outside
    /// `[0, num_partitions)`.
    fn partition_bounds(&self, id: usize) -> Result<Cell>;

    /// The (possibly larger) extent actually covered by the partition's
    /// contents.
    fn partition_extent(&self, id: usize) -> Result<NRectRange>;

    /// Route a record to its partition id in `[0, num_partitions)`. Routing
    /// always uses the record's centroid.
    fn partition<K: SpatialKey>(&self, key: &K) -> Result<usize>;

    /// Ids of every partition a query rectangle may touch, judged against
    /// nominal ranges and extents. Used to classify query geometries into
    /// candidate partitions after the shuffle, and to enumerate the
    /// partitions a non-point geometry must be replicated into for join
    /// correctness.
    fn query_partitions(&self, range: &NRectRange) -> Vec<usize>;
}

/// A built partitioner, tagged by strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Partitioner {
    /// Uniform grid.
    Grid(SpatialGridPartitioner),
    /// Cost-balanced BSP.
    Bsp(BsPartitioner),
}

impl SpatialPartitioner for Partitioner {
    fn num_partitions(&self) -> usize {
        match self {
            Self::Grid(p) => p.num_partitions(),
            Self::Bsp(p) => p.num_partitions(),
        }
    }

    fn partition_bounds(&self, id: usize) -> Result<Cell> {
        match self {
            Self::Grid(p) => p.partition_bounds(id),
            Self::Bsp(p) => p.partition_bounds(id),
        }
    }

    fn partition_extent(&self, id: usize) -> Result<NRectRange> {
        match self {
            Self::Grid(p) => p.partition_extent(id),
            Self::Bsp(p) => p.partition_extent(id),
        }
    }

    fn partition<K: SpatialKey>(&self, key: &K) -> Result<usize> {
        match self {
            Self::Grid(p) => p.partition(key),
            Self::Bsp(p) => p.partition(key),
        }
    }

    fn query_partitions(&self, range: &NRectRange) -> Vec<usize> {
        match self {
            Self::Grid(p) => p.query_partitions(range),
            Self::Bsp(p) => p.query_partitions(range),
        }
    }
}

/// Build the partitioner a strategy describes from a record collection.
///
/// # Examples
///
/// ```
/// use geo::Point;
/// use geoshard::{GridConfig, PartitionStrategy, SpatialPartitioner, build_partitioner};
///
/// let records: Vec<(Point<f64>, u64)> = vec![
///     (Point::new(2.0, 2.0), 1),
///     (Point::new(3.0, 3.0), 2),
///     (Point::new(4.0, 4.0), 3),
/// ];
/// let partitioner =
///     build_partitioner(&PartitionStrategy::Grid(GridConfig::new(3)), &records)?;
/// assert_eq!(partitioner.num_partitions(), 9);
/// assert_eq!(partitioner.partition(&records[0])?, 0);
/// # Ok::<(), geoshard::GeoShardError>(())
/// ```
pub fn build_partitioner<K: SpatialKey>(
    strategy: &PartitionStrategy,
    keys: &[K],
) -> Result<Partitioner> {
    match strategy {
        PartitionStrategy::Grid(config) => {
            SpatialGridPartitioner::from_keys(keys, config).map(Partitioner::Grid)
        }
        PartitionStrategy::Bsp(config) => {
            BsPartitioner::from_keys(keys, config).map(Partitioner::Bsp)
        }
    }
}
