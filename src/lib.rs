//! Spatial partitioning for distributed spatial joins.
//!
//! Distributes 2D geometric records across a set of compute partitions so
//! spatial predicates and joins can run in parallel with balanced work per
//! partition. Two strategies are provided: a uniform grid
//! ([`SpatialGridPartitioner`]) and a cost-balanced binary space partitioning
//! ([`BsPartitioner`]) that puts more partitions where data is dense.
//!
//! Partitioners are built in two batch passes (bounds, then a strategy pass)
//! and are immutable afterwards; routing is pure and safe to call from any
//! number of workers. The distributed engine that shuffles records by the
//! returned partition id is an external collaborator.
//!
//! ```rust
//! use geo::Point;
//! use geoshard::{BspConfig, PartitionStrategy, SpatialPartitioner, build_partitioner};
//!
//! let records: Vec<(Point<f64>, &str)> = vec![
//!     (Point::new(2.0, 2.0), "a"),
//!     (Point::new(2.5, 2.5), "b"),
//!     (Point::new(4.0, 4.0), "c"),
//! ];
//! let strategy = PartitionStrategy::Bsp(BspConfig::new(1.0, 1));
//! let partitioner = build_partitioner(&strategy, &records)?;
//! for record in &records {
//!     let id = partitioner.partition(record)?;
//!     assert!(id < partitioner.num_partitions());
//! }
//! # Ok::<(), geoshard::GeoShardError>(())
//! ```

pub mod bounds;
pub mod bsp;
pub mod config;
pub mod dump;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod key;
pub mod partitioner;
pub mod types;

pub use bounds::GlobalBounds;
pub use bsp::{BsPartitioner, PartitionRegion};
pub use config::{BspConfig, DEFAULT_NUM_CELL_THRESHOLD, GridConfig, PartitionStrategy};
pub use error::{GeoShardError, Result};
pub use grid::SpatialGridPartitioner;
pub use histogram::CellHistogram;
pub use key::SpatialKey;
pub use partitioner::{Partitioner, SpatialPartitioner, build_partitioner};
pub use types::{Cell, NPoint, NRectRange};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoShardError, Result};

    pub use crate::{Cell, GlobalBounds, NPoint, NRectRange};

    pub use crate::{BspConfig, GridConfig, PartitionStrategy};

    pub use crate::{
        BsPartitioner, Partitioner, SpatialGridPartitioner, SpatialKey, SpatialPartitioner,
        build_partitioner,
    };

    pub use geo::{Point, Polygon, Rect};
}
