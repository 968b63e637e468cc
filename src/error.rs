//! Error types for partitioner construction and lookups.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoShardError>;

/// Errors raised while building a partitioner or routing records through one.
///
/// The variants fall into three families:
///
/// - **Configuration errors** (`EmptyInput`, `InvalidConfig`,
///   `PartitionIdOutOfRange`) — reported synchronously at construction or
///   lookup time, never silently corrected.
/// - **Bounds violations** (`OutOfBounds`) — a lookup coordinate outside the
///   scanned global bounds; fatal for that single lookup and a sign the caller
///   mutated its inputs after the bounds scan.
/// - **State-invariant violations** (`MissingRegion`) — a valid histogram cell
///   with no covering partition region. This indicates a construction bug and
///   is never retried: the computation is deterministic, so a retry cannot
///   change the outcome.
#[derive(Error, Debug)]
pub enum GeoShardError {
    /// No records were supplied, so no global bounds can be derived.
    #[error("empty input: cannot derive global bounds from zero records")]
    EmptyInput,

    /// A strategy parameter is invalid (zero partitions, non-positive side
    /// length, and the like).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A partition id outside `[0, num_partitions)` was requested.
    #[error("partition id {id} out of range [0, {num_partitions})")]
    PartitionIdOutOfRange {
        /// The offending id.
        id: usize,
        /// Total number of partitions at the time of the lookup.
        num_partitions: usize,
    },

    /// A lookup coordinate lies outside the scanned global bounds.
    #[error(
        "coordinate ({x}, {y}) outside global bounds \
         [{min_x}, {max_x}) x [{min_y}, {max_y})"
    )]
    OutOfBounds {
        /// X coordinate of the lookup.
        x: f64,
        /// Y coordinate of the lookup.
        y: f64,
        /// Lower x bound (inclusive).
        min_x: f64,
        /// Upper x bound (exclusive).
        max_x: f64,
        /// Lower y bound (inclusive).
        min_y: f64,
        /// Upper y bound (exclusive).
        max_y: f64,
    },

    /// A histogram cell inside the bounds has no covering partition region.
    #[error("no partition region covers histogram cell {cell}")]
    MissingRegion {
        /// Index of the uncovered histogram cell.
        cell: usize,
    },

    /// An I/O failure while writing a diagnostic dump.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
