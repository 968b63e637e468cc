//! Strategy configuration for the partitioner factory.

use serde::{Deserialize, Serialize};

use crate::error::{GeoShardError, Result};

/// Default cap on histogram cell count for the BSP strategy.
///
/// Skewed data with a small side length can ask for an enormous histogram;
/// above this cap the side length is coarsened until the grid fits.
pub const DEFAULT_NUM_CELL_THRESHOLD: usize = 65_536;

/// Configuration for the uniform grid strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of partitions along each axis; the grid has
    /// `partitions_per_dimension^2` cells in total.
    pub partitions_per_dimension: usize,
    /// Whether to run the second pass that folds record envelopes into
    /// per-cell extents.
    pub with_extent: bool,
}

impl GridConfig {
    /// Grid configuration without the extent pass.
    pub fn new(partitions_per_dimension: usize) -> Self {
        Self {
            partitions_per_dimension,
            with_extent: false,
        }
    }

    /// Enable the extent pass.
    pub fn with_extent(mut self) -> Self {
        self.with_extent = true;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.partitions_per_dimension == 0 {
            return Err(GeoShardError::InvalidConfig(
                "partitions_per_dimension must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the cost-balanced BSP strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BspConfig {
    /// Histogram cell side length, in coordinate units.
    pub side_length: f64,
    /// Upper bound on a partition's record count. Single-histogram-cell
    /// partitions may still exceed it; they are kept whole to guarantee
    /// termination on hot spots.
    pub max_cost_per_partition: usize,
    /// If true, every record contributes only its centroid to the cost
    /// histogram. If false, a record whose envelope straddles cell boundaries
    /// is counted toward every cell the envelope overlaps, trading duplication
    /// for join correctness on non-point geometries.
    pub points_only: bool,
    /// Cap on the histogram cell count; the side length doubles until the
    /// nominal grid fits under it.
    pub num_cell_threshold: usize,
}

impl BspConfig {
    /// BSP configuration with point-only costing and the default cell
    /// threshold.
    pub fn new(side_length: f64, max_cost_per_partition: usize) -> Self {
        Self {
            side_length,
            max_cost_per_partition,
            points_only: true,
            num_cell_threshold: DEFAULT_NUM_CELL_THRESHOLD,
        }
    }

    /// Count (and later replicate) non-point geometries toward every
    /// histogram cell their envelope overlaps.
    pub fn with_envelopes(mut self) -> Self {
        self.points_only = false;
        self
    }

    /// Override the histogram cell-count cap.
    pub fn num_cell_threshold(mut self, threshold: usize) -> Self {
        self.num_cell_threshold = threshold;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.side_length.is_finite() && self.side_length > 0.0) {
            return Err(GeoShardError::InvalidConfig(format!(
                "side_length must be positive and finite, got {}",
                self.side_length
            )));
        }
        if self.max_cost_per_partition == 0 {
            return Err(GeoShardError::InvalidConfig(
                "max_cost_per_partition must be at least 1".into(),
            ));
        }
        if self.num_cell_threshold == 0 {
            return Err(GeoShardError::InvalidConfig(
                "num_cell_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The partitioning strategy to build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Uniform grid of `partitions_per_dimension^2` equal cells.
    Grid(GridConfig),
    /// Cost-balanced binary space partitioning.
    Bsp(BspConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_config_validation() {
        assert!(GridConfig::new(3).validate().is_ok());
        assert!(GridConfig::new(0).validate().is_err());
    }

    #[test]
    fn test_bsp_config_validation() {
        assert!(BspConfig::new(1.0, 10).validate().is_ok());
        assert!(BspConfig::new(0.0, 10).validate().is_err());
        assert!(BspConfig::new(-1.0, 10).validate().is_err());
        assert!(BspConfig::new(1.0, 0).validate().is_err());
        assert!(BspConfig::new(1.0, 10).num_cell_threshold(0).validate().is_err());
    }

    #[test]
    fn test_strategy_serde_roundtrip() {
        let strategy = PartitionStrategy::Bsp(BspConfig::new(0.5, 100).with_envelopes());
        let json = serde_json::to_string(&strategy).unwrap();
        let back: PartitionStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strategy);
    }

    #[test]
    fn test_builder_style_defaults() {
        let cfg = BspConfig::new(1.0, 5);
        assert!(cfg.points_only);
        assert_eq!(cfg.num_cell_threshold, DEFAULT_NUM_CELL_THRESHOLD);
        let cfg = cfg.with_envelopes().num_cell_threshold(128);
        assert!(!cfg.points_only);
        assert_eq!(cfg.num_cell_threshold, 128);
    }
}
