//! CSV diagnostics for operational inspection.
//!
//! One row per histogram cell or partition region, shaped
//! `cellId,minX,minY,maxX,maxY,count`. Debugging aids only; nothing in the
//! partitioning contract depends on these files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::bsp::PartitionRegion;
use crate::error::Result;
use crate::histogram::CellHistogram;
use crate::types::NRectRange;

const HEADER: &str = "cellId,minX,minY,maxX,maxY,count";

fn write_row<W: Write>(w: &mut W, id: usize, range: &NRectRange, count: usize) -> Result<()> {
    writeln!(
        w,
        "{},{},{},{},{},{}",
        id, range.ll.x, range.ll.y, range.ur.x, range.ur.y, count
    )?;
    Ok(())
}

/// Write a histogram dump to an arbitrary writer.
pub fn write_histogram_csv<W: Write>(hist: &CellHistogram, w: &mut W) -> Result<()> {
    writeln!(w, "{HEADER}")?;
    for (id, range, count) in hist.iter() {
        write_row(w, id, &range, count)?;
    }
    Ok(())
}

/// Write a partition-region dump to an arbitrary writer.
pub fn write_partitions_csv<W: Write>(regions: &[PartitionRegion], w: &mut W) -> Result<()> {
    writeln!(w, "{HEADER}")?;
    for region in regions {
        write_row(w, region.id, &region.range, region.cost)?;
    }
    Ok(())
}

/// Dump a histogram to a CSV file at `path`.
pub fn dump_histogram<P: AsRef<Path>>(hist: &CellHistogram, path: P) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_histogram_csv(hist, &mut w)?;
    w.flush()?;
    Ok(())
}

/// Dump partition regions to a CSV file at `path`.
pub fn dump_partitions<P: AsRef<Path>>(regions: &[PartitionRegion], path: P) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_partitions_csv(regions, &mut w)?;
    w.flush()?;
    Ok(())
}
