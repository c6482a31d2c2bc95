//! Bin geometry resolution: bin number to row, column and centroid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::scheme::{BinningScheme, GridCell, RowLayout};

/// Geographic placement of a single bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBin {
    pub bin: u64,
    pub row: u32,
    pub col: u32,
    pub latitude: f64,
    pub longitude: f64,
}

/// Centroids for every bin of a scheme, indexed by bin number.
///
/// Computed once per scheme and shared read-only afterwards (see
/// [`GeometryCache`](crate::cache::GeometryCache)).
#[derive(Debug, Clone)]
pub struct ResolvedGeometry {
    layout: RowLayout,
    rows: Vec<u32>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
}

impl ResolvedGeometry {
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Number of resolved bins (the scheme's total).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up one bin; `None` when out of range.
    pub fn get(&self, bin: u64) -> Option<ResolvedBin> {
        let idx = usize::try_from(bin).ok()?;
        let row = *self.rows.get(idx)?;
        Some(ResolvedBin {
            bin,
            row,
            col: (bin - self.layout.row_start(row)) as u32,
            latitude: self.latitudes[idx],
            longitude: self.longitudes[idx],
        })
    }

    /// Latitude column, indexed by bin number.
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// Longitude column, indexed by bin number.
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// All bins in bin-number order.
    pub fn iter(&self) -> impl Iterator<Item = ResolvedBin> + '_ {
        (0..self.len() as u64).filter_map(move |bin| self.get(bin))
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.rows.len() * std::mem::size_of::<u32>()
            + (self.latitudes.len() + self.longitudes.len()) * std::mem::size_of::<f64>()
    }
}

/// Resolve every bin of `scheme` to its row, column and centroid.
pub fn resolve(scheme: &BinningScheme) -> Result<ResolvedGeometry> {
    let layout = scheme.layout()?;
    let total = layout.total_bins() as usize;

    let mut rows = Vec::with_capacity(total);
    let mut latitudes = Vec::with_capacity(total);
    let mut longitudes = Vec::with_capacity(total);

    for row in 0..layout.row_count() {
        let lat = layout.latitude(row);
        for col in 0..layout.row_len(row) {
            rows.push(row);
            latitudes.push(lat);
            longitudes.push(layout.longitude(GridCell { row, col }));
        }
    }

    debug!(
        kind = %layout.kind(),
        rows = layout.row_count(),
        bins = total,
        "Resolved bin geometry"
    );

    Ok(ResolvedGeometry {
        layout,
        rows,
        latitudes,
        longitudes,
    })
}
