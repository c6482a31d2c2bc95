//! Sparse-to-dense field assembly.
//!
//! Bin records arrive as (bin, weighted sum, weight) accumulators, possibly
//! several per bin. [`assemble`] sums them per cell and divides once, giving
//! a dense value array laid out like the scheme's [`RowLayout`] plus a
//! presence mask. Presence is tracked separately from the value so a
//! legitimate zero is never confused with the fill value.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FrontError, Result};
use crate::scheme::{BinKey, BinningScheme, GridCell, RowLayout};

/// One accumulated measurement for a bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinRecord {
    pub key: BinKey,
    pub weighted_sum: f64,
    pub weight: f64,
}

impl BinRecord {
    /// Record addressed by global bin number.
    pub fn new(bin: u64, weighted_sum: f64, weight: f64) -> Self {
        Self {
            key: BinKey::Number(bin),
            weighted_sum,
            weight,
        }
    }

    /// Record addressed by explicit (row, column).
    pub fn at_cell(row: u32, col: u32, weighted_sum: f64, weight: f64) -> Self {
        Self {
            key: BinKey::Cell(GridCell { row, col }),
            weighted_sum,
            weight,
        }
    }

    /// Record for products that already store a mean (weight 1).
    pub fn mean(bin: u64, value: f64) -> Self {
        Self::new(bin, value, 1.0)
    }
}

/// Dense per-bin values with a presence mask.
#[derive(Debug, Clone)]
pub struct DenseField {
    layout: RowLayout,
    values: Vec<f64>,
    present: Vec<bool>,
    fill_value: f64,
    warnings: Vec<FrontError>,
}

impl DenseField {
    /// Empty field: every cell absent.
    pub fn empty(layout: RowLayout, fill_value: f64) -> Self {
        let total = layout.total_bins() as usize;
        Self {
            layout,
            values: vec![fill_value; total],
            present: vec![false; total],
            fill_value,
            warnings: Vec::new(),
        }
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Number of cells (the scheme's total bin count).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values indexed by bin number; absent cells hold the fill value.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a bin, `None` when absent or out of range.
    #[inline]
    pub fn value(&self, bin: u64) -> Option<f64> {
        let idx = bin as usize;
        if *self.present.get(idx)? {
            Some(self.values[idx])
        } else {
            None
        }
    }

    #[inline]
    pub fn is_present(&self, bin: u64) -> bool {
        self.present.get(bin as usize).copied().unwrap_or(false)
    }

    /// Value at a (row, column), `None` when absent or outside the grid.
    pub fn get(&self, cell: GridCell) -> Option<f64> {
        let bin = self.layout.bin_at(cell).ok()?;
        self.value(bin)
    }

    /// Number of present cells.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// Degenerate bins recorded during assembly.
    pub fn warnings(&self) -> &[FrontError] {
        &self.warnings
    }

    pub(crate) fn set(&mut self, bin: u64, value: f64) {
        let idx = bin as usize;
        self.values[idx] = value;
        self.present[idx] = true;
    }

    pub(crate) fn clear(&mut self, bin: u64) {
        let idx = bin as usize;
        self.values[idx] = self.fill_value;
        self.present[idx] = false;
    }
}

/// Scatter `records` into a dense field over `scheme`.
pub fn assemble(scheme: &BinningScheme, records: &[BinRecord], fill_value: f64) -> Result<DenseField> {
    assemble_with_layout(scheme.layout()?, records, fill_value)
}

/// Like [`assemble`], reusing an already-built layout.
pub fn assemble_with_layout(
    layout: RowLayout,
    records: &[BinRecord],
    fill_value: f64,
) -> Result<DenseField> {
    let total = layout.total_bins() as usize;
    let mut sums = vec![0.0f64; total];
    let mut weights = vec![0.0f64; total];
    let mut touched = vec![false; total];

    for record in records {
        let (bin, _) = layout.resolve_key(record.key)?;
        let idx = bin as usize;
        sums[idx] += record.weighted_sum;
        weights[idx] += record.weight;
        touched[idx] = true;
    }

    let mut field = DenseField::empty(layout, fill_value);

    for idx in 0..total {
        if !touched[idx] {
            continue;
        }
        let (sum, weight) = (sums[idx], weights[idx]);
        if weight > 0.0 {
            let mean = sum / weight;
            if mean.is_finite() {
                field.set(idx as u64, mean);
                continue;
            }
        } else if sum == 0.0 {
            // Zero accumulator with no weight: nothing was observed.
            continue;
        }

        warn!(bin = idx, weighted_sum = sum, weight, "Degenerate bin treated as absent");
        field.warnings.push(FrontError::DegenerateBin {
            bin: idx as u64,
            weighted_sum: sum,
            weight,
        });
    }

    debug!(
        records = records.len(),
        present = field.present_count(),
        degenerate = field.warnings.len(),
        total_bins = total,
        "Assembled dense field"
    );

    Ok(field)
}
