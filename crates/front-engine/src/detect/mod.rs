//! Belkin-O'Reilly front detection.
//!
//! One call runs the whole single-pass pipeline over a [`DenseField`]:
//!
//! ```text
//! DenseField
//!      │
//!      ├─► ln(value)                  (optional, concentrations)
//!      │
//!      ├─► contextual median filter   (optional, 3x3 / 5x5 peak test)
//!      │
//!      └─► per cell, 3x3 row-aware window
//!               │
//!               ├─► centre absent            → Empty
//!               ├─► absent neighbor          → SuppressedEdge
//!               ├─► too few present neighbors → InsufficientNeighbors
//!               └─► gradient magnitude       → Computable
//! ```
//!
//! Every class other than `Computable` is written as the configured fill.

pub mod gradient;
pub mod median;
pub mod window;

use tracing::debug;

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::field::DenseField;
use crate::scheme::GridCell;
use crate::types::{CellClass, DetectionSummary};

pub use gradient::gradient_magnitude;
pub use median::contextual_median_filter;
pub use window::{Slot, Window};

/// Detector output: one value per bin number.
#[derive(Debug, Clone)]
pub struct FrontField {
    values: Vec<f64>,
    classes: Vec<CellClass>,
    fill_value: f64,
    summary: DetectionSummary,
}

impl FrontField {
    /// Front strength per bin; fill where not computable.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, bin: u64) -> Option<f64> {
        self.values.get(bin as usize).copied()
    }

    pub fn class(&self, bin: u64) -> Option<CellClass> {
        self.classes.get(bin as usize).copied()
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    pub fn summary(&self) -> &DetectionSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Replace present values with their natural log; non-positive values drop out.
fn log_transform(field: &mut DenseField) -> u64 {
    let mut dropped = 0;
    for bin in 0..field.len() as u64 {
        if let Some(v) = field.value(bin) {
            if v > 0.0 {
                field.set(bin, v.ln());
            } else {
                field.clear(bin);
                dropped += 1;
            }
        }
    }
    dropped
}

/// Classify one cell and compute its front strength.
pub fn classify(window: &Window, config: &DetectorConfig) -> (CellClass, Option<f64>) {
    if window.centre().value().is_none() {
        return (CellClass::Empty, None);
    }
    if config.suppress_cloud_edges && window.has_absent_neighbor() {
        return (CellClass::SuppressedEdge, None);
    }
    if window.present_neighbors() < config.min_neighbors {
        return (CellClass::InsufficientNeighbors, None);
    }
    match gradient_magnitude(window, config.kernel) {
        Some(g) => (CellClass::Computable, Some(g)),
        None => (CellClass::InsufficientNeighbors, None),
    }
}

/// Run front detection over `field`.
///
/// Returns exactly one value per bin of the field's scheme.
pub fn detect(field: &DenseField, config: &DetectorConfig) -> Result<FrontField> {
    config.validate()?;

    let mut summary = DetectionSummary::default();
    let mut working = field.clone();

    if config.use_log_transform {
        summary.log_dropped = log_transform(&mut working);
    }

    if config.median_filter {
        let (filtered, replaced) = contextual_median_filter(&working);
        working = filtered;
        summary.median_replaced = replaced;
    }

    let layout = working.layout();
    let total = layout.total_bins() as usize;
    let mut values = vec![config.fill_value; total];
    let mut classes = vec![CellClass::Empty; total];

    for row in 0..layout.row_count() {
        let start = layout.row_start(row);
        for col in 0..layout.row_len(row) {
            let idx = (start + col as u64) as usize;
            let (class, value) = if working.is_present(idx as u64) {
                classify(&Window::gather(&working, GridCell { row, col }, 3), config)
            } else {
                (CellClass::Empty, None)
            };
            if let Some(v) = value {
                values[idx] = v;
            }
            classes[idx] = class;
            summary.record(class);
        }
    }

    debug!(
        bins = total,
        computable = summary.computable,
        suppressed = summary.suppressed_edge,
        insufficient = summary.insufficient_neighbors,
        empty = summary.empty,
        median_replaced = summary.median_replaced,
        kernel = %config.kernel,
        "Detected fronts"
    );

    Ok(FrontField {
        values,
        classes,
        fill_value: config.fill_value,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradientKernel;
    use crate::field::{assemble, BinRecord};
    use crate::scheme::BinningScheme;

    const FILL: f64 = -999.0;

    fn uniform(scheme: &BinningScheme, value: f64) -> DenseField {
        let records: Vec<BinRecord> = (0..scheme.total_bins())
            .map(|bin| BinRecord::mean(bin, value))
            .collect();
        assemble(scheme, &records, FILL).unwrap()
    }

    #[test]
    fn test_flat_two_row_field_has_no_fronts() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let fronts = detect(&uniform(&scheme, 2.5), &DetectorConfig::default()).unwrap();

        assert_eq!(fronts.len(), 8);
        for bin in 0..8 {
            assert_eq!(fronts.value(bin), Some(0.0));
            assert_eq!(fronts.class(bin), Some(CellClass::Computable));
        }
    }

    #[test]
    fn test_present_row_next_to_absent_row_is_suppressed() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let records: Vec<BinRecord> = (0..4).map(|bin| BinRecord::mean(bin, 1.0)).collect();
        let field = assemble(&scheme, &records, FILL).unwrap();
        let fronts = detect(&field, &DetectorConfig::default()).unwrap();

        for bin in 0..4 {
            assert_eq!(fronts.value(bin), Some(FILL));
            assert_eq!(fronts.class(bin), Some(CellClass::SuppressedEdge));
        }
        for bin in 4..8 {
            assert_eq!(fronts.value(bin), Some(FILL));
            assert_eq!(fronts.class(bin), Some(CellClass::Empty));
        }
    }

    #[test]
    fn test_insufficient_neighbors_without_suppression() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let records: Vec<BinRecord> = (0..4).map(|bin| BinRecord::mean(bin, bin as f64)).collect();
        let field = assemble(&scheme, &records, FILL).unwrap();
        let config = DetectorConfig {
            suppress_cloud_edges: false,
            median_filter: false,
            ..DetectorConfig::default()
        };
        let fronts = detect(&field, &config).unwrap();

        // Each present cell sees only its two row neighbors.
        for bin in 0..4 {
            assert_eq!(fronts.class(bin), Some(CellClass::InsufficientNeighbors));
            assert_eq!(fronts.value(bin), Some(FILL));
        }

        let relaxed = DetectorConfig {
            min_neighbors: 2,
            ..config
        };
        let fronts = detect(&field, &relaxed).unwrap();
        assert_eq!(fronts.class(1), Some(CellClass::InsufficientNeighbors));
        assert_eq!(fronts.summary().insufficient_neighbors, 4);
    }

    #[test]
    fn test_step_produces_front_along_boundary() {
        // 6 rows x 8 columns: west half 1.0, east half 3.0.
        let scheme = BinningScheme::fixed(6, 8).unwrap();
        let records: Vec<BinRecord> = (0..48)
            .map(|bin| BinRecord::mean(bin, if bin % 8 < 4 { 1.0 } else { 3.0 }))
            .collect();
        let field = assemble(&scheme, &records, FILL).unwrap();
        let config = DetectorConfig {
            median_filter: false,
            ..DetectorConfig::default()
        };
        let fronts = detect(&field, &config).unwrap();

        let row = 2 * 8;
        // Columns 3 and 4 straddle the step: central difference (3 - 1) / 2.
        assert!((fronts.value(row + 3).unwrap() - 1.0).abs() < 1e-12);
        assert!((fronts.value(row + 4).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(fronts.value(row + 1), Some(0.0));
        assert_eq!(fronts.value(row + 6), Some(0.0));
        assert_eq!(fronts.summary().computable, 48);
    }

    #[test]
    fn test_log_transform_changes_output() {
        let scheme = BinningScheme::fixed(4, 6).unwrap();
        let records: Vec<BinRecord> = (0..24)
            .map(|bin| BinRecord::mean(bin, 0.5 + (bin % 6) as f64))
            .collect();
        let field = assemble(&scheme, &records, FILL).unwrap();

        let linear = detect(&field, &DetectorConfig::default()).unwrap();
        let logged = detect(&field, &DetectorConfig::concentration()).unwrap();

        assert_eq!(linear.len(), logged.len());
        assert_ne!(linear.values(), logged.values());
        let bin = 6 + 2;
        let expected = ((3.5f64).ln() - (1.5f64).ln()) / 2.0;
        assert!((logged.value(bin).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_log_transform_drops_non_positive_values() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let mut records: Vec<BinRecord> = (0..8).map(|bin| BinRecord::mean(bin, 2.0)).collect();
        records[5] = BinRecord::mean(5, 0.0);
        let field = assemble(&scheme, &records, FILL).unwrap();

        let fronts = detect(&field, &DetectorConfig::concentration()).unwrap();
        assert_eq!(fronts.summary().log_dropped, 1);
        assert_eq!(fronts.class(5), Some(CellClass::Empty));
        assert_eq!(fronts.value(5), Some(FILL));
    }

    #[test]
    fn test_output_uses_caller_fill() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let field = assemble(&scheme, &[], FILL).unwrap();
        let config = DetectorConfig {
            fill_value: -32767.0,
            ..DetectorConfig::default()
        };
        let fronts = detect(&field, &config).unwrap();
        assert!(fronts.values().iter().all(|&v| v == -32767.0));
        assert_eq!(fronts.summary().empty, 8);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
        let config = DetectorConfig {
            min_neighbors: 12,
            ..DetectorConfig::default()
        };
        assert!(detect(&uniform(&scheme, 1.0), &config).is_err());
    }

    #[test]
    fn test_kernels_agree_on_uniform_ramp() {
        let scheme = BinningScheme::fixed(5, 10).unwrap();
        let records: Vec<BinRecord> = (0..50)
            .map(|bin| BinRecord::mean(bin, 2.0 * (bin / 10) as f64))
            .collect();
        let field = assemble(&scheme, &records, FILL).unwrap();

        for kernel in [GradientKernel::Sobel, GradientKernel::Prewitt, GradientKernel::Scharr] {
            let config = DetectorConfig {
                kernel,
                median_filter: false,
                ..DetectorConfig::default()
            };
            let fronts = detect(&field, &config).unwrap();
            assert!((fronts.value(2 * 10 + 4).unwrap() - 2.0).abs() < 1e-12);
        }
    }
}
