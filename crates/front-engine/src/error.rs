//! Error types for front detection.

use thiserror::Error;

/// Errors that can occur while resolving, assembling or detecting fronts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontError {
    /// The binning scheme is structurally inconsistent.
    #[error("invalid binning scheme ({field}): {reason}")]
    InvalidScheme { field: String, reason: String },

    /// A bin number falls outside `[0, total_bins)`.
    #[error("bin {bin} is outside the scheme range [0, {total_bins})")]
    InvalidBinIndex { bin: u64, total_bins: u64 },

    /// An explicit (row, column) pair falls outside the grid.
    #[error("cell (row {row}, col {col}) is outside the scheme grid: {reason}")]
    InvalidCell { row: u32, col: u32, reason: String },

    /// A bin whose accumulated weight cannot produce a mean.
    ///
    /// Recorded on the assembled field rather than returned: the cell is
    /// treated as absent.
    #[error("degenerate bin {bin}: weighted sum {weighted_sum} over weight {weight}")]
    DegenerateBin {
        bin: u64,
        weighted_sum: f64,
        weight: f64,
    },

    /// Detector configuration is out of range.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl FrontError {
    /// Create an InvalidScheme error.
    pub fn invalid_scheme(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScheme {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidBinIndex error.
    pub fn invalid_bin(bin: u64, total_bins: u64) -> Self {
        Self::InvalidBinIndex { bin, total_bins }
    }

    /// Create an InvalidCell error.
    pub fn invalid_cell(row: u32, col: u32, reason: impl Into<String>) -> Self {
        Self::InvalidCell {
            row,
            col,
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the invocation that produced it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::DegenerateBin { .. })
    }
}

/// Result type for front engine operations.
pub type Result<T> = std::result::Result<T, FrontError>;
