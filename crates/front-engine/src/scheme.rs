//! Equal-area binning schemes and their row layout.
//!
//! Two dialects are supported:
//!
//! - **Variable**: the satellite-native integerized sinusoidal (ISIN) layout
//!   where every latitude row carries its own number of longitude bins.
//! - **Fixed**: a global grid where every row has the same width and records
//!   carry their (row, column) explicitly.
//!
//! Both lower to a [`RowLayout`]: per-row bin counts plus cached prefix sums.
//! Everything downstream (assembly, neighbor lookup, centroids) works on the
//! layout and never branches on the dialect.
//!
//! Rows are numbered from the south pole (row 0) to the north pole and
//! columns from -180° eastwards.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{FrontError, Result};

/// Discriminant of [`BinningScheme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    Variable,
    Fixed,
}

impl SchemeKind {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "variable" | "isin" | "binned" => Some(Self::Variable),
            "fixed" | "global" | "glob" => Some(Self::Fixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// An equal-area binning scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BinningScheme {
    /// Rows of variable bin count, ordered south to north.
    Variable { row_bin_counts: Vec<u32> },
    /// Uniform grid of `row_count` rows, each `row_width` bins wide.
    Fixed { row_count: u32, row_width: u32 },
}

impl BinningScheme {
    /// Create a variable-width scheme from explicit per-row bin counts.
    pub fn variable(row_bin_counts: Vec<u32>) -> Result<Self> {
        let scheme = Self::Variable { row_bin_counts };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Create a fixed-width scheme.
    pub fn fixed(row_count: u32, row_width: u32) -> Result<Self> {
        let scheme = Self::Fixed {
            row_count,
            row_width,
        };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Build the standard ISIN scheme with `row_count` latitude rows.
    ///
    /// Row `r` holds `round(2 * row_count * cos(lat_r))` bins where `lat_r`
    /// is the row's centre latitude, so bins stay roughly equal-area.
    pub fn isin(row_count: u32) -> Result<Self> {
        if row_count == 0 {
            return Err(FrontError::invalid_scheme("row_count", "must be > 0"));
        }
        let rows = row_count as f64;
        let counts = (0..row_count)
            .map(|row| {
                let lat = (row as f64 + 0.5) * 180.0 / rows - 90.0;
                let n = (2.0 * rows * lat.to_radians().cos() + 0.5) as u32;
                n.max(1)
            })
            .collect();
        Self::variable(counts)
    }

    /// The dialect of this scheme.
    pub fn kind(&self) -> SchemeKind {
        match self {
            Self::Variable { .. } => SchemeKind::Variable,
            Self::Fixed { .. } => SchemeKind::Fixed,
        }
    }

    /// Number of latitude rows.
    pub fn row_count(&self) -> u32 {
        match self {
            Self::Variable { row_bin_counts } => row_bin_counts.len() as u32,
            Self::Fixed { row_count, .. } => *row_count,
        }
    }

    /// Total number of bins in the scheme.
    pub fn total_bins(&self) -> u64 {
        match self {
            Self::Variable { row_bin_counts } => row_bin_counts.iter().map(|&n| n as u64).sum(),
            Self::Fixed {
                row_count,
                row_width,
            } => *row_count as u64 * *row_width as u64,
        }
    }

    /// Check the scheme's structural invariants.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Variable { row_bin_counts } => {
                if row_bin_counts.is_empty() {
                    return Err(FrontError::invalid_scheme("row_bin_counts", "no rows"));
                }
                if let Some(row) = row_bin_counts.iter().position(|&n| n == 0) {
                    return Err(FrontError::invalid_scheme(
                        "row_bin_counts",
                        format!("row {} has zero bins", row),
                    ));
                }
            }
            Self::Fixed {
                row_count,
                row_width,
            } => {
                if *row_count == 0 {
                    return Err(FrontError::invalid_scheme("row_count", "must be > 0"));
                }
                if *row_width == 0 {
                    return Err(FrontError::invalid_scheme("row_width", "must be > 0"));
                }
            }
        }
        Ok(())
    }

    /// Lower the scheme to its row layout.
    pub fn layout(&self) -> Result<RowLayout> {
        self.validate()?;
        let counts = match self {
            Self::Variable { row_bin_counts } => row_bin_counts.clone(),
            Self::Fixed {
                row_count,
                row_width,
            } => vec![*row_width; *row_count as usize],
        };
        Ok(RowLayout::from_counts(self.kind(), counts))
    }

    /// Stable identity used to key cached geometry.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Scheme parameters as an archive describes them.
///
/// Archives report a total bin count and a row count next to the optional
/// per-row table; converting checks that they agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDescriptor {
    pub kind: SchemeKind,
    pub total_bins: u64,
    pub row_count: u32,
    /// Per-row bin counts (variable dialect). Generated as ISIN when absent.
    #[serde(default)]
    pub row_bin_counts: Option<Vec<u32>>,
    /// Row width (fixed dialect). Derived from `total_bins / row_count` when absent.
    #[serde(default)]
    pub row_width: Option<u32>,
}

impl TryFrom<SchemeDescriptor> for BinningScheme {
    type Error = FrontError;

    fn try_from(desc: SchemeDescriptor) -> Result<Self> {
        if desc.row_count == 0 {
            return Err(FrontError::invalid_scheme("row_count", "must be > 0"));
        }

        let scheme = match desc.kind {
            SchemeKind::Variable => match desc.row_bin_counts {
                Some(counts) => {
                    if counts.len() != desc.row_count as usize {
                        return Err(FrontError::invalid_scheme(
                            "row_bin_counts",
                            format!(
                                "{} entries for {} rows",
                                counts.len(),
                                desc.row_count
                            ),
                        ));
                    }
                    BinningScheme::variable(counts)?
                }
                None => BinningScheme::isin(desc.row_count)?,
            },
            SchemeKind::Fixed => {
                let width = match desc.row_width {
                    Some(width) => width,
                    None => {
                        if desc.total_bins % desc.row_count as u64 != 0 {
                            return Err(FrontError::invalid_scheme(
                                "total_bins",
                                format!(
                                    "{} bins do not divide into {} rows",
                                    desc.total_bins, desc.row_count
                                ),
                            ));
                        }
                        (desc.total_bins / desc.row_count as u64) as u32
                    }
                };
                BinningScheme::fixed(desc.row_count, width)?
            }
        };

        if scheme.total_bins() != desc.total_bins {
            return Err(FrontError::invalid_scheme(
                "total_bins",
                format!(
                    "declared {} but rows sum to {}",
                    desc.total_bins,
                    scheme.total_bins()
                ),
            ));
        }

        Ok(scheme)
    }
}

/// A (row, column) position in a row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
}

impl GridCell {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// How a record names its bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinKey {
    /// Global bin number in `[0, total_bins)`.
    Number(u64),
    /// Explicit position, as fixed-grid products supply it.
    Cell(GridCell),
}

/// Per-row bin counts with cached prefix sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    kind: SchemeKind,
    counts: Vec<u32>,
    /// `offsets[r]` is the first bin of row `r`; `offsets[rows]` is the total.
    offsets: Vec<u64>,
}

impl RowLayout {
    fn from_counts(kind: SchemeKind, counts: Vec<u32>) -> Self {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        let mut acc = 0u64;
        offsets.push(acc);
        for &n in &counts {
            acc += n as u64;
            offsets.push(acc);
        }
        Self {
            kind,
            counts,
            offsets,
        }
    }

    pub fn kind(&self) -> SchemeKind {
        self.kind
    }

    pub fn row_count(&self) -> u32 {
        self.counts.len() as u32
    }

    pub fn total_bins(&self) -> u64 {
        self.offsets[self.counts.len()]
    }

    /// Number of bins in `row`.
    #[inline]
    pub fn row_len(&self, row: u32) -> u32 {
        self.counts[row as usize]
    }

    /// Global bin number of the first bin in `row`.
    #[inline]
    pub fn row_start(&self, row: u32) -> u64 {
        self.offsets[row as usize]
    }

    /// Map a global bin number to its (row, column).
    pub fn locate(&self, bin: u64) -> Result<GridCell> {
        let total = self.total_bins();
        if bin >= total {
            return Err(FrontError::invalid_bin(bin, total));
        }
        // First offset strictly greater than `bin` closes the owning row.
        let row = self.offsets.partition_point(|&start| start <= bin) - 1;
        Ok(GridCell {
            row: row as u32,
            col: (bin - self.offsets[row]) as u32,
        })
    }

    /// Map a (row, column) back to its global bin number.
    pub fn bin_at(&self, cell: GridCell) -> Result<u64> {
        if cell.row >= self.row_count() {
            return Err(FrontError::invalid_cell(
                cell.row,
                cell.col,
                format!("row exceeds {} rows", self.row_count()),
            ));
        }
        let width = self.row_len(cell.row);
        if cell.col >= width {
            return Err(FrontError::invalid_cell(
                cell.row,
                cell.col,
                format!("column exceeds row width {}", width),
            ));
        }
        Ok(self.row_start(cell.row) + cell.col as u64)
    }

    /// Resolve a record key to its bin number and cell.
    pub fn resolve_key(&self, key: BinKey) -> Result<(u64, GridCell)> {
        match key {
            BinKey::Number(bin) => Ok((bin, self.locate(bin)?)),
            BinKey::Cell(cell) => Ok((self.bin_at(cell)?, cell)),
        }
    }

    /// Centre latitude of `row` in degrees.
    #[inline]
    pub fn latitude(&self, row: u32) -> f64 {
        -90.0 + (row as f64 + 0.5) * 180.0 / self.row_count() as f64
    }

    /// Centre longitude of `cell` in degrees, in `(-180, 180)`.
    #[inline]
    pub fn longitude(&self, cell: GridCell) -> f64 {
        -180.0 + (cell.col as f64 + 0.5) * 360.0 / self.row_len(cell.row) as f64
    }

    /// Column `col` of `row` wrapped across the antimeridian.
    #[inline]
    pub fn wrap_col(&self, row: u32, col: i64) -> u32 {
        col.rem_euclid(self.row_len(row) as i64) as u32
    }

    /// Column of `to_row` whose cell contains the centre longitude of
    /// (`from_row`, `col`).
    ///
    /// Computed in integers: floor((col + 1/2) * n_to / n_from).
    #[inline]
    pub fn nearest_col(&self, from_row: u32, col: u32, to_row: u32) -> u32 {
        let n_from = self.row_len(from_row) as u64;
        let n_to = self.row_len(to_row) as u64;
        let mapped = ((2 * col as u64 + 1) * n_to) / (2 * n_from);
        mapped.min(n_to - 1) as u32
    }
}
