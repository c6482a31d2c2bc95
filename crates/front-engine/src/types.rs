//! Core types shared across the engine.

use serde::{Deserialize, Serialize};

/// Outcome of the detector for a single bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellClass {
    /// No data in the bin (or its value had no logarithm).
    Empty,
    /// A front strength was computed.
    Computable,
    /// Too few present neighbors to judge a front.
    InsufficientNeighbors,
    /// Adjacent to a data/no-data transition.
    SuppressedEdge,
}

/// Per-class bin counts for one detector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub empty: u64,
    pub computable: u64,
    pub insufficient_neighbors: u64,
    pub suppressed_edge: u64,
    /// Cells replaced by the contextual median filter.
    pub median_replaced: u64,
    /// Present cells dropped by the log transform (non-positive values).
    pub log_dropped: u64,
}

impl DetectionSummary {
    pub fn record(&mut self, class: CellClass) {
        match class {
            CellClass::Empty => self.empty += 1,
            CellClass::Computable => self.computable += 1,
            CellClass::InsufficientNeighbors => self.insufficient_neighbors += 1,
            CellClass::SuppressedEdge => self.suppressed_edge += 1,
        }
    }

    /// Bins that ended up as fill.
    pub fn filled(&self) -> u64 {
        self.empty + self.insufficient_neighbors + self.suppressed_edge
    }

    pub fn total(&self) -> u64 {
        self.filled() + self.computable
    }
}

/// Statistics about the geometry cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub memory_bytes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = DetectionSummary::default();
        summary.record(CellClass::Empty);
        summary.record(CellClass::Computable);
        summary.record(CellClass::Computable);
        summary.record(CellClass::SuppressedEdge);
        summary.record(CellClass::InsufficientNeighbors);

        assert_eq!(summary.computable, 2);
        assert_eq!(summary.filled(), 3);
        assert_eq!(summary.total(), 5);
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let mut stats = CacheStats::default();
        assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);

        stats.hits = 80;
        stats.misses = 20;
        assert!((stats.hit_rate() - 0.8).abs() < f64::EPSILON);
    }
}
