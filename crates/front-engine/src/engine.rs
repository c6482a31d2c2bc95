//! One-call front detection for a granule.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::cache::GeometryCache;
use crate::config::DetectorConfig;
use crate::detect::detect;
use crate::error::{FrontError, Result};
use crate::field::{assemble_with_layout, BinRecord};
use crate::project::{project, FrontResult};
use crate::scheme::BinningScheme;
use crate::types::{CacheStats, DetectionSummary};

/// Everything the engine needs for one granule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Granule {
    pub scheme: BinningScheme,
    pub records: Vec<BinRecord>,
    /// Acquisition date, copied verbatim into every result.
    pub date: String,
}

/// Results of one granule.
#[derive(Debug, Clone)]
pub struct GranuleOutput {
    /// One row per bin, in bin-number order.
    pub results: Vec<FrontResult>,
    pub summary: DetectionSummary,
    /// Recoverable problems (degenerate bins) met while assembling.
    pub warnings: Vec<FrontError>,
}

/// Front detection engine.
///
/// Holds only the geometry cache; every call is otherwise independent, so one
/// engine can be shared by reference across worker threads.
pub struct FrontEngine {
    cache: Arc<GeometryCache>,
}

impl FrontEngine {
    pub fn new(cache: Arc<GeometryCache>) -> Self {
        Self { cache }
    }

    /// Engine with a private cache bounded to `memory_limit` bytes.
    pub fn with_cache_limit(memory_limit: usize) -> Self {
        Self::new(Arc::new(GeometryCache::new(memory_limit)))
    }

    /// Resolve, assemble, detect and project one granule.
    #[instrument(skip_all, fields(date = %granule.date, kind = %granule.scheme.kind()))]
    pub fn process(&self, granule: &Granule, config: &DetectorConfig) -> Result<GranuleOutput> {
        config.validate()?;

        let geometry = self.cache.get_or_resolve(&granule.scheme)?;
        let field = assemble_with_layout(
            geometry.layout().clone(),
            &granule.records,
            config.fill_value,
        )?;
        let fronts = detect(&field, config)?;
        let results = project(&fronts, &geometry, &granule.date)?;

        let summary = *fronts.summary();
        info!(
            bins = results.len(),
            records = granule.records.len(),
            computable = summary.computable,
            degenerate = field.warnings().len(),
            "Processed granule"
        );

        Ok(GranuleOutput {
            results,
            summary,
            warnings: field.warnings().to_vec(),
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for FrontEngine {
    fn default() -> Self {
        Self::new(Arc::new(GeometryCache::default()))
    }
}
