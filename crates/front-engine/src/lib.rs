//! Belkin-O'Reilly Front Detection over Equal-Area Binned Data
//!
//! This crate turns sparse level-3 bin records (ocean-color products such as
//! chlorophyll-a) into per-bin front strength values. It handles:
//!
//! - **Irregular grids**: ISIN rows with a different bin count per latitude
//! - **Two dialects**: variable-width rows and fixed global grids
//! - **Data gaps**: cloud and coverage holes never manufacture fronts
//! - **Reproducibility**: single-threaded, deterministic per granule
//!
//! # Architecture
//!
//! ```text
//! Granule { scheme, records, date }
//!      │
//!      ├─► GeometryCache::get_or_resolve(scheme)   (once per scheme)
//!      │         └─► centroids per bin
//!      │
//!      ├─► assemble(records)  → DenseField (value + presence per bin)
//!      │
//!      ├─► detect(field)      → FrontField (one value per bin)
//!      │
//!      └─► project(fronts, geometry, date) → Vec<FrontResult>
//! ```
//!
//! # Example
//!
//! ```
//! use front_engine::{BinRecord, BinningScheme, DetectorConfig, FrontEngine, Granule};
//!
//! let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
//! let records = (0..8).map(|bin| BinRecord::new(bin, 2.0, 1.0)).collect();
//! let granule = Granule { scheme, records, date: "2020-06-01".into() };
//!
//! let engine = FrontEngine::default();
//! let output = engine.process(&granule, &DetectorConfig::default()).unwrap();
//! assert_eq!(output.results.len(), 8);
//! ```

pub mod cache;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod field;
pub mod geometry;
pub mod project;
pub mod scheme;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::GeometryCache;
pub use config::{DetectorConfig, GradientKernel};
pub use detect::{detect, FrontField};
pub use engine::{FrontEngine, Granule, GranuleOutput};
pub use error::{FrontError, Result};
pub use field::{assemble, BinRecord, DenseField};
pub use geometry::{resolve, ResolvedBin, ResolvedGeometry};
pub use project::{project, FrontResult};
pub use scheme::{BinKey, BinningScheme, GridCell, RowLayout, SchemeDescriptor, SchemeKind};
pub use types::{CacheStats, CellClass, DetectionSummary};
