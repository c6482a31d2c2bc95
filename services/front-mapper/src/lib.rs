//! Batch front mapping service library.
//!
//! Reads binned ocean-color granules, runs the front engine on each and
//! writes one cropped CSV per granule:
//!
//! ```text
//! input_dir/**/*.json ──► JsonGranuleReader ──► FrontEngine::process
//!                                                     │
//!         <out>/<YYYY-MM>/<date>_<variable>.csv ◄── OutputFilter
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod filter;
pub mod source;
pub mod writer;

pub use batch::{discover, BatchMapper, BatchReport, GranuleReport};
pub use config::{LoggingConfig, MapperConfig};
pub use error::{MapperError, Result};
pub use filter::{BoundingBox, OutputFilter, ValueRange};
pub use source::{GranuleSource, JsonGranuleReader};
pub use writer::{output_path, parse_date, CsvWriter, CSV_HEADER};
