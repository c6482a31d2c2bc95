//! Batch mapping: discover granules, process them in parallel, write CSVs.
//!
//! Every granule is independent. A failure is logged and recorded in the
//! [`BatchReport`]; the remaining granules still run.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use front_engine::{DetectionSummary, FrontEngine};

use crate::config::MapperConfig;
use crate::error::{MapperError, Result};
use crate::source::GranuleSource;
use crate::writer::CsvWriter;

/// Outcome of one successfully mapped granule.
#[derive(Debug, Clone)]
pub struct GranuleReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_written: usize,
    pub summary: DetectionSummary,
    pub degenerate_bins: usize,
}

/// Outcome of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<GranuleReport>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn rows_written(&self) -> usize {
        self.succeeded.iter().map(|r| r.rows_written).sum()
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        !self.failed.is_empty() && self.succeeded.is_empty()
    }
}

/// Find every file under `input_dir` that `source` accepts, sorted by path.
pub fn discover(input_dir: &Path, source: &dyn GranuleSource) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(input_dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(input_dir).to_path_buf();
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            MapperError::io(path, io)
        })?;
        if entry.file_type().is_file() && source.accepts(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Maps granules to CSV files.
pub struct BatchMapper<S> {
    source: S,
    engine: FrontEngine,
    writer: CsvWriter,
    config: MapperConfig,
}

impl<S: GranuleSource> BatchMapper<S> {
    pub fn new(source: S, config: MapperConfig) -> Self {
        Self {
            engine: FrontEngine::with_cache_limit(config.cache_memory_bytes()),
            writer: CsvWriter::new(&config.output_dir, &config.variable),
            source,
            config,
        }
    }

    pub fn engine(&self) -> &FrontEngine {
        &self.engine
    }

    /// Discover and map everything under the configured input directory.
    pub fn run(&self) -> Result<BatchReport> {
        let paths = discover(&self.config.input_dir, &self.source)?;
        if paths.is_empty() {
            warn!(input_dir = %self.config.input_dir.display(), "No granules found");
        }
        Ok(self.run_paths(&paths))
    }

    /// Map an explicit list of granules in parallel.
    pub fn run_paths(&self, paths: &[PathBuf]) -> BatchReport {
        let start = Instant::now();
        info!(granules = paths.len(), "Starting batch");

        let outcomes: Vec<(PathBuf, Result<GranuleReport>)> = paths
            .par_iter()
            .map(|path| (path.clone(), self.map_granule(path)))
            .collect();

        let mut report = BatchReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(granule) => report.succeeded.push(granule),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Granule failed");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            rows = report.rows_written(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch complete"
        );
        report
    }

    /// Read, detect, filter and write one granule.
    pub fn map_granule(&self, path: &Path) -> Result<GranuleReport> {
        let granule = self.source.read(path)?;
        let output = self.engine.process(&granule, &self.config.detector)?;

        let rows = self.config.output_filter().apply(output.results);
        let written = self.writer.write(&granule.date, &rows)?;

        info!(
            input = %path.display(),
            output = %written.display(),
            rows = rows.len(),
            "Mapped granule"
        );

        Ok(GranuleReport {
            input: path.to_path_buf(),
            output: written,
            rows_written: rows.len(),
            summary: output.summary,
            degenerate_bins: output.warnings.len(),
        })
    }
}
