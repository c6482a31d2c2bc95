//! Front mapper.
//!
//! Runs Belkin-O'Reilly front detection over a directory of binned
//! ocean-color granules and writes one CSV map per granule.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use front_engine::GradientKernel;
use front_mapper::{BatchMapper, BoundingBox, JsonGranuleReader, MapperConfig};

#[derive(Parser, Debug)]
#[command(name = "front-mapper")]
#[command(about = "Belkin-O'Reilly front maps from binned ocean-color granules")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "FRONT_MAPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Input directory (overrides config)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Variable name used in output file names
    #[arg(long)]
    variable: Option<String>,

    /// Crop box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Take the natural log of values before detection
    #[arg(long)]
    log_transform: Option<bool>,

    /// Gradient kernel (sobel, prewitt, scharr)
    #[arg(long)]
    kernel: Option<String>,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty: bool,
}

fn parse_bbox(s: &str) -> std::result::Result<BoundingBox, String> {
    BoundingBox::parse(s).ok_or_else(|| format!("expected min_lon,min_lat,max_lon,max_lat, got '{}'", s))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("front-mapper: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_tracing(&config, args.pretty) {
        eprintln!("front-mapper: {:#}", e);
        return ExitCode::from(2);
    }

    match run(config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Batch aborted");
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &Args) -> Result<MapperConfig> {
    let mut config = match &args.config {
        Some(path) => MapperConfig::load(path)?,
        None => {
            let input = args.input.clone().context("--input is required without --config")?;
            let output = args.output.clone().context("--output is required without --config")?;
            MapperConfig::new(input, output)
        }
    };

    if let Some(input) = &args.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(variable) = &args.variable {
        config.variable = variable.clone();
    }
    if let Some(bbox) = args.bbox {
        config.bbox = bbox;
    }
    if let Some(log_transform) = args.log_transform {
        config.detector.use_log_transform = log_transform;
    }
    if let Some(kernel) = &args.kernel {
        config.detector.kernel = GradientKernel::from_str(kernel);
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.pretty {
        config.logging.format = "pretty".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &MapperConfig, pretty: bool) -> Result<()> {
    let level = match config.logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if pretty || config.logging.format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }
    Ok(())
}

/// Returns whether at least one granule succeeded (or there was nothing to do).
fn run(config: MapperConfig) -> Result<bool> {
    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    info!(
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        variable = %config.variable,
        kernel = %config.detector.kernel,
        log_transform = config.detector.use_log_transform,
        "Starting front mapper"
    );

    let mapper = BatchMapper::new(JsonGranuleReader::new(), config);
    let report = mapper.run()?;

    let cache = mapper.engine().cache_stats();
    info!(
        granules = report.total(),
        failed = report.failed.len(),
        rows = report.rows_written(),
        cache_hit_rate = cache.hit_rate(),
        "Front mapper finished"
    );

    Ok(!report.all_failed())
}
