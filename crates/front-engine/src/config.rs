//! Configuration for the front detector.

use serde::{Deserialize, Serialize};

use crate::error::{FrontError, Result};

/// Number of positions in the 3x3 neighborhood around a cell.
pub const NEIGHBORHOOD_SIZE: usize = 8;

/// Per-invocation detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sentinel written for bins without a front value.
    pub fill_value: f64,

    /// Take the natural log of values before filtering (concentrations).
    pub use_log_transform: bool,

    /// Minimum present neighbors (out of 8) needed to compute a gradient.
    pub min_neighbors: usize,

    /// Fill cells that border a present/absent transition.
    pub suppress_cloud_edges: bool,

    /// Run the contextual median filter before the gradient.
    pub median_filter: bool,

    /// Finite-difference weights across the three window lines.
    pub kernel: GradientKernel,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fill_value: -999.0,
            use_log_transform: false,
            min_neighbors: 5,
            suppress_cloud_edges: true,
            median_filter: true,
            kernel: GradientKernel::Sobel,
        }
    }
}

impl DetectorConfig {
    /// Settings for chlorophyll-like concentrations (log transform on).
    pub fn concentration() -> Self {
        Self {
            use_log_transform: true,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("BOA_FILL_VALUE") {
            if let Ok(fill) = val.parse() {
                config.fill_value = fill;
            }
        }

        if let Ok(val) = std::env::var("BOA_LOG_TRANSFORM") {
            config.use_log_transform = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("BOA_MIN_NEIGHBORS") {
            if let Ok(n) = val.parse() {
                config.min_neighbors = n;
            }
        }

        if let Ok(val) = std::env::var("BOA_SUPPRESS_CLOUD_EDGES") {
            config.suppress_cloud_edges = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("BOA_MEDIAN_FILTER") {
            config.median_filter = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("BOA_KERNEL") {
            config.kernel = GradientKernel::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.fill_value.is_finite() {
            return Err(FrontError::ConfigError(
                "fill_value must be finite".to_string(),
            ));
        }

        if self.min_neighbors > NEIGHBORHOOD_SIZE {
            return Err(FrontError::ConfigError(format!(
                "min_neighbors must be <= {}",
                NEIGHBORHOOD_SIZE
            )));
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Line weights of the 3x3 derivative operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKernel {
    /// 1-2-1 weighting.
    #[default]
    Sobel,
    /// Uniform 1-1-1 weighting.
    Prewitt,
    /// 3-10-3 weighting, better rotational symmetry.
    Scharr,
}

impl GradientKernel {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prewitt" => Self::Prewitt,
            "scharr" => Self::Scharr,
            _ => Self::Sobel,
        }
    }

    /// Weights for the (before, centre, after) lines.
    pub fn weights(&self) -> [f64; 3] {
        match self {
            Self::Sobel => [1.0, 2.0, 1.0],
            Self::Prewitt => [1.0, 1.0, 1.0],
            Self::Scharr => [3.0, 10.0, 3.0],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sobel => "sobel",
            Self::Prewitt => "prewitt",
            Self::Scharr => "scharr",
        }
    }
}

impl std::fmt::Display for GradientKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
