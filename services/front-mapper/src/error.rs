//! Error types for granule mapping.

use std::path::PathBuf;
use thiserror::Error;

use front_engine::FrontError;

/// Failure of a single granule. Never aborts a batch on its own.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed granule {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Unrecognised granule date '{0}'")]
    InvalidDate(String),

    #[error(transparent)]
    Engine(#[from] FrontError),
}

impl MapperError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
