//! Granule sources.
//!
//! A source turns one file on disk into an engine [`Granule`]. The JSON
//! reader is the only format shipped; archive formats plug in behind the
//! same trait.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use front_engine::{BinKey, BinRecord, BinningScheme, Granule, GridCell, SchemeDescriptor};

use crate::error::{MapperError, Result};

/// Produces granules from files.
pub trait GranuleSource: Send + Sync {
    /// Whether `path` looks like something this source can read.
    fn accepts(&self, path: &Path) -> bool;

    /// Read and convert one granule.
    fn read(&self, path: &Path) -> Result<Granule>;
}

/// One granule as stored in a JSON document.
#[derive(Debug, Deserialize)]
struct GranuleDocument {
    scheme: SchemeDescriptor,
    date: String,
    /// First bin number used by the archive (0 or 1).
    #[serde(default)]
    bin_base: u64,
    records: Vec<RecordDocument>,
}

/// A record addressed either by `bin` or by `row` + `col`.
#[derive(Debug, Deserialize)]
struct RecordDocument {
    #[serde(default)]
    bin: Option<u64>,
    #[serde(default)]
    row: Option<u32>,
    #[serde(default)]
    col: Option<u32>,
    #[serde(alias = "sum")]
    weighted_sum: f64,
    #[serde(default = "unit_weight")]
    weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl RecordDocument {
    fn into_record(self, index: usize, bin_base: u64) -> Result<BinRecord> {
        let key = match (self.bin, self.row, self.col) {
            (Some(bin), None, None) => {
                let bin = bin.checked_sub(bin_base).ok_or_else(|| {
                    MapperError::invalid_record(
                        index,
                        format!("bin {} is below the archive base {}", bin, bin_base),
                    )
                })?;
                BinKey::Number(bin)
            }
            (None, Some(row), Some(col)) => BinKey::Cell(GridCell::new(row, col)),
            _ => {
                return Err(MapperError::invalid_record(
                    index,
                    "needs either `bin` or both `row` and `col`",
                ))
            }
        };

        Ok(BinRecord {
            key,
            weighted_sum: self.weighted_sum,
            weight: self.weight,
        })
    }
}

/// Reads granules from `.json` documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonGranuleReader;

impl JsonGranuleReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a granule from an in-memory document.
    pub fn parse(&self, path: &Path, content: &str) -> Result<Granule> {
        let doc: GranuleDocument =
            serde_json::from_str(content).map_err(|source| MapperError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if doc.bin_base > 1 {
            return Err(MapperError::invalid_record(
                0,
                format!("bin_base must be 0 or 1, got {}", doc.bin_base),
            ));
        }

        let scheme = BinningScheme::try_from(doc.scheme)?;
        let bin_base = doc.bin_base;
        let records = doc
            .records
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_record(index, bin_base))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            path = %path.display(),
            kind = %scheme.kind(),
            total_bins = scheme.total_bins(),
            records = records.len(),
            "Parsed granule"
        );

        Ok(Granule {
            scheme,
            records,
            date: doc.date,
        })
    }
}

impl GranuleSource for JsonGranuleReader {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn read(&self, path: &Path) -> Result<Granule> {
        let content = fs::read_to_string(path).map_err(|e| MapperError::io(path, e))?;
        self.parse(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use front_engine::FrontError;
    use std::path::PathBuf;

    fn parse(json: &str) -> Result<Granule> {
        JsonGranuleReader::new().parse(&PathBuf::from("granule.json"), json)
    }

    #[test]
    fn test_accepts_json_only() {
        let reader = JsonGranuleReader::new();
        assert!(reader.accepts(Path::new("/data/A2019.L3b_DAY_CHL.json")));
        assert!(reader.accepts(Path::new("granule.JSON")));
        assert!(!reader.accepts(Path::new("granule.nc")));
        assert!(!reader.accepts(Path::new("README")));
    }

    #[test]
    fn test_parse_variable_granule() {
        let granule = parse(
            r#"{
                "scheme": {"kind": "variable", "total_bins": 8, "row_count": 2,
                           "row_bin_counts": [4, 4]},
                "date": "2019-07-01",
                "records": [
                    {"bin": 0, "weighted_sum": 2.0, "weight": 2.0},
                    {"bin": 7, "sum": 0.5}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(granule.scheme, BinningScheme::variable(vec![4, 4]).unwrap());
        assert_eq!(granule.date, "2019-07-01");
        assert_eq!(granule.records[0], BinRecord::new(0, 2.0, 2.0));
        assert_eq!(granule.records[1], BinRecord::new(7, 0.5, 1.0));
    }

    #[test]
    fn test_one_based_bins_are_shifted() {
        let granule = parse(
            r#"{
                "scheme": {"kind": "variable", "total_bins": 8, "row_count": 2,
                           "row_bin_counts": [4, 4]},
                "date": "2019-07-01",
                "bin_base": 1,
                "records": [{"bin": 1, "weighted_sum": 1.0}, {"bin": 8, "weighted_sum": 1.0}]
            }"#,
        )
        .unwrap();

        assert_eq!(granule.records[0].key, BinKey::Number(0));
        assert_eq!(granule.records[1].key, BinKey::Number(7));
    }

    #[test]
    fn test_bin_zero_with_one_based_archive_fails() {
        let err = parse(
            r#"{
                "scheme": {"kind": "fixed", "total_bins": 8, "row_count": 2},
                "date": "2019-07-01",
                "bin_base": 1,
                "records": [{"bin": 0, "weighted_sum": 1.0}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MapperError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn test_fixed_records_by_cell() {
        let granule = parse(
            r#"{
                "scheme": {"kind": "fixed", "total_bins": 8, "row_count": 2, "row_width": 4},
                "date": "20100115",
                "records": [{"row": 1, "col": 3, "weighted_sum": 0.2}]
            }"#,
        )
        .unwrap();
        assert_eq!(granule.records[0].key, BinKey::Cell(GridCell::new(1, 3)));
    }

    #[test]
    fn test_record_without_address_fails() {
        let err = parse(
            r#"{
                "scheme": {"kind": "fixed", "total_bins": 8, "row_count": 2},
                "date": "2019-07-01",
                "records": [{"bin": 1, "weighted_sum": 1.0}, {"row": 1, "weighted_sum": 1.0}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MapperError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_inconsistent_scheme_is_engine_error() {
        let err = parse(
            r#"{
                "scheme": {"kind": "variable", "total_bins": 9, "row_count": 2,
                           "row_bin_counts": [4, 4]},
                "date": "2019-07-01",
                "records": []
            }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapperError::Engine(FrontError::InvalidScheme { ref field, .. }) if field == "total_bins"
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse("{not json"), Err(MapperError::Parse { .. })));
    }
}
