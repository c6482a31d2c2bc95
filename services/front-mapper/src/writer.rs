//! CSV output and file naming.

use chrono::{DateTime, NaiveDate};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use front_engine::FrontResult;

use crate::error::{MapperError, Result};

/// Header row of every output file.
pub const CSV_HEADER: &str = "Latitude,Longitude,Data,Date";

/// Parse a granule date: RFC 3339, `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|_| MapperError::InvalidDate(s.to_string()))
}

/// `<out>/<YYYY-MM>/<YYYY-MM-DD>_<variable>.csv`
pub fn output_path(out_dir: &Path, date: NaiveDate, variable: &str) -> PathBuf {
    out_dir
        .join(date.format("%Y-%m").to_string())
        .join(format!("{}_{}.csv", date.format("%Y-%m-%d"), variable))
}

/// Writes result rows as CSV.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    out_dir: PathBuf,
    variable: String,
}

impl CsvWriter {
    pub fn new(out_dir: impl Into<PathBuf>, variable: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            variable: variable.into(),
        }
    }

    /// Write `rows` for the granule dated `date`, replacing any earlier file.
    ///
    /// Returns the written path.
    pub fn write(&self, date: &str, rows: &[FrontResult]) -> Result<PathBuf> {
        let date = parse_date(date)?;
        let path = output_path(&self.out_dir, date, &self.variable);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MapperError::io(parent, e))?;
        }

        let file = File::create(&path).map_err(|e| MapperError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        let date = date.format("%Y-%m-%d").to_string();
        write_rows(&mut out, rows, &date).map_err(|e| MapperError::io(&path, e))?;
        Ok(path)
    }
}

/// Every row carries `date`, the normalized granule date, in its last column.
fn write_rows<W: Write>(out: &mut W, rows: &[FrontResult], date: &str) -> std::io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{}",
            row.latitude,
            row.longitude,
            row.value,
            escape_field(date)
        )?;
    }
    out.flush()
}

/// Quote a field when it holds a separator, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
