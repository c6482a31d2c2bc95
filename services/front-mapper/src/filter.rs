//! Cropping and value clipping of projected results.

use serde::{Deserialize, Serialize};

use front_engine::FrontResult;

/// Geographic bounding box in degrees (inclusive edges).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse `min_lon,min_lat,max_lon,max_lat`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            &[min_lon, min_lat, max_lon, max_lat] => {
                Some(Self::new(min_lon, min_lat, max_lon, max_lat))
            }
            _ => None,
        }
    }

    /// Check if a point is contained within this bounding box.
    ///
    /// A box whose `min_lon` exceeds `max_lon` crosses the antimeridian.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let lat_ok = lat >= self.min_lat && lat <= self.max_lat;
        let lon_ok = if self.crosses_antimeridian() {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        };
        lat_ok && lon_ok
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        // North-east Pacific
        Self::new(-180.0, 25.0, -120.0, 75.0)
    }
}

/// Open interval of accepted values; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value > min) && self.max.map_or(true, |max| value < max)
    }
}

/// Keeps the rows a map should show.
#[derive(Debug, Clone, Copy)]
pub struct OutputFilter {
    pub bbox: BoundingBox,
    pub range: ValueRange,
    pub fill_value: f64,
}

impl OutputFilter {
    pub fn new(bbox: BoundingBox, range: ValueRange, fill_value: f64) -> Self {
        Self {
            bbox,
            range,
            fill_value,
        }
    }

    pub fn accepts(&self, row: &FrontResult) -> bool {
        row.is_valid(self.fill_value)
            && !row.value.is_nan()
            && self.range.contains(row.value)
            && self.bbox.contains(row.longitude, row.latitude)
    }

    /// Drop rejected rows, keeping bin order.
    pub fn apply(&self, rows: Vec<FrontResult>) -> Vec<FrontResult> {
        rows.into_iter().filter(|row| self.accepts(row)).collect()
    }
}
