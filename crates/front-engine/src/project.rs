//! Joining detector output with bin centroids.

use serde::{Deserialize, Serialize};

use crate::detect::FrontField;
use crate::error::{FrontError, Result};
use crate::geometry::ResolvedGeometry;

/// One output row: a bin's centroid, its front value and the granule date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrontResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "Data")]
    pub value: f64,
    pub date: String,
}

impl FrontResult {
    /// Whether the value is a computed front strength rather than fill.
    pub fn is_valid(&self, fill_value: f64) -> bool {
        self.value != fill_value
    }
}

/// Pair every bin's value with its centroid, in bin-number order.
///
/// No filtering happens here; cropping and value clipping belong to the
/// consumer of the results.
pub fn project(fronts: &FrontField, geometry: &ResolvedGeometry, date: &str) -> Result<Vec<FrontResult>> {
    if fronts.len() != geometry.len() {
        return Err(FrontError::invalid_scheme(
            "geometry",
            format!(
                "detector produced {} values for {} resolved bins",
                fronts.len(),
                geometry.len()
            ),
        ));
    }

    Ok(fronts
        .values()
        .iter()
        .zip(geometry.latitudes().iter().zip(geometry.longitudes()))
        .map(|(&value, (&latitude, &longitude))| FrontResult {
            latitude,
            longitude,
            value,
            date: date.to_string(),
        })
        .collect())
}
