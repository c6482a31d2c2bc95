//! Common test fixtures for front detection tests.
//!
//! Pre-defined schemes and regions that represent common scenarios in
//! level-3 ocean-color processing.

use front_engine::BinningScheme;

/// Common bounding boxes as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// North-east Pacific, the default mapping region
    pub const NE_PACIFIC: (f64, f64, f64, f64) = (-180.0, 25.0, -120.0, 75.0);

    /// Crosses antimeridian (Pacific-centric)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);
}

/// Common binning schemes.
pub mod schemes {
    use super::BinningScheme;

    /// Two rows of four bins: the smallest scheme with neighbors in both directions.
    pub fn two_by_four() -> BinningScheme {
        BinningScheme::variable(vec![4, 4]).expect("valid scheme")
    }

    /// Coarse ISIN scheme (10 degree rows), cheap enough for exhaustive checks.
    pub fn coarse_isin() -> BinningScheme {
        BinningScheme::isin(18).expect("valid scheme")
    }

    /// ISIN scheme with 1 degree rows.
    pub fn one_degree_isin() -> BinningScheme {
        BinningScheme::isin(180).expect("valid scheme")
    }

    /// Small fixed global grid (10 degree cells).
    pub fn coarse_fixed() -> BinningScheme {
        BinningScheme::fixed(18, 36).expect("valid scheme")
    }
}

/// Common fill sentinels.
pub mod fill {
    /// Fill used by the mapping pipeline.
    pub const DEFAULT: f64 = -999.0;

    /// NetCDF-style short fill.
    pub const SHORT: f64 = -32767.0;
}
