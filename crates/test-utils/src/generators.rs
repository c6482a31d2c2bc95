//! Bin record generators for synthetic ocean-color granules.
//!
//! These generators create predictable, verifiable record sets over any
//! binning scheme so detector behavior can be checked against known fronts.

use front_engine::{resolve, BinRecord, BinningScheme, ResolvedBin};

/// Creates one record per bin with the value computed from its centroid.
///
/// Records use weight 1, so the assembled mean equals the generated value.
///
/// # Example
///
/// ```
/// use front_engine::BinningScheme;
/// use test_utils::records_from_fn;
///
/// let scheme = BinningScheme::variable(vec![4, 4]).unwrap();
/// let records = records_from_fn(&scheme, |bin| bin.latitude);
/// assert_eq!(records.len(), 8);
/// assert_eq!(records[0].weighted_sum, -45.0);
/// ```
pub fn records_from_fn(scheme: &BinningScheme, f: impl Fn(&ResolvedBin) -> f64) -> Vec<BinRecord> {
    let geometry = resolve(scheme).expect("test scheme must be valid");
    geometry
        .iter()
        .map(|bin| BinRecord::mean(bin.bin, f(&bin)))
        .collect()
}

/// Creates one record per bin, all with the same value.
pub fn create_uniform_records(scheme: &BinningScheme, value: f64) -> Vec<BinRecord> {
    (0..scheme.total_bins())
        .map(|bin| BinRecord::mean(bin, value))
        .collect()
}

/// Creates a sharp east-west step at `split_lon`: `west` below, `east` at or above.
pub fn create_step_records(
    scheme: &BinningScheme,
    split_lon: f64,
    west: f64,
    east: f64,
) -> Vec<BinRecord> {
    records_from_fn(scheme, |bin| if bin.longitude < split_lon { west } else { east })
}

/// Creates a chlorophyll-like field: log-normal around `base` mg/m^3 with a
/// smooth latitudinal trend and deterministic per-bin noise.
pub fn create_chlorophyll_records(scheme: &BinningScheme, base: f64, seed: u32) -> Vec<BinRecord> {
    records_from_fn(scheme, |bin| {
        let noise = (simple_hash(bin.bin as u32, bin.row, seed) % 1000) as f64 / 1000.0 - 0.5;
        let trend = bin.latitude.to_radians().sin();
        base * (trend + 0.2 * noise).exp()
    })
}

/// Splits every record into `parts` partial accumulators with equal weight.
///
/// Assembling the result must give the same means as the input.
pub fn split_records(records: &[BinRecord], parts: u32) -> Vec<BinRecord> {
    let parts_f = parts as f64;
    records
        .iter()
        .flat_map(|r| {
            (0..parts).map(move |_| BinRecord {
                key: r.key,
                weighted_sum: r.weighted_sum / parts_f,
                weight: r.weight / parts_f,
            })
        })
        .collect()
}

/// Removes the records whose bin falls under `cloud`, simulating coverage gaps.
pub fn apply_cloud_mask(
    scheme: &BinningScheme,
    records: Vec<BinRecord>,
    cloud: impl Fn(&ResolvedBin) -> bool,
) -> Vec<BinRecord> {
    let geometry = resolve(scheme).expect("test scheme must be valid");
    let layout = geometry.layout();
    records
        .into_iter()
        .filter(|r| {
            let (bin, _) = layout.resolve_key(r.key).expect("test record must be in range");
            geometry.get(bin).map(|b| !cloud(&b)).unwrap_or(true)
        })
        .collect()
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}
