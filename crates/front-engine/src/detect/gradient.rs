//! Gap-tolerant 3x3 gradient magnitude.
//!
//! Each derivative is built from three parallel lines of the window, as a
//! Sobel operator would, but a line only contributes when it yields a
//! difference from present values. Missing positions are skipped, never read
//! as zero, so data gaps do not create artificial steps.

use super::window::{Slot, Window};
use crate::config::GradientKernel;

/// Difference along one 3-position line, in units of one bin.
///
/// Central when both ends are present, one-sided against the middle when
/// only one end is, `None` otherwise.
#[inline]
pub fn line_difference(lo: Slot, mid: Slot, hi: Slot) -> Option<f64> {
    match (lo.value(), mid.value(), hi.value()) {
        (Some(lo), _, Some(hi)) => Some((hi - lo) / 2.0),
        (None, Some(mid), Some(hi)) => Some(hi - mid),
        (Some(lo), Some(mid), None) => Some(mid - lo),
        _ => None,
    }
}

/// Weighted mean of the available line differences.
fn combine(differences: [Option<f64>; 3], weights: [f64; 3]) -> Option<f64> {
    let mut sum = 0.0;
    let mut total = 0.0;
    for (d, w) in differences.iter().zip(weights) {
        if let Some(d) = d {
            sum += w * d;
            total += w;
        }
    }
    (total > 0.0).then(|| sum / total)
}

/// East-west and north-south derivatives of a 3x3 window.
pub fn derivatives(window: &Window, kernel: GradientKernel) -> Option<(f64, f64)> {
    debug_assert_eq!(window.width(), 3);
    let weights = kernel.weights();

    // Lines run north (0) to south (2); positions west (0) to east (2).
    let gx = combine(
        [0, 1, 2].map(|i| line_difference(window.get(i, 0), window.get(i, 1), window.get(i, 2))),
        weights,
    )?;
    let gy = combine(
        [0, 1, 2].map(|j| line_difference(window.get(2, j), window.get(1, j), window.get(0, j))),
        weights,
    )?;

    Some((gx, gy))
}

/// Gradient magnitude of a 3x3 window, `None` if either axis has no usable line.
pub fn gradient_magnitude(window: &Window, kernel: GradientKernel) -> Option<f64> {
    let (gx, gy) = derivatives(window, kernel)?;
    Some(gx.hypot(gy))
}
