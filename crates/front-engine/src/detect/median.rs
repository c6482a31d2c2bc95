//! Contextual median filter.
//!
//! Removes small-scale noise peaks without flattening real features. A cell is
//! a *peak* in a square window when it is a strict extremum along all four
//! slices through the window centre (NW-SE, N-S, NE-SW, W-E). Cells that are
//! peaks in their 3x3 window but not in their 5x5 window are replaced by the
//! 3x3 median; peaks that persist at 5x5 are kept.
//!
//! Missing positions inside a window (no data, or beyond a pole) take the
//! median of the window's present values before the peak tests.

use tracing::debug;

use super::window::Window;
use crate::field::DenseField;
use crate::scheme::GridCell;

/// Median of `values`; `None` when empty. Reorders `values`.
pub fn median(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    }
}

/// Whether `slice[idx]` is strictly above or strictly below every other element.
pub fn is_strict_extremum(slice: &[f64], idx: usize) -> bool {
    let x = slice[idx];
    let mut above = false;
    let mut below = false;
    for (i, &v) in slice.iter().enumerate() {
        if i == idx {
            continue;
        }
        if x > v {
            above = true;
        } else if x < v {
            below = true;
        } else {
            return false;
        }
    }
    above != below
}

/// Index of position `j` along slice `slice` (NW-SE, N-S, NE-SW, W-E).
fn slice_index(slice: usize, j: usize, width: usize) -> usize {
    let c = width / 2;
    match slice {
        0 => j * width + j,
        1 => j * width + c,
        2 => j * width + (width - 1 - j),
        _ => c * width + j,
    }
}

/// Whether the centre of a row-major `width` x `width` window is a strict
/// extremum along all four slices through it.
pub fn is_window_peak(values: &[f64], width: usize) -> bool {
    let c = width / 2;
    let mut line = vec![0.0; width];

    (0..4).all(|slice| {
        for (j, v) in line.iter_mut().enumerate() {
            *v = values[slice_index(slice, j, width)];
        }
        is_strict_extremum(&line, c)
    })
}

/// Gap-filled window values, or `None` when the window holds no data.
fn filled_values(window: &Window) -> Option<Vec<f64>> {
    let fill = median(&mut window.present_values())?;
    Some(window.filled_with(fill))
}

/// Apply the contextual median filter to every present cell of `field`.
///
/// All windows read the unfiltered input, so replacements never cascade.
/// Returns the filtered field and the number of replaced cells.
pub fn contextual_median_filter(field: &DenseField) -> (DenseField, u64) {
    let layout = field.layout();
    let mut output = field.clone();
    let mut replaced = 0u64;

    for row in 0..layout.row_count() {
        let start = layout.row_start(row);
        for col in 0..layout.row_len(row) {
            let bin = start + col as u64;
            if !field.is_present(bin) {
                continue;
            }
            let cell = GridCell { row, col };

            let Some(three) = filled_values(&Window::gather(field, cell, 3)) else {
                continue;
            };
            if !is_window_peak(&three, 3) {
                continue;
            }
            let Some(five) = filled_values(&Window::gather(field, cell, 5)) else {
                continue;
            };
            if is_window_peak(&five, 5) {
                continue;
            }

            let mut three = three;
            if let Some(m) = median(&mut three) {
                output.set(bin, m);
                replaced += 1;
            }
        }
    }

    debug!(replaced, "Applied contextual median filter");
    (output, replaced)
}
