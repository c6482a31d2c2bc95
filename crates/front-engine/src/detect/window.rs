//! Row-aware square windows over an irregular bin layout.
//!
//! A window of odd width `w` around a cell takes `w` rows centred on the
//! cell's row. In the cell's own row the window spans the neighboring
//! columns; in every other row it spans the columns around the bin whose
//! cell contains the centre's longitude, so rows of different widths line up
//! by longitude rather than by column index. Columns wrap at the
//! antimeridian. Rows beyond a pole are [`Slot::Outside`], as are repeat
//! visits to a bin in rows narrower than the window.
//!
//! Layout of `slots`: line `i` runs north (0) to south (`w - 1`), position
//! `j` runs west (0) to east (`w - 1`).

use crate::field::DenseField;
use crate::scheme::GridCell;

/// Largest supported window width.
pub const MAX_WIDTH: usize = 5;

/// Content of one window position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// Beyond a pole; no bin exists there.
    Outside,
    /// A bin without data.
    Absent,
    Present(f64),
}

impl Slot {
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Slot::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// A `width` x `width` neighborhood around one cell.
#[derive(Debug, Clone)]
pub struct Window {
    width: usize,
    slots: [Slot; MAX_WIDTH * MAX_WIDTH],
}

/// Column offsets 0, -1, 1, -2, 2, ... up to `half`.
fn centre_out_offsets(half: i64) -> impl Iterator<Item = i64> {
    std::iter::once(0).chain((1..=half).flat_map(|d| [-d, d]))
}

impl Window {
    /// Gather the window of `width` (odd, at most [`MAX_WIDTH`]) around `cell`.
    pub fn gather(field: &DenseField, cell: GridCell, width: usize) -> Self {
        debug_assert!(width % 2 == 1 && width <= MAX_WIDTH);

        let layout = field.layout();
        let half = (width / 2) as i64;
        let rows = layout.row_count() as i64;
        let mut slots = [Slot::Outside; MAX_WIDTH * MAX_WIDTH];

        for i in 0..width {
            let row = cell.row as i64 + half - i as i64;
            if row < 0 || row >= rows {
                continue;
            }
            let row = row as u32;
            let centre_col = if row == cell.row {
                cell.col
            } else {
                layout.nearest_col(cell.row, cell.col, row)
            };
            let start = layout.row_start(row);

            // Rows narrower than the window would wrap onto the same bin
            // twice; only the position nearest the centre keeps it.
            let mut seen = [u32::MAX; MAX_WIDTH];
            for (k, offset) in centre_out_offsets(half).take(width).enumerate() {
                let col = layout.wrap_col(row, centre_col as i64 + offset);
                let j = (offset + half) as usize;
                if seen[..k].contains(&col) {
                    continue;
                }
                seen[k] = col;

                let bin = start + col as u64;
                slots[i * width + j] = match field.value(bin) {
                    Some(v) => Slot::Present(v),
                    None => Slot::Absent,
                };
            }
        }

        Self { width, slots }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Slot at line `i` (north to south), position `j` (west to east).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Slot {
        self.slots[i * self.width + j]
    }

    pub fn centre(&self) -> Slot {
        let c = self.width / 2;
        self.get(c, c)
    }

    fn slots(&self) -> &[Slot] {
        &self.slots[..self.width * self.width]
    }

    /// All positions except the centre.
    pub fn neighbors(&self) -> impl Iterator<Item = Slot> + '_ {
        let centre = (self.width * self.width) / 2;
        self.slots()
            .iter()
            .enumerate()
            .filter(move |(idx, _)| *idx != centre)
            .map(|(_, slot)| *slot)
    }

    /// Number of neighbors holding data.
    pub fn present_neighbors(&self) -> usize {
        self.neighbors()
            .filter(|slot| matches!(slot, Slot::Present(_)))
            .count()
    }

    /// Whether any in-grid neighbor lacks data.
    pub fn has_absent_neighbor(&self) -> bool {
        self.neighbors().any(|slot| slot == Slot::Absent)
    }

    /// Values of all present positions, centre included.
    pub fn present_values(&self) -> Vec<f64> {
        self.slots().iter().filter_map(|slot| slot.value()).collect()
    }

    /// Row-major values with every non-present position replaced by `fill`.
    pub fn filled_with(&self, fill: f64) -> Vec<f64> {
        self.slots()
            .iter()
            .map(|slot| slot.value().unwrap_or(fill))
            .collect()
    }
}
