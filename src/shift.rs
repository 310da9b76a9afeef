//! Row shifting: the single structural primitive every compound row
//! operation is built on.
//!
//! `shift_rows(base, k)` moves every row at index `>= base` by `k` rows
//! (down for positive `k`, up for negative). Merged regions whose first row
//! lies at or below `base` travel with their rows, as do manual row breaks.
//! Column breaks are never touched.

use std::collections::BTreeSet;

use crate::cell_ref::MAX_ROW;
use crate::error::{ReportError, Result};
use crate::types::{offset_index, Grid};

impl Grid {
    /// Move every row at index `>= base_row` by `shift` rows.
    ///
    /// Upward shifts overwrite whatever rows already occupy the destination.
    /// Bounds are validated before anything moves, so a rejected shift
    /// leaves the grid untouched.
    pub fn shift_rows(&mut self, base_row: u32, shift: i64) -> Result<()> {
        if shift == 0 {
            return Ok(());
        }
        if offset_index(base_row, shift).is_none() {
            return Err(ReportError::precondition(format!(
                "shifting rows from {base_row} by {shift} moves them above row 0"
            )));
        }
        if let Some(highest) = self.highest_row_from(base_row) {
            let fits = offset_index(highest, shift).is_some_and(|row| row <= MAX_ROW);
            if !fits {
                return Err(ReportError::precondition(format!(
                    "shifting rows from {base_row} by {shift} pushes row {highest} past the last row"
                )));
            }
        }

        let moved = self.rows.split_off(&base_row);
        let count = moved.len();
        for (idx, row) in moved {
            self.rows.insert(relocate(idx, shift)?, row);
        }

        for region in &mut self.merges {
            if region.first_row >= base_row {
                if let Some(moved) = region.offset_rows(shift) {
                    *region = moved;
                }
            }
        }

        let breaks = self.row_breaks.split_off(&base_row);
        let relocated = breaks
            .into_iter()
            .map(|row| relocate(row, shift))
            .collect::<Result<BTreeSet<u32>>>()?;
        self.row_breaks.extend(relocated);

        log::debug!(
            "shifted {count} rows of '{}' from row {base_row} by {shift}",
            self.name
        );
        Ok(())
    }

    /// Largest row index that a shift from `base_row` would move: rows,
    /// the bottom of travelling merged regions, and row breaks.
    fn highest_row_from(&self, base_row: u32) -> Option<u32> {
        let last_row = self.rows.range(base_row..).next_back().map(|(&idx, _)| idx);
        let last_merge = self
            .merges
            .iter()
            .filter(|m| m.first_row >= base_row)
            .map(|m| m.last_row)
            .max();
        let last_break = self.row_breaks.range(base_row..).next_back().copied();
        [last_row, last_merge, last_break].into_iter().flatten().max()
    }
}

fn relocate(idx: u32, shift: i64) -> Result<u32> {
    offset_index(idx, shift)
        .ok_or_else(|| ReportError::precondition(format!("row {idx} cannot move by {shift}")))
}
