//! Row editing on top of [`Grid::shift_rows`].
//!
//! The compound operations here (`clear_rows`, `hide_rows`, `insert_rows`,
//! `copy_rows`, `delete_rows`) are what a report template driver calls to
//! grow, repeat and drop blocks of rows. All of them work on whole rows: a
//! selection's columns are ignored.
//!
//! A merged region counts as part of a selection only when its whole row
//! span lies inside the selection's rows. Regions that straddle a selection
//! edge are left alone; keeping them consistent is up to the caller.
//!
//! Compound operations are not atomic. Preconditions are checked before the
//! first change, but nothing is rolled back if a later step fails.

pub(crate) mod mutation;
mod rows;

use serde::{Deserialize, Serialize};

pub use mutation::CellMut;
pub use rows::{clear_rows, copy_rows, delete_rows, hide_rows, insert_rows};

use crate::types::Row;

/// What `copy_rows` carries over from the source block.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CopyPolicy {
    /// Cell styles only: the copies are blank, default-height rows.
    StyleOnly,
    /// Styles, values, formulas, row height/visibility and merged regions.
    #[default]
    Full,
}

impl CopyPolicy {
    #[must_use]
    pub fn copies_values(self) -> bool {
        matches!(self, Self::Full)
    }

    #[must_use]
    pub fn copies_row_height(self) -> bool {
        matches!(self, Self::Full)
    }

    #[must_use]
    pub fn copies_merges(self) -> bool {
        matches!(self, Self::Full)
    }

    /// The row that lands at the destination when `source` is copied.
    pub(crate) fn copy_row(self, source: &Row) -> Row {
        let cells = source
            .cells
            .iter()
            .map(|(&col, cell)| {
                let copied = if self.copies_values() {
                    cell.clone()
                } else {
                    cell.style_only()
                };
                (col, copied)
            })
            .collect();

        if self.copies_row_height() {
            Row {
                cells,
                ..source.clone()
            }
        } else {
            Row {
                cells,
                style: source.style,
                ..Row::default()
            }
        }
    }
}
