use serde::{Deserialize, Serialize};

use super::merge::offset_index;
use super::{CellAddress, SheetId};
use crate::cell_ref::{MAX_COL, MAX_ROW};
use crate::error::{ReportError, Result};

/// An immutable rectangle on one sheet, given by its top-left and
/// bottom-right corners (both inclusive).
///
/// A selection holds indices, not references into the grid. After a
/// structural edit that moves rows (insert, copy, delete) a selection taken
/// earlier still points at the old indices; derive a fresh one instead.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", try_from = "SelectionCorners")]
pub struct Selection {
    top_left: CellAddress,
    bottom_right: CellAddress,
}

/// Serialized form of a [`Selection`], checked by [`Selection::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionCorners {
    top_left: CellAddress,
    bottom_right: CellAddress,
}

impl TryFrom<SelectionCorners> for Selection {
    type Error = ReportError;

    fn try_from(corners: SelectionCorners) -> Result<Self> {
        Self::new(corners.top_left, corners.bottom_right)
    }
}

impl Selection {
    /// Build a selection from two corners on the same sheet.
    ///
    /// Corners are not reordered: `top_left` must not lie below or to the
    /// right of `bottom_right`.
    pub fn new(top_left: CellAddress, bottom_right: CellAddress) -> Result<Self> {
        if top_left.sheet != bottom_right.sheet {
            return Err(ReportError::precondition(format!(
                "selection corners on different sheets ({} vs {})",
                top_left.sheet, bottom_right.sheet
            )));
        }
        if top_left.row > bottom_right.row || top_left.col > bottom_right.col {
            return Err(ReportError::precondition(format!(
                "inverted selection {top_left}:{bottom_right}"
            )));
        }
        if bottom_right.row > MAX_ROW || bottom_right.col > MAX_COL {
            return Err(ReportError::precondition(format!(
                "selection {top_left}:{bottom_right} exceeds the worksheet bounds"
            )));
        }
        Ok(Self {
            top_left: top_left.to_absolute(),
            bottom_right: bottom_right.to_absolute(),
        })
    }

    /// Rectangle `[top, bottom] x [left, right]` on `sheet`.
    pub fn from_bounds(sheet: SheetId, top: u32, left: u32, bottom: u32, right: u32) -> Result<Self> {
        Self::new(
            CellAddress::new(sheet, top, left),
            CellAddress::new(sheet, bottom, right),
        )
    }

    /// Whole-width row span `[top, bottom]` anchored at column 0.
    pub fn rows(sheet: SheetId, top: u32, bottom: u32) -> Result<Self> {
        Self::from_bounds(sheet, top, 0, bottom, 0)
    }

    #[must_use]
    pub fn sheet(&self) -> SheetId {
        self.top_left.sheet
    }

    #[must_use]
    pub fn top_left(&self) -> CellAddress {
        self.top_left
    }

    #[must_use]
    pub fn bottom_right(&self) -> CellAddress {
        self.bottom_right
    }

    #[must_use]
    pub fn top_row(&self) -> u32 {
        self.top_left.row
    }

    #[must_use]
    pub fn bottom_row(&self) -> u32 {
        self.bottom_right.row
    }

    #[must_use]
    pub fn left_col(&self) -> u32 {
        self.top_left.col
    }

    #[must_use]
    pub fn right_col(&self) -> u32 {
        self.bottom_right.col
    }

    /// (top, left, bottom, right)
    #[must_use]
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (
            self.top_left.row,
            self.top_left.col,
            self.bottom_right.row,
            self.bottom_right.col,
        )
    }

    /// Number of rows spanned (always at least 1).
    #[must_use]
    pub fn height(&self) -> u32 {
        self.bottom_right.row - self.top_left.row + 1
    }

    /// Number of columns spanned (always at least 1).
    #[must_use]
    pub fn width(&self) -> u32 {
        self.bottom_right.col - self.top_left.col + 1
    }

    #[must_use]
    pub fn is_single_row(&self) -> bool {
        self.height() == 1
    }

    #[must_use]
    pub fn is_multi_row(&self) -> bool {
        self.height() > 1
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.top_left.row..=self.bottom_right.row).contains(&row)
            && (self.top_left.col..=self.bottom_right.col).contains(&col)
    }

    /// Move both corners by the same delta.
    pub fn translate(&self, d_row: i64, d_col: i64) -> Result<Self> {
        if d_row == 0 && d_col == 0 {
            return Ok(*self);
        }
        let top_left = offset_address(self.top_left, d_row, d_col)?;
        let bottom_right = offset_address(self.bottom_right, d_row, d_col)?;
        Self::new(top_left, bottom_right)
    }

    /// Keep the top-left corner and move the bottom-right one by the delta.
    ///
    /// `extend(n, 0)` on a selection of height `n` yields the block covering
    /// the selection plus the same-shaped block right below it.
    pub fn extend(&self, d_row: i64, d_col: i64) -> Result<Self> {
        if d_row == 0 && d_col == 0 {
            return Ok(*self);
        }
        let bottom_right = offset_address(self.bottom_right, d_row, d_col)?;
        Self::new(self.top_left, bottom_right)
    }

    /// Row break that starts a page at the top edge: the break goes after
    /// the row just above the selection. `None` when the selection starts at
    /// row 0.
    #[must_use]
    pub fn row_break_at_top(&self) -> Option<u32> {
        self.top_left.row.checked_sub(1)
    }

    /// Row break that ends a page at the bottom edge (after the last row).
    #[must_use]
    pub fn row_break_at_bottom(&self) -> u32 {
        self.bottom_right.row
    }

    /// Column break just left of the selection; `None` at column 0.
    #[must_use]
    pub fn col_break_at_left(&self) -> Option<u32> {
        self.top_left.col.checked_sub(1)
    }

    /// Column break after the rightmost column.
    #[must_use]
    pub fn col_break_at_right(&self) -> u32 {
        self.bottom_right.col
    }
}

fn offset_address(addr: CellAddress, d_row: i64, d_col: i64) -> Result<CellAddress> {
    let row = offset_index(addr.row, d_row);
    let col = offset_index(addr.col, d_col);
    match (row, col) {
        (Some(row), Some(col)) => Ok(CellAddress::new(addr.sheet, row, col)),
        _ => Err(ReportError::precondition(format!(
            "moving {addr} by ({d_row}, {d_col}) leaves the worksheet"
        ))),
    }
}
