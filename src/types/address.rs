use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cell_ref::col_to_letter;

/// Index of a worksheet inside its [`Document`](crate::Document).
///
/// Sheets are never removed from a document, so an id stays valid for the
/// whole lifetime of the document that produced it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub usize);

impl SheetId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// A cell position on a specific sheet.
///
/// The `$` flags only carry meaning while a defined name is being resolved;
/// addresses handed out by the resolver are always absolute on both axes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct CellAddress {
    pub sheet: SheetId,
    pub row: u32,
    pub col: u32,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellAddress {
    /// An absolute address on `sheet`.
    #[must_use]
    pub fn new(sheet: SheetId, row: u32, col: u32) -> Self {
        Self {
            sheet,
            row,
            col,
            row_absolute: true,
            col_absolute: true,
        }
    }

    /// Same position on the same sheet, with both axes marked absolute.
    #[must_use]
    pub fn to_absolute(self) -> Self {
        Self::new(self.sheet, self.row, self.col)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col_marker = if self.col_absolute { "$" } else { "" };
        let row_marker = if self.row_absolute { "$" } else { "" };
        write!(
            f,
            "{}!{}{}{}{}",
            self.sheet,
            col_marker,
            col_to_letter(self.col),
            row_marker,
            u64::from(self.row) + 1
        )
    }
}
