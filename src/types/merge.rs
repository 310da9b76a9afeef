use serde::{Deserialize, Serialize};

use crate::cell_ref::{format_cell_ref, parse_cell_ref};

/// A rectangular block of cells rendered as one. Bounds are inclusive.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct MergedRegion {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl MergedRegion {
    #[must_use]
    pub fn new(first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    /// Parse a merge range like "A1:B2"
    pub fn parse(ref_str: &str) -> Option<Self> {
        let (start_part, end_part) = ref_str.split_once(':')?;
        let (first_col, first_row) = parse_cell_ref(start_part)?;
        let (last_col, last_row) = parse_cell_ref(end_part)?;
        if first_row > last_row || first_col > last_col {
            return None;
        }
        Some(Self::new(first_row, last_row, first_col, last_col))
    }

    /// Whether the whole row span of this region lies inside `[top, bottom]`.
    #[must_use]
    pub fn rows_within(&self, top: u32, bottom: u32) -> bool {
        top <= self.first_row && self.last_row <= bottom
    }

    #[must_use]
    pub fn overlaps(&self, other: &MergedRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    /// The same region moved by `delta` rows, or `None` if it would leave
    /// the addressable range.
    #[must_use]
    pub fn offset_rows(&self, delta: i64) -> Option<Self> {
        let first_row = offset_index(self.first_row, delta)?;
        let last_row = offset_index(self.last_row, delta)?;
        Some(Self {
            first_row,
            last_row,
            ..*self
        })
    }

    /// A1 form used in `<mergeCell ref="...">`.
    #[must_use]
    pub fn to_ref(&self) -> String {
        format!(
            "{}:{}",
            format_cell_ref(self.first_row, self.first_col),
            format_cell_ref(self.last_row, self.last_col)
        )
    }
}

pub(crate) fn offset_index(index: u32, delta: i64) -> Option<u32> {
    let moved = i64::from(index).checked_add(delta)?;
    u32::try_from(moved).ok()
}
