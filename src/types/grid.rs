use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Cell, MergedRegion, StyleId};
use crate::error::{ReportError, Result};

/// A physical row. Absent rows are simply missing from [`Grid::rows`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Sparse cells keyed by 0-based column.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub cells: BTreeMap<u32, Cell>,
    /// Custom height in points (`None` = sheet default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Zero-height (hidden) flag.
    #[serde(skip_serializing_if = "super::workbook::is_false", default)]
    pub hidden: bool,
    /// Row-level default style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleId>,
}

impl Row {
    #[must_use]
    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.height.is_none() && !self.hidden && self.style.is_none()
    }
}

/// A raw top-level worksheet element the engine does not model
/// (`sheetViews`, `pageSetup`, `conditionalFormatting`, ...), kept verbatim
/// so a saved template loses as little as possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlFragment {
    pub(crate) name: String,
    pub(crate) xml: String,
}

/// The mutable store behind one worksheet: rows, cells, merged regions and
/// manual page breaks.
///
/// Page breaks follow the xlsx convention: a row break at `n` forces a new
/// page immediately after row `n` (likewise for columns).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub name: String,
    pub(crate) rows: BTreeMap<u32, Row>,
    pub(crate) merges: Vec<MergedRegion>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub(crate) row_breaks: BTreeSet<u32>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    pub(crate) col_breaks: BTreeSet<u32>,
    /// Opening `<worksheet ...>` tag of the template part, namespaces included.
    #[serde(skip)]
    pub(crate) root_tag: Option<String>,
    #[serde(skip)]
    pub(crate) passthrough: Vec<XmlFragment>,
}

impl Grid {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn row(&self, idx: u32) -> Option<&Row> {
        self.rows.get(&idx)
    }

    /// Mutable access to a row, creating it if absent.
    pub fn row_mut(&mut self, idx: u32) -> &mut Row {
        self.rows.entry(idx).or_default()
    }

    /// Iterate over existing rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(&idx, row)| (idx, row))
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row)?.cells.get(&col)
    }

    /// Index of the last row that exists, `None` for an empty sheet.
    #[must_use]
    pub fn last_row_num(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Number of physical rows (absent rows are not counted).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merges
    }

    /// Add a merged region. Regions must not overlap one another.
    pub fn add_merged_region(&mut self, region: MergedRegion) -> Result<()> {
        if region.first_row > region.last_row || region.first_col > region.last_col {
            return Err(ReportError::precondition(format!(
                "merged region {} has inverted bounds",
                region.to_ref()
            )));
        }
        if let Some(existing) = self.merges.iter().find(|m| m.overlaps(&region)) {
            return Err(ReportError::precondition(format!(
                "merged region {} overlaps existing region {}",
                region.to_ref(),
                existing.to_ref()
            )));
        }
        self.merges.push(region);
        Ok(())
    }

    /// Remove every merged region matching `pred`, returning how many were removed.
    pub fn remove_merged_regions<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&MergedRegion) -> bool,
    {
        let before = self.merges.len();
        self.merges.retain(|m| !pred(m));
        before - self.merges.len()
    }

    pub fn row_breaks(&self) -> impl Iterator<Item = u32> + '_ {
        self.row_breaks.iter().copied()
    }

    pub fn col_breaks(&self) -> impl Iterator<Item = u32> + '_ {
        self.col_breaks.iter().copied()
    }

    #[must_use]
    pub fn has_row_break(&self, row: u32) -> bool {
        self.row_breaks.contains(&row)
    }

    #[must_use]
    pub fn has_col_break(&self, col: u32) -> bool {
        self.col_breaks.contains(&col)
    }

    /// Force a page break immediately after `row`.
    pub fn set_row_break(&mut self, row: u32) {
        self.row_breaks.insert(row);
    }

    pub fn remove_row_break(&mut self, row: u32) {
        self.row_breaks.remove(&row);
    }

    /// Force a page break immediately after `col`.
    pub fn set_col_break(&mut self, col: u32) {
        self.col_breaks.insert(col);
    }

    pub fn remove_col_break(&mut self, col: u32) {
        self.col_breaks.remove(&col);
    }

    /// Largest column index holding a cell, if any.
    #[must_use]
    pub fn max_col(&self) -> Option<u32> {
        self.rows
            .values()
            .filter_map(|row| row.cells.keys().next_back().copied())
            .max()
    }
}
