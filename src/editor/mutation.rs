//! Cell-level writes.
//!
//! [`CellMut`] is a short-lived handle onto one cell position of a grid.
//! The row and the cell are created on first write, so a handle to an
//! empty position costs nothing until it is used.

use crate::types::{Cell, CellValue, Grid, StyleId};

/// Write handle for a single cell. Setters consume and return the handle
/// so calls chain:
///
/// ```ignore
/// doc.cell(addr)?.value("Total").style(StyleId(4)).row_break(true);
/// ```
#[derive(Debug)]
pub struct CellMut<'a> {
    grid: &'a mut Grid,
    row: u32,
    col: u32,
}

impl<'a> CellMut<'a> {
    pub(crate) fn new(grid: &'a mut Grid, row: u32, col: u32) -> Self {
        Self { grid, row, col }
    }

    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Current content, if the cell exists.
    #[must_use]
    pub fn get(&self) -> Option<&Cell> {
        self.grid.cell(self.row, self.col)
    }

    /// Store text. Any formula on the cell is dropped.
    pub fn value(mut self, text: &str) -> Self {
        self.set(CellValue::Text(text.to_string()));
        self
    }

    pub fn number(mut self, number: f64) -> Self {
        self.set(CellValue::Number(number));
        self
    }

    pub fn boolean(mut self, flag: bool) -> Self {
        self.set(CellValue::Boolean(flag));
        self
    }

    /// Store user-typed input, picking the value type from its content:
    /// an empty string clears the value, `true`/`false` (any case) become
    /// booleans, anything that parses as a number becomes a number and the
    /// rest is stored as text.
    pub fn input(mut self, raw: &str) -> Self {
        self.set(detect_value(raw.trim()));
        self
    }

    /// Blank the value and formula, keeping the style.
    pub fn clear_value(mut self) -> Self {
        self.set(CellValue::Blank);
        self
    }

    pub fn style(mut self, style: StyleId) -> Self {
        self.cell_entry().style = Some(style);
        self
    }

    /// Add or remove a page break directly after this cell's row.
    pub fn row_break(mut self, on: bool) -> Self {
        if on {
            self.grid.set_row_break(self.row);
        } else {
            self.grid.remove_row_break(self.row);
        }
        self
    }

    /// Add or remove a page break directly after this cell's column.
    pub fn col_break(mut self, on: bool) -> Self {
        if on {
            self.grid.set_col_break(self.col);
        } else {
            self.grid.remove_col_break(self.col);
        }
        self
    }

    fn set(&mut self, value: CellValue) {
        let cell = self.cell_entry();
        cell.value = value;
        cell.formula = None;
    }

    fn cell_entry(&mut self) -> &mut Cell {
        self.grid
            .row_mut(self.row)
            .cells
            .entry(self.col)
            .or_default()
    }
}

impl Grid {
    /// Write handle for the cell at `(row, col)`.
    pub fn cell_mut(&mut self, row: u32, col: u32) -> CellMut<'_> {
        CellMut::new(self, row, col)
    }
}

fn detect_value(value: &str) -> CellValue {
    if value.is_empty() {
        return CellValue::Blank;
    }
    if value.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(value.to_string()),
    }
}
