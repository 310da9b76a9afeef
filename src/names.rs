//! Defined-name resolution.
//!
//! A report template marks its anchors with defined names: a single cell
//! (`Total` -> `Summary!$B$10`) or an area (`Detail` -> `Data!$A$5:$H$7`).
//! [`NameResolver`] turns such a name into a [`CellAddress`] or a
//! [`Selection`] on a concrete sheet.
//!
//! Relative parts of a reference carry no anchor outside a formula, so an
//! axis without `$` resolves to index 0 (`Sheet1!B3` is row 0, column 0;
//! `Sheet1!$B3` is row 0, column 1). Everything handed out is absolute.
//! Whole-row areas (`Data!$5:$7`) have no column part and so land on
//! column 0.

use crate::cell_ref::{parse_a1, parse_a1_row, split_sheet_ref, A1Ref};
use crate::error::{ReportError, Result};
use crate::types::{CellAddress, DefinedName, Grid, NameScope, Selection, SheetId};

/// What a defined name points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTarget {
    Cell(CellAddress),
    Area(Selection),
}

impl NameTarget {
    #[must_use]
    pub fn sheet(&self) -> SheetId {
        match self {
            Self::Cell(addr) => addr.sheet,
            Self::Area(sel) => sel.sheet(),
        }
    }

    /// The cell itself, or the top-left corner of an area.
    #[must_use]
    pub fn anchor(&self) -> CellAddress {
        match self {
            Self::Cell(addr) => *addr,
            Self::Area(sel) => sel.top_left(),
        }
    }

    /// The area, or a one-cell selection for a single-cell name.
    pub fn to_selection(&self) -> Result<Selection> {
        match self {
            Self::Cell(addr) => Selection::new(*addr, *addr),
            Self::Area(sel) => Ok(*sel),
        }
    }
}

/// Looks names up against a document's sheets.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    names: &'a [DefinedName],
    sheets: &'a [Grid],
}

impl<'a> NameResolver<'a> {
    #[must_use]
    pub fn new(names: &'a [DefinedName], sheets: &'a [Grid]) -> Self {
        Self { names, sheets }
    }

    /// Sheet lookup by name, ignoring ASCII case as Excel does.
    #[must_use]
    pub fn sheet_by_name(&self, name: &str) -> Option<SheetId> {
        self.sheets
            .iter()
            .position(|grid| grid.name.eq_ignore_ascii_case(name))
            .map(SheetId)
    }

    /// Find a name visible from `context`.
    ///
    /// With a context sheet, a name local to that sheet wins over a
    /// workbook-level one. Without a context, workbook-level names win and
    /// any sheet-local name is the fallback.
    #[must_use]
    pub fn find(&self, name: &str, context: Option<SheetId>) -> Option<&'a DefinedName> {
        let global = || {
            self.names
                .iter()
                .find(|n| n.scope == NameScope::Workbook && n.matches(name))
        };
        match context {
            Some(sheet) => self
                .names
                .iter()
                .find(|n| n.scope == NameScope::Sheet(sheet) && n.matches(name))
                .or_else(global),
            None => global().or_else(|| self.names.iter().find(|n| n.matches(name))),
        }
    }

    pub fn resolve(&self, name: &str, context: Option<SheetId>) -> Result<NameTarget> {
        let defined = self
            .find(name, context)
            .ok_or_else(|| ReportError::not_found(format!("defined name '{name}'")))?;
        let formula = defined.refers_to.as_str();
        let bad_reference =
            || ReportError::CellRef(format!("name '{name}' refers to '{formula}'"));
        if formula.contains("#REF!") {
            return Err(bad_reference());
        }

        let (qualifier, reference) = split_sheet_ref(formula);
        let sheet = match (qualifier, defined.scope) {
            (Some(sheet_name), _) => self.sheet_by_name(&sheet_name).ok_or_else(|| {
                ReportError::not_found(format!("sheet '{sheet_name}' used by name '{name}'"))
            })?,
            (None, NameScope::Sheet(sheet)) => sheet,
            (None, NameScope::Workbook) => context.ok_or_else(bad_reference)?,
        };

        let (first, second) = match reference.split_once(':') {
            Some((first, second)) => (first, Some(second)),
            None => (reference, None),
        };
        match second {
            None => {
                let first = parse_a1(first).ok_or_else(bad_reference)?;
                Ok(NameTarget::Cell(anchor(sheet, first)))
            }
            Some(second) => {
                let corners = match (parse_a1(first), parse_a1(second)) {
                    (Some(first), Some(second)) => Some((first, second)),
                    (None, None) => parse_a1_row(first).zip(parse_a1_row(second)),
                    _ => None,
                };
                let (first, second) = corners.ok_or_else(bad_reference)?;
                Selection::new(anchor(sheet, first), anchor(sheet, second)).map(NameTarget::Area)
            }
        }
    }

    /// Resolve to one cell; an area name yields its top-left corner.
    pub fn resolve_cell(&self, name: &str, context: Option<SheetId>) -> Result<CellAddress> {
        self.resolve(name, context).map(|target| target.anchor())
    }

    /// Resolve to an area; a single-cell name yields a one-cell selection.
    pub fn resolve_area(&self, name: &str, context: Option<SheetId>) -> Result<Selection> {
        self.resolve(name, context)?.to_selection()
    }
}

fn anchor(sheet: SheetId, reference: A1Ref) -> CellAddress {
    let row = if reference.row_absolute { reference.row } else { 0 };
    let col = if reference.col_absolute { reference.col } else { 0 };
    CellAddress::new(sheet, row, col)
}
