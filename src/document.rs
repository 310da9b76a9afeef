//! The report document: sheets, defined names and the template they came
//! from.
//!
//! All addressing is by [`SheetId`] and indices. Every mutator names its
//! sheet explicitly; there is no "current sheet".

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::cell_ref::{MAX_COL, MAX_ROW};
use crate::editor::{self, CellMut, CopyPolicy};
use crate::error::{ReportError, Result};
use crate::export::{self, Template};
use crate::names::NameResolver;
use crate::parser;
use crate::types::{CellAddress, DefinedName, Grid, NameScope, Selection, SheetId};

/// An xlsx report being filled in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    sheets: Vec<Grid>,
    names: Vec<DefinedName>,
    #[serde(skip)]
    template: Option<Template>,
    #[serde(skip)]
    dirty: HashSet<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a single sheet named `Sheet1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sheets: vec![Grid::new("Sheet1")],
            names: Vec::new(),
            template: None,
            dirty: HashSet::new(),
        }
    }

    /// Build a document from already-populated sheets and names, for
    /// callers that produce the model themselves.
    pub fn from_parts(sheets: Vec<Grid>, names: Vec<DefinedName>) -> Result<Self> {
        if sheets.is_empty() {
            return Err(ReportError::precondition("a document needs at least one sheet"));
        }
        for (idx, grid) in sheets.iter().enumerate() {
            let duplicate = sheets
                .iter()
                .skip(idx + 1)
                .any(|other| other.name.eq_ignore_ascii_case(&grid.name));
            if duplicate {
                return Err(ReportError::precondition(format!(
                    "duplicate sheet name '{}'",
                    grid.name
                )));
            }
        }
        if let Some(name) = names.iter().find(|n| match n.scope {
            NameScope::Sheet(sheet) => sheet.index() >= sheets.len(),
            NameScope::Workbook => false,
        }) {
            return Err(ReportError::precondition(format!(
                "defined name '{}' is scoped to a missing sheet",
                name.name
            )));
        }
        Ok(Self {
            sheets,
            names,
            template: None,
            dirty: HashSet::new(),
        })
    }

    /// Load a template from xlsx bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let parsed = parser::parse(data)?;
        log::debug!(
            "loaded template: {} sheets, {} defined names",
            parsed.sheets.len(),
            parsed.names.len()
        );
        Ok(Self {
            sheets: parsed.sheets,
            names: parsed.names,
            template: Some(Template {
                bytes: data.to_vec(),
                sheet_paths: parsed.sheet_paths,
            }),
            dirty: HashSet::new(),
        })
    }

    /// Load a template from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening template {}", path.display());
        Self::from_bytes(&fs::read(path)?)
    }

    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Id of the `index`-th sheet.
    pub fn sheet_id(&self, index: usize) -> Result<SheetId> {
        if index < self.sheets.len() {
            Ok(SheetId(index))
        } else {
            Err(ReportError::not_found(format!(
                "sheet index {index} (document has {})",
                self.sheets.len()
            )))
        }
    }

    pub fn sheet_id_by_name(&self, name: &str) -> Result<SheetId> {
        self.resolver()
            .sheet_by_name(name)
            .ok_or_else(|| ReportError::not_found(format!("sheet '{name}'")))
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sheets.iter().map(|grid| grid.name.as_str())
    }

    pub fn grid(&self, sheet: SheetId) -> Result<&Grid> {
        self.sheets
            .get(sheet.index())
            .ok_or_else(|| ReportError::not_found(format!("{sheet}")))
    }

    /// Mutable access to a sheet. The sheet is marked for rewriting on save.
    pub fn grid_mut(&mut self, sheet: SheetId) -> Result<&mut Grid> {
        let grid = self
            .sheets
            .get_mut(sheet.index())
            .ok_or_else(|| ReportError::not_found(format!("{sheet}")))?;
        self.dirty.insert(sheet.index());
        Ok(grid)
    }

    /// Write handle for one cell.
    pub fn cell(&mut self, addr: CellAddress) -> Result<CellMut<'_>> {
        if addr.row > MAX_ROW || addr.col > MAX_COL {
            return Err(ReportError::precondition(format!(
                "{addr} is outside the worksheet"
            )));
        }
        let grid = self.grid_mut(addr.sheet)?;
        Ok(grid.cell_mut(addr.row, addr.col))
    }

    /// Write handle for the cell a defined name points at.
    pub fn cell_by_name(&mut self, name: &str) -> Result<CellMut<'_>> {
        let addr = self.resolver().resolve_cell(name, None)?;
        self.cell(addr)
    }

    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.resolver().find(name, None).is_some()
    }

    #[must_use]
    pub fn names(&self) -> &[DefinedName] {
        &self.names
    }

    #[must_use]
    pub fn resolver(&self) -> NameResolver<'_> {
        NameResolver::new(&self.names, &self.sheets)
    }

    /// Selection between two corners on `sheet`, given as `(row, col)`.
    pub fn selection(
        &self,
        sheet: SheetId,
        top_left: (u32, u32),
        bottom_right: (u32, u32),
    ) -> Result<Selection> {
        self.grid(sheet)?;
        Selection::from_bounds(sheet, top_left.0, top_left.1, bottom_right.0, bottom_right.1)
    }

    /// Selection covering the area a defined name points at.
    pub fn range(&self, name: &str) -> Result<Selection> {
        self.resolver().resolve_area(name, None)
    }

    pub fn clear_rows(&mut self, selection: &Selection) -> Result<()> {
        editor::clear_rows(self.grid_mut(selection.sheet())?, selection);
        Ok(())
    }

    pub fn hide_rows(&mut self, selection: &Selection, with_clear: bool) -> Result<()> {
        editor::hide_rows(self.grid_mut(selection.sheet())?, selection, with_clear);
        Ok(())
    }

    pub fn insert_rows(&mut self, selection: &Selection, count: u32) -> Result<()> {
        editor::insert_rows(self.grid_mut(selection.sheet())?, selection, count)
    }

    pub fn copy_rows(
        &mut self,
        selection: &Selection,
        count: u32,
        policy: CopyPolicy,
    ) -> Result<()> {
        editor::copy_rows(self.grid_mut(selection.sheet())?, selection, count, policy)
    }

    pub fn delete_rows(&mut self, selection: &Selection) -> Result<()> {
        editor::delete_rows(self.grid_mut(selection.sheet())?, selection)
    }

    /// Serialize to xlsx bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        export::save_xlsx(self.template.as_ref(), &self.sheets, &self.names, &self.dirty)
    }

    /// Write the document to `path`, creating missing parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        log::debug!("saved report to {}", path.display());
        Ok(())
    }

    /// JSON dump of the sheets and names.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
