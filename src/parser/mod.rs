//! Main XLSX parser
//!
//! Reads a template package into the report model: one [`Grid`] per
//! worksheet plus the workbook's defined names.

mod relationships;
mod workbook;
mod worksheet;

use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use crate::error::{ReportError, Result};
use crate::types::{DefinedName, Grid, NameScope, SheetId};

use relationships::{parse_shared_strings, parse_workbook_relationships};
use workbook::{parse_workbook_xml, RawDefinedName};
use worksheet::parse_sheet;

/// Everything read from a template package.
#[derive(Debug, Clone, Default)]
pub struct ParsedWorkbook {
    pub sheets: Vec<Grid>,
    pub names: Vec<DefinedName>,
    /// Archive path of each sheet part, parallel to `sheets`.
    pub sheet_paths: Vec<String>,
}

/// Parse an xlsx package from bytes.
pub fn parse(data: &[u8]) -> Result<ParsedWorkbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels = parse_workbook_relationships(&mut archive)?;
    let meta = parse_workbook_xml(&mut archive, &rels.worksheets)?;
    if meta.sheets.is_empty() {
        return Err(ReportError::Parse("workbook has no sheets".into()));
    }
    let shared_strings = parse_shared_strings(&mut archive, rels.shared_strings.as_deref())?;

    let mut parsed = ParsedWorkbook::default();
    for info in meta.sheets {
        let xml = read_part(&mut archive, &info.path)?;
        let grid = parse_sheet(&info.name, &xml, &shared_strings)?;
        log::debug!(
            "parsed sheet '{}' from {}: {} rows, {} merges",
            grid.name,
            info.path,
            grid.row_count(),
            grid.merged_regions().len()
        );
        parsed.sheets.push(grid);
        parsed.sheet_paths.push(info.path);
    }

    let sheet_count = parsed.sheets.len();
    parsed.names = meta
        .defined_names
        .into_iter()
        .filter_map(|raw| scope_name(raw, sheet_count))
        .collect();

    Ok(parsed)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive.by_name(path)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Map `localSheetId` onto a sheet id. Names pointing at a sheet that does
/// not exist are dropped.
fn scope_name(raw: RawDefinedName, sheet_count: usize) -> Option<DefinedName> {
    let scope = match raw.local_sheet_id {
        None => NameScope::Workbook,
        Some(id) => {
            let idx = usize::try_from(id).ok().filter(|&idx| idx < sheet_count);
            let Some(idx) = idx else {
                log::warn!("defined name '{}' scoped to missing sheet {id}", raw.name);
                return None;
            };
            NameScope::Sheet(SheetId(idx))
        }
    };
    Some(DefinedName {
        name: raw.name,
        refers_to: raw.refers_to,
        scope,
        hidden: raw.hidden,
        comment: raw.comment,
    })
}
