//! XLSX export pipeline.
//!
//! A document loaded from a template is saved by patching the template
//! archive: only dirty sheets are re-serialized, everything else is passed
//! through byte-identical. A document built from scratch gets a fresh,
//! minimal package.

pub(crate) mod package;
pub(crate) mod sheet_writer;
pub(crate) mod zip_patcher;

use std::collections::HashSet;

use crate::error::Result;
use crate::types::{DefinedName, Grid};

/// Template bytes plus the archive path of each sheet part.
#[derive(Debug, Clone)]
pub(crate) struct Template {
    pub bytes: Vec<u8>,
    pub sheet_paths: Vec<String>,
}

/// Save sheets to xlsx bytes.
///
/// With a template, `dirty_sheets` names the sheets that need rewriting;
/// an empty set returns the template unchanged.
pub(crate) fn save_xlsx(
    template: Option<&Template>,
    sheets: &[Grid],
    names: &[DefinedName],
    dirty_sheets: &HashSet<usize>,
) -> Result<Vec<u8>> {
    match template {
        Some(template) if dirty_sheets.is_empty() => Ok(template.bytes.clone()),
        Some(template) => {
            zip_patcher::patch_zip(&template.bytes, sheets, &template.sheet_paths, dirty_sheets)
        }
        None => package::write_package(sheets, names),
    }
}
