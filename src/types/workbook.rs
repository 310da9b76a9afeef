use serde::{Deserialize, Serialize};

use super::SheetId;

/// Helper function for serde skip_serializing_if
pub(crate) fn is_false(b: &bool) -> bool {
    !b
}

/// Where a defined name is visible.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NameScope {
    Workbook,
    /// Local to one sheet (`localSheetId` in the template).
    Sheet(SheetId),
}

/// A defined name (named range) in the workbook
///
/// Names are authored in the template and are read-only to the engine.
/// `refers_to` holds the raw reference formula, e.g. `Sheet1!$A$1` for a
/// single cell or `'Detail Rows'!$A$5:$H$7` for an area.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefinedName {
    pub name: String,
    pub refers_to: String,
    pub scope: NameScope,
    /// Whether this name is hidden from the Name Manager UI
    #[serde(skip_serializing_if = "is_false", default)]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DefinedName {
    #[must_use]
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        Self {
            name: name.into(),
            refers_to: refers_to.into(),
            scope,
            hidden: false,
            comment: None,
        }
    }

    /// Excel name lookup is case-insensitive.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Built-in names (`_xlnm.Print_Area`, ...) are never report anchors.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("_xlnm.")
    }
}
