use serde::{Deserialize, Serialize};

/// Opaque handle to a cell format defined by the template (`cellXfs` index).
///
/// The engine never interprets a style; it only carries the handle along when
/// rows move or are copied.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleId(pub u32);

/// The stored value of a cell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    /// No value (a style-only cell).
    #[default]
    Blank,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Text content if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A single cell's data and style
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(skip_serializing_if = "CellValue::is_blank", default)]
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleId>,
    /// Formula text, preserved verbatim for save (never evaluated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Cell {
    /// A copy carrying only the style handle.
    #[must_use]
    pub fn style_only(&self) -> Self {
        Self {
            value: CellValue::Blank,
            style: self.style,
            formula: None,
        }
    }
}
