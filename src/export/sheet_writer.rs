//! Generates worksheet XML from a [`Grid`].
//!
//! Text cells are written as inline strings (`t="inlineStr"`), so the shared
//! string table never has to be rebuilt. Fragments the parser kept verbatim
//! are re-emitted in schema order around the regenerated `sheetData`,
//! `mergeCells` and break lists.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::cell_ref::{format_cell_ref, MAX_COL, MAX_ROW};
use crate::types::{Cell, CellValue, Grid, Row};
use crate::xml_helpers::xml_escape;

const DEFAULT_ROOT: &str = concat!(
    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
);

/// `CT_Worksheet` child order.
const ELEMENT_ORDER: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

fn rank(name: &str) -> Option<usize> {
    ELEMENT_ORDER.iter().position(|known| *known == name)
}

fn modeled_rank(name: &str) -> usize {
    rank(name).unwrap_or(ELEMENT_ORDER.len())
}

/// Write a complete worksheet XML string from a `Grid`.
pub(crate) fn write_sheet_xml(grid: &Grid) -> String {
    let mut parts: Vec<(usize, Cow<'_, str>)> = Vec::with_capacity(grid.passthrough.len() + 5);

    // Unknown elements (e.g. `mc:AlternateContent`) stay right after the
    // element they followed in the template.
    let mut last_rank = 0;
    for fragment in &grid.passthrough {
        let position = rank(&fragment.name).unwrap_or(last_rank);
        last_rank = position;
        parts.push((position, Cow::Borrowed(fragment.xml.as_str())));
    }

    parts.push((modeled_rank("dimension"), Cow::Owned(dimension_xml(grid))));
    parts.push((modeled_rank("sheetData"), Cow::Owned(sheet_data_xml(grid))));
    if !grid.merges.is_empty() {
        parts.push((modeled_rank("mergeCells"), Cow::Owned(merge_cells_xml(grid))));
    }
    if !grid.row_breaks.is_empty() {
        let xml = breaks_xml("rowBreaks", grid.row_breaks.iter().copied(), MAX_COL);
        parts.push((modeled_rank("rowBreaks"), Cow::Owned(xml)));
    }
    if !grid.col_breaks.is_empty() {
        let xml = breaks_xml("colBreaks", grid.col_breaks.iter().copied(), MAX_ROW);
        parts.push((modeled_rank("colBreaks"), Cow::Owned(xml)));
    }
    parts.sort_by_key(|(position, _)| *position);

    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(grid.root_tag.as_deref().unwrap_or(DEFAULT_ROOT));
    out.push('\n');
    for (_, xml) in parts {
        out.push_str(&xml);
        out.push('\n');
    }
    out.push_str("</worksheet>");
    out
}

fn dimension_xml(grid: &Grid) -> String {
    let used: Vec<(u32, u32, u32)> = grid
        .rows()
        .filter_map(|(idx, row)| {
            let first = row.cells.keys().next()?;
            let last = row.cells.keys().next_back()?;
            Some((idx, *first, *last))
        })
        .collect();
    let bounds = used.iter().fold(None, |acc, &(row, first, last)| match acc {
        None => Some((row, first, row, last)),
        Some((top, left, _, right)) => Some((top, left.min(first), row, right.max(last))),
    });
    match bounds {
        Some((top, left, bottom, right)) if (top, left) != (bottom, right) => format!(
            r#"<dimension ref="{}:{}"/>"#,
            format_cell_ref(top, left),
            format_cell_ref(bottom, right)
        ),
        Some((top, left, _, _)) => format!(r#"<dimension ref="{}"/>"#, format_cell_ref(top, left)),
        None => r#"<dimension ref="A1"/>"#.to_string(),
    }
}

fn sheet_data_xml(grid: &Grid) -> String {
    if grid.row_count() == 0 {
        return "<sheetData/>".to_string();
    }
    let mut out = String::with_capacity(grid.row_count() * 64);
    out.push_str("<sheetData>");
    for (idx, row) in grid.rows() {
        write_row(&mut out, idx, row);
    }
    out.push_str("</sheetData>");
    out
}

fn write_row(out: &mut String, idx: u32, row: &Row) {
    let _ = write!(out, r#"<row r="{}""#, u64::from(idx) + 1);
    if let Some(style) = row.style {
        let _ = write!(out, r#" s="{}" customFormat="1""#, style.0);
    }
    if let Some(height) = row.height {
        let _ = write!(out, r#" ht="{height}" customHeight="1""#);
    }
    if row.hidden {
        out.push_str(r#" hidden="1""#);
    }
    if row.cells.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for (&col, cell) in &row.cells {
        write_cell(out, idx, col, cell);
    }
    out.push_str("</row>");
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, row: u32, col: u32, cell: &Cell) {
    let _ = write!(out, r#"<c r="{}""#, format_cell_ref(row, col));
    if let Some(style) = cell.style {
        let _ = write!(out, r#" s="{}""#, style.0);
    }

    let formula = cell
        .formula
        .as_deref()
        .map(|f| format!("<f>{}</f>", xml_escape(f)))
        .unwrap_or_default();

    match &cell.value {
        CellValue::Blank if formula.is_empty() => out.push_str("/>"),
        CellValue::Blank => {
            let _ = write!(out, ">{formula}</c>");
        }
        CellValue::Text(text) if formula.is_empty() => {
            let _ = write!(
                out,
                r#" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                xml_escape(text)
            );
        }
        CellValue::Text(text) => {
            let _ = write!(out, r#" t="str">{formula}<v>{}</v></c>"#, xml_escape(text));
        }
        CellValue::Number(n) if n.is_finite() => {
            let _ = write!(out, ">{formula}<v>{n}</v></c>");
        }
        CellValue::Number(_) => {
            let _ = write!(out, r#" t="e">{formula}<v>#NUM!</v></c>"#);
        }
        CellValue::Boolean(flag) => {
            let _ = write!(out, r#" t="b">{formula}<v>{}</v></c>"#, u8::from(*flag));
        }
        CellValue::Error(code) => {
            let _ = write!(out, r#" t="e">{formula}<v>{}</v></c>"#, xml_escape(code));
        }
    }
}

fn merge_cells_xml(grid: &Grid) -> String {
    let mut out = format!(r#"<mergeCells count="{}">"#, grid.merges.len());
    for region in &grid.merges {
        let _ = write!(out, r#"<mergeCell ref="{}"/>"#, region.to_ref());
    }
    out.push_str("</mergeCells>");
    out
}

/// A break after index `n` is stored as `id = n + 1`; `max` is the last
/// index on the other axis.
fn breaks_xml(element: &str, breaks: impl ExactSizeIterator<Item = u32>, max: u32) -> String {
    let count = breaks.len();
    let mut out = format!(r#"<{element} count="{count}" manualBreakCount="{count}">"#);
    for at in breaks {
        let _ = write!(
            out,
            r#"<brk id="{}" max="{max}" man="1"/>"#,
            u64::from(at) + 1
        );
    }
    let _ = write!(out, "</{element}>");
    out
}
