//! Worksheet parsing - reads one sheet part into a [`Grid`].
//!
//! Only `sheetData`, `mergeCells`, `rowBreaks` and `colBreaks` are modelled.
//! Every other top-level element (`sheetViews`, `cols`, `pageSetup`,
//! `conditionalFormatting`, ...) is kept as a verbatim fragment and written
//! back unchanged on save, as is the root `<worksheet>` tag with its
//! namespace declarations.
//!
//! Shared formulas are expanded on load: each follower cell gets the
//! master's text moved by its offset, so every cell owns a plain formula.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::cell_ref::{parse_cell_ref_bytes, MAX_ROW};
use crate::error::{ReportError, Result};
use crate::formula::shift_references;
use crate::types::{Cell, CellValue, Grid, MergedRegion, Row, StyleId, XmlFragment};
use crate::xml_helpers::{attr_bool_default, attr_f64, attr_string, attr_u32};

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// Top-level elements the grid models; everything else passes through.
const MODELED: &[&[u8]] = &[
    b"dimension",
    b"sheetData",
    b"mergeCells",
    b"rowBreaks",
    b"colBreaks",
];

#[derive(Copy, Clone)]
enum BreakKind {
    Row,
    Col,
}

/// Shared-formula groups seen while reading a sheet, keyed by `si`.
#[derive(Debug, Default)]
struct SharedFormulas {
    /// si -> (row, col, text) of the cell carrying the formula text.
    masters: HashMap<u32, (u32, u32, String)>,
    /// (row, col, si) of cells that only reference a group.
    followers: Vec<(u32, u32, u32)>,
}

impl SharedFormulas {
    fn expand(self, grid: &mut Grid) {
        for (row, col, si) in self.followers {
            let Some((master_row, master_col, text)) = self.masters.get(&si) else {
                log::warn!("sheet '{}': shared formula {si} has no master", grid.name);
                continue;
            };
            let formula = shift_references(
                text,
                i64::from(row) - i64::from(*master_row),
                i64::from(col) - i64::from(*master_col),
            );
            if let Some(cell) = grid.row_mut(row).cells.get_mut(&col) {
                cell.formula = Some(formula);
            }
        }
    }
}

/// Text-bearing children of `<c>`.
#[derive(Copy, Clone, PartialEq, Eq)]
enum CellField {
    None,
    Value,
    Formula,
    InlineText,
}

/// Parse a single worksheet part.
pub(super) fn parse_sheet(name: &str, xml_text: &str, shared_strings: &[String]) -> Result<Grid> {
    let mut xml = Reader::from_str(xml_text);
    xml.trim_text(false);

    let mut grid = Grid::new(name);
    let mut depth: usize = 0;
    let mut capture: Option<(usize, String)> = None;
    let mut current_row: Option<u32> = None;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut breaks: Option<BreakKind> = None;
    let mut shared = SharedFormulas::default();

    loop {
        let pos = xml.buffer_position();
        match xml.read_event()? {
            Event::Start(ref e) => {
                let level = depth;
                let local = e.local_name();
                let local = local.as_ref();

                if capture.is_some() {
                    depth += 1;
                    continue;
                }
                if level == 0 {
                    let begin = element_start(xml_text, pos);
                    grid.root_tag = Some(raw_slice(xml_text, begin, xml.buffer_position())?);
                } else if level == 1 && !MODELED.contains(&local) {
                    capture = Some((element_start(xml_text, pos), local_name_string(local)));
                    depth += 1;
                    continue;
                }

                match local {
                    b"c" => {
                        if let Some(row) = current_row {
                            let col = read_cell(
                                &mut xml,
                                e,
                                row,
                                next_col,
                                shared_strings,
                                &mut shared,
                                &mut grid,
                            )?;
                            next_col = col.saturating_add(1);
                        } else {
                            log::warn!("sheet '{name}': cell outside a row ignored");
                            skip_element(&mut xml)?;
                        }
                        continue;
                    }
                    b"row" => {
                        let idx = read_row(e, next_row, &mut grid);
                        current_row = idx;
                        next_row = idx.map_or(next_row, |i| i.saturating_add(1));
                        next_col = 0;
                    }
                    b"rowBreaks" => breaks = Some(BreakKind::Row),
                    b"colBreaks" => breaks = Some(BreakKind::Col),
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if capture.is_some() {
                    continue;
                }
                let local = e.local_name();
                let local = local.as_ref();
                if depth == 1 && !MODELED.contains(&local) {
                    let begin = element_start(xml_text, pos);
                    grid.passthrough.push(XmlFragment {
                        name: local_name_string(local),
                        xml: raw_slice(xml_text, begin, xml.buffer_position())?,
                    });
                    continue;
                }

                match local {
                    b"row" => {
                        let idx = read_row(e, next_row, &mut grid);
                        next_row = idx.map_or(next_row, |i| i.saturating_add(1));
                    }
                    b"c" => {
                        if let Some(row) = current_row {
                            let (col, cell) = cell_header(e, next_col);
                            if let Some(col) = col {
                                grid.row_mut(row).cells.insert(col, cell);
                                next_col = col.saturating_add(1);
                            }
                        }
                    }
                    b"mergeCell" => {
                        let reference = attr_string(e, b"ref").unwrap_or_default();
                        match MergedRegion::parse(&reference) {
                            Some(region) => grid.merges.push(region),
                            None => log::warn!("sheet '{name}': bad merge range '{reference}'"),
                        }
                    }
                    b"brk" => {
                        let at = attr_u32(e, b"id").and_then(|id| id.checked_sub(1));
                        match (breaks, at) {
                            (Some(BreakKind::Row), Some(row)) => grid.set_row_break(row),
                            (Some(BreakKind::Col), Some(col)) => grid.set_col_break(col),
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                if let Some((begin, element)) = capture.take() {
                    if depth == 1 {
                        grid.passthrough.push(XmlFragment {
                            name: element,
                            xml: raw_slice(xml_text, begin, xml.buffer_position())?,
                        });
                    } else {
                        capture = Some((begin, element));
                    }
                    continue;
                }
                match e.local_name().as_ref() {
                    b"row" => current_row = None,
                    b"rowBreaks" | b"colBreaks" => breaks = None,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    shared.expand(&mut grid);
    Ok(grid)
}

/// Apply `<row>` attributes, creating the row. Returns its 0-based index.
fn read_row(e: &BytesStart, fallback: u32, grid: &mut Grid) -> Option<u32> {
    let idx = match attr_u32(e, b"r") {
        Some(r) => r.checked_sub(1)?,
        None => fallback,
    };
    if idx > MAX_ROW {
        log::warn!("sheet '{}': row {idx} beyond the last row ignored", grid.name);
        return None;
    }

    let custom_format = attr_bool_default(e, b"customFormat", false);
    let row: &mut Row = grid.row_mut(idx);
    row.height = attr_f64(e, b"ht");
    row.hidden = attr_bool_default(e, b"hidden", false);
    row.style = attr_u32(e, b"s")
        .filter(|_| custom_format)
        .map(StyleId);
    Some(idx)
}

/// Position and style of a `<c>` element. The column falls back to the one
/// after the previous cell when `r` is absent.
fn cell_header(e: &BytesStart, fallback_col: u32) -> (Option<u32>, Cell) {
    let mut col = Some(fallback_col);
    let mut style = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => col = parse_cell_ref_bytes(&attr.value).map(|(c, _)| c),
            b"s" => style = parse_u32_bytes(&attr.value).map(StyleId),
            _ => {}
        }
    }
    (
        col,
        Cell {
            style,
            ..Cell::default()
        },
    )
}

/// Read a non-empty `<c>` element up to and including its end tag and store
/// it in `grid`. Returns the cell's column.
fn read_cell(
    xml: &mut Reader<&[u8]>,
    e: &BytesStart,
    row: u32,
    fallback_col: u32,
    shared_strings: &[String],
    shared: &mut SharedFormulas,
    grid: &mut Grid,
) -> Result<u32> {
    let (col, mut cell) = cell_header(e, fallback_col);
    let tag = e
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"t")
        .map_or(CellTypeTag::Default, |a| parse_cell_type_tag(&a.value));

    let mut value = String::new();
    let mut formula: Option<String> = None;
    let mut shared_index: Option<u32> = None;
    let mut inline = String::new();
    let mut field = CellField::None;
    let mut phonetic = false;

    loop {
        match xml.read_event()? {
            Event::Start(ref inner) => match inner.local_name().as_ref() {
                b"v" => field = CellField::Value,
                b"f" => {
                    field = CellField::Formula;
                    shared_index = shared_formula_index(inner);
                    if formula.is_none() {
                        formula = Some(String::new());
                    }
                }
                b"rPh" => phonetic = true,
                b"t" if !phonetic => field = CellField::InlineText,
                _ => {}
            },
            Event::Empty(ref inner) if inner.local_name().as_ref() == b"f" => {
                shared_index = shared_formula_index(inner);
            }
            Event::Text(ref text) => {
                let text = text.unescape()?;
                match field {
                    CellField::Value => value.push_str(&text),
                    CellField::Formula => {
                        if let Some(f) = formula.as_mut() {
                            f.push_str(&text);
                        }
                    }
                    CellField::InlineText => inline.push_str(&text),
                    CellField::None => {}
                }
            }
            Event::CData(ref data) => {
                let text = String::from_utf8_lossy(data);
                match field {
                    CellField::Value => value.push_str(&text),
                    CellField::InlineText => inline.push_str(&text),
                    _ => {}
                }
            }
            Event::End(ref inner) => match inner.local_name().as_ref() {
                b"c" => break,
                b"rPh" => phonetic = false,
                _ => field = CellField::None,
            },
            Event::Eof => {
                return Err(ReportError::Parse(format!(
                    "sheet '{}': unterminated cell in row {}",
                    grid.name,
                    u64::from(row) + 1
                )));
            }
            _ => {}
        }
    }

    let Some(col) = col else {
        log::warn!("sheet '{}': cell with bad reference ignored", grid.name);
        return Ok(fallback_col);
    };

    cell.value = resolve_value(tag, &value, inline, shared_strings, &grid.name)?;
    cell.formula = formula.filter(|f| !f.is_empty());
    if let Some(si) = shared_index {
        match &cell.formula {
            Some(text) => {
                shared.masters.insert(si, (row, col, text.clone()));
            }
            None => shared.followers.push((row, col, si)),
        }
    }
    grid.row_mut(row).cells.insert(col, cell);
    Ok(col)
}

/// The `si` of an `<f t="shared">` element, `None` for any other formula.
fn shared_formula_index(e: &BytesStart) -> Option<u32> {
    let shared = attr_string(e, b"t").is_some_and(|t| t == "shared");
    if shared {
        attr_u32(e, b"si")
    } else {
        None
    }
}

fn resolve_value(
    tag: CellTypeTag,
    raw: &str,
    inline: String,
    shared_strings: &[String],
    sheet: &str,
) -> Result<CellValue> {
    let value = match tag {
        CellTypeTag::Shared => {
            let entry = parse_u32_bytes(raw.trim().as_bytes())
                .and_then(|idx| shared_strings.get(usize::try_from(idx).ok()?));
            match entry {
                Some(text) => CellValue::Text(text.clone()),
                None => {
                    return Err(ReportError::Parse(format!(
                        "sheet '{sheet}': shared string index '{raw}' out of range ({} entries)",
                        shared_strings.len()
                    )));
                }
            }
        }
        CellTypeTag::Inline => CellValue::Text(inline),
        CellTypeTag::Str => CellValue::Text(raw.to_string()),
        CellTypeTag::Bool => CellValue::Boolean(matches!(raw.trim(), "1" | "true")),
        CellTypeTag::Error => CellValue::Error(raw.to_string()),
        CellTypeTag::Default => {
            if raw.is_empty() {
                CellValue::Blank
            } else {
                raw.trim()
                    .parse::<f64>()
                    .map_or_else(|_| CellValue::Text(raw.to_string()), CellValue::Number)
            }
        }
    };
    Ok(value)
}

/// Consume events up to the end of the element whose start was just read.
fn skip_element(xml: &mut Reader<&[u8]>) -> Result<()> {
    let mut depth = 1usize;
    while depth > 0 {
        match xml.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Byte offset of the `<` opening the element read from `pos`.
fn element_start(xml_text: &str, pos: usize) -> usize {
    let from = pos.saturating_sub(1);
    xml_text
        .get(from..)
        .and_then(|rest| rest.find('<'))
        .map_or(from, |offset| from + offset)
}

fn raw_slice(xml_text: &str, begin: usize, end: usize) -> Result<String> {
    xml_text
        .get(begin..end)
        .map(str::to_string)
        .ok_or_else(|| ReportError::Parse(format!("bad element span {begin}..{end}")))
}

fn local_name_string(local: &[u8]) -> String {
    String::from_utf8_lossy(local).into_owned()
}
