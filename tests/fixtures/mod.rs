//! Test fixtures for generating report templates in memory.
//!
//! [`TemplateBuilder`] writes a small but well-formed XLSX package: shared
//! strings, styled cells, formulas, merged regions, row attributes, manual
//! page breaks, defined names and optional extra worksheet XML.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, TemplateBuilder};
//!
//! let xlsx = TemplateBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Report")
//!             .cell("A1", "Invoice", Some(1))
//!             .merge("A1:D1"),
//!     )
//!     .defined_name("Title", "Report!$A$1", None)
//!     .build();
//!
//! let doc = xlreport::Document::from_bytes(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

// ============================================================================
// Cell Value
// ============================================================================

/// A cell value as it is written into the sheet XML.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Shared string.
    String(String),
    Number(f64),
    Boolean(bool),
    /// Error literal, e.g. `#DIV/0!`.
    Error(String),
    InlineString(String),
    /// Formula with an optional cached value.
    Formula(String, Option<f64>),
    /// `<f t="shared">`: the master carries the range and text, a follower
    /// carries neither.
    SharedFormula {
        si: u32,
        master: Option<(String, String)>,
        cached: f64,
    },
    /// Style only.
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<u32>,
}

/// Row attributes, keyed by 1-based row number.
#[derive(Debug, Clone, Default)]
pub struct RowAttrs {
    pub height: Option<f64>,
    pub hidden: bool,
    pub style: Option<u32>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub rows: BTreeMap<u32, RowAttrs>,
    /// 1-based `brk id` values.
    pub row_breaks: Vec<u32>,
    pub col_breaks: Vec<u32>,
    /// Raw XML placed before `<sheetData>`.
    pub head_xml: String,
    /// Raw XML placed after `<mergeCells>` and before the breaks.
    pub tail_xml: String,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style index.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V, style: Option<u32>) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    #[must_use]
    pub fn formula(mut self, cell_ref: &str, formula: &str, cached: Option<f64>) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Formula(formula.to_string(), cached),
            style: None,
        });
        self
    }

    /// Master cell of a shared formula group covering `range`.
    #[must_use]
    pub fn shared_formula(mut self, cell_ref: &str, si: u32, range: &str, formula: &str, cached: f64) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::SharedFormula {
                si,
                master: Some((range.to_string(), formula.to_string())),
                cached,
            },
            style: None,
        });
        self
    }

    /// Follower cell of shared formula group `si`.
    #[must_use]
    pub fn shared_follower(mut self, cell_ref: &str, si: u32, cached: f64) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::SharedFormula {
                si,
                master: None,
                cached,
            },
            style: None,
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Set a custom height on a 1-based row.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.rows.entry(row).or_default().height = Some(height);
        self
    }

    #[must_use]
    pub fn hide_row(mut self, row: u32) -> Self {
        self.rows.entry(row).or_default().hidden = true;
        self
    }

    #[must_use]
    pub fn row_style(mut self, row: u32, style: u32) -> Self {
        self.rows.entry(row).or_default().style = Some(style);
        self
    }

    /// Manual break after the 1-based row `row`.
    #[must_use]
    pub fn row_break(mut self, row: u32) -> Self {
        self.row_breaks.push(row);
        self
    }

    /// Manual break after the 1-based column `col`.
    #[must_use]
    pub fn col_break(mut self, col: u32) -> Self {
        self.col_breaks.push(col);
        self
    }

    #[must_use]
    pub fn head_xml(mut self, xml: &str) -> Self {
        self.head_xml.push_str(xml);
        self
    }

    #[must_use]
    pub fn tail_xml(mut self, xml: &str) -> Self {
        self.tail_xml.push_str(xml);
        self
    }
}

// ============================================================================
// Template Builder
// ============================================================================

#[derive(Debug, Clone)]
struct NameEntry {
    name: String,
    refers_to: String,
    local_sheet: Option<u32>,
}

/// Builder for complete XLSX templates.
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    sheets: Vec<SheetBuilder>,
    names: Vec<NameEntry>,
    calc_chain: bool,
    style_count: u32,
    replaced_parts: BTreeMap<String, String>,
}

impl TemplateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            style_count: 4,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add a defined name; `local_sheet` is the 0-based `localSheetId`.
    #[must_use]
    pub fn defined_name(mut self, name: &str, refers_to: &str, local_sheet: Option<u32>) -> Self {
        self.names.push(NameEntry {
            name: name.to_string(),
            refers_to: refers_to.to_string(),
            local_sheet,
        });
        self
    }

    /// Include `xl/calcChain.xml` with its content type and relationship.
    #[must_use]
    pub fn with_calc_chain(mut self) -> Self {
        self.calc_chain = true;
        self
    }

    /// Write `xml` instead of the generated content of part `path`.
    #[must_use]
    pub fn replace_part(mut self, path: &str, xml: &str) -> Self {
        self.replaced_parts.insert(path.to_string(), xml.to_string());
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let replaced = &self.replaced_parts;
        let mut part = |path: &str, xml: String| {
            let xml = replaced.get(path).cloned().unwrap_or(xml);
            zip.start_file(path, options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        };

        part(
            "[Content_Types].xml",
            generate_content_types(self.sheets.len(), self.calc_chain),
        );
        part("_rels/.rels", generate_rels());
        part(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len(), self.calc_chain),
        );
        part("xl/workbook.xml", generate_workbook(&self.sheets, &self.names));
        part("xl/styles.xml", generate_styles(self.style_count));
        part("xl/sharedStrings.xml", generate_shared_strings(&shared_strings));
        if self.calc_chain {
            part(
                "xl/calcChain.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><calcChain xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><c r="A1" i="1"/></calcChain>"#.to_string(),
            );
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            part(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Archive inspection
// ============================================================================

/// Read one archive entry as text.
pub fn read_part(xlsx: &[u8], path: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut file = archive.by_name(path).ok()?;
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    Some(out)
}

/// Names of every archive entry, in archive order.
pub fn part_names(xlsx: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index_raw(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// XML generation
// ============================================================================

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn generate_content_types(sheet_count: usize, calc_chain: bool) -> String {
    let mut out = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#
    );
    for i in 1..=sheet_count {
        let _ = write!(
            out,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    out.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    if calc_chain {
        out.push_str(r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#);
    }
    out.push_str("</Types>");
    out
}

fn generate_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn generate_workbook_rels(sheet_count: usize, calc_chain: bool) -> String {
    let mut out = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    for i in 1..=sheet_count {
        let _ = write!(
            out,
            r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let next = sheet_count + 1;
    let _ = write!(
        out,
        r#"<Relationship Id="rId{next}" Type="{REL_NS}/styles" Target="styles.xml"/><Relationship Id="rId{}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#,
        next + 1
    );
    if calc_chain {
        let _ = write!(
            out,
            r#"<Relationship Id="rId{}" Type="{REL_NS}/calcChain" Target="calcChain.xml"/>"#,
            next + 2
        );
    }
    out.push_str("</Relationships>");
    out
}

fn generate_workbook(sheets: &[SheetBuilder], names: &[NameEntry]) -> String {
    let mut out = format!(r#"{XML_DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#);
    for (i, sheet) in sheets.iter().enumerate() {
        let _ = write!(
            out,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(&sheet.name),
            i + 1,
            i + 1
        );
    }
    out.push_str("</sheets>");
    if !names.is_empty() {
        out.push_str("<definedNames>");
        for name in names {
            let _ = write!(out, r#"<definedName name="{}""#, escape(&name.name));
            if let Some(local) = name.local_sheet {
                let _ = write!(out, r#" localSheetId="{local}""#);
            }
            let _ = write!(out, ">{}</definedName>", escape(&name.refers_to));
        }
        out.push_str("</definedNames>");
    }
    out.push_str("</workbook>");
    out
}

fn generate_styles(xf_count: u32) -> String {
    let mut out = format!(
        r#"{XML_DECL}<styleSheet xmlns="{MAIN_NS}"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="{xf_count}">"#
    );
    for i in 0..xf_count {
        let _ = write!(
            out,
            r#"<xf numFmtId="0" fontId="{}" fillId="0" borderId="0" xfId="0"/>"#,
            i % 2
        );
    }
    out.push_str("</cellXfs></styleSheet>");
    out
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut out = format!(
        r#"{XML_DECL}<sst xmlns="{MAIN_NS}" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    );
    for s in strings {
        let _ = write!(out, "<si><t>{}</t></si>", escape(s));
    }
    out.push_str("</sst>");
    out
}

/// Split "B12" into (column letters, 1-based row).
fn split_ref(cell_ref: &str) -> (&str, u32) {
    let idx = cell_ref
        .find(|c: char| c.is_ascii_digit())
        .expect("cell reference without row");
    (&cell_ref[..idx], cell_ref[idx..].parse().unwrap())
}

fn col_index(letters: &str) -> u32 {
    letters
        .bytes()
        .fold(0, |acc, b| acc * 26 + u32::from(b - b'A' + 1))
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut rows: BTreeMap<u32, Vec<&CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        rows.entry(split_ref(&cell.cell_ref).1).or_default().push(cell);
    }
    for row in sheet.rows.keys() {
        rows.entry(*row).or_default();
    }

    let mut out = format!(r#"{XML_DECL}<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#);
    out.push_str(&sheet.head_xml);
    out.push_str("<sheetData>");
    for (row_num, cells) in &mut rows {
        cells.sort_by_key(|c| col_index(split_ref(&c.cell_ref).0));
        let _ = write!(out, r#"<row r="{row_num}""#);
        if let Some(attrs) = sheet.rows.get(row_num) {
            if let Some(style) = attrs.style {
                let _ = write!(out, r#" s="{style}" customFormat="1""#);
            }
            if let Some(height) = attrs.height {
                let _ = write!(out, r#" ht="{height}" customHeight="1""#);
            }
            if attrs.hidden {
                out.push_str(r#" hidden="1""#);
            }
        }
        out.push('>');
        for cell in cells.iter() {
            write_cell(&mut out, cell, shared_strings);
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        let _ = write!(out, r#"<mergeCells count="{}">"#, sheet.merges.len());
        for merge in &sheet.merges {
            let _ = write!(out, r#"<mergeCell ref="{merge}"/>"#);
        }
        out.push_str("</mergeCells>");
    }
    out.push_str(&sheet.tail_xml);
    write_breaks(&mut out, "rowBreaks", &sheet.row_breaks, 16383);
    write_breaks(&mut out, "colBreaks", &sheet.col_breaks, 1_048_575);
    out.push_str("</worksheet>");
    out
}

fn write_cell(out: &mut String, cell: &CellEntry, shared_strings: &[String]) {
    let _ = write!(out, r#"<c r="{}""#, cell.cell_ref);
    if let Some(style) = cell.style {
        let _ = write!(out, r#" s="{style}""#);
    }
    match &cell.value {
        CellValue::String(s) => {
            let idx = shared_strings.iter().position(|x| x == s).unwrap();
            let _ = write!(out, r#" t="s"><v>{idx}</v></c>"#);
        }
        CellValue::Number(n) => {
            let _ = write!(out, "><v>{n}</v></c>");
        }
        CellValue::Boolean(b) => {
            let _ = write!(out, r#" t="b"><v>{}</v></c>"#, u8::from(*b));
        }
        CellValue::Error(e) => {
            let _ = write!(out, r#" t="e"><v>{}</v></c>"#, escape(e));
        }
        CellValue::InlineString(s) => {
            let _ = write!(out, r#" t="inlineStr"><is><t>{}</t></is></c>"#, escape(s));
        }
        CellValue::Formula(f, cached) => {
            let _ = write!(out, "><f>{}</f>", escape(f));
            if let Some(v) = cached {
                let _ = write!(out, "<v>{v}</v>");
            }
            out.push_str("</c>");
        }
        CellValue::SharedFormula { si, master, cached } => {
            match master {
                Some((range, text)) => {
                    let _ = write!(
                        out,
                        r#"><f t="shared" ref="{range}" si="{si}">{}</f>"#,
                        escape(text)
                    );
                }
                None => {
                    let _ = write!(out, r#"><f t="shared" si="{si}"/>"#);
                }
            }
            let _ = write!(out, "<v>{cached}</v></c>");
        }
        CellValue::Empty => out.push_str("/>"),
    }
}

fn write_breaks(out: &mut String, tag: &str, ids: &[u32], max: u32) {
    if ids.is_empty() {
        return;
    }
    let _ = write!(
        out,
        r#"<{tag} count="{}" manualBreakCount="{}">"#,
        ids.len(),
        ids.len()
    );
    for id in ids {
        let _ = write!(out, r#"<brk id="{id}" max="{max}" man="1"/>"#);
    }
    let _ = write!(out, "</{tag}>");
}
