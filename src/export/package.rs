//! Fresh xlsx package for documents created without a template.

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::types::{DefinedName, Grid, NameScope};
use crate::xml_helpers::xml_escape;

use super::sheet_writer::write_sheet_xml;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Archive path of the `n`-th (0-based) sheet in a fresh package.
pub(crate) fn sheet_path(index: usize) -> String {
    format!("xl/worksheets/sheet{}.xml", index + 1)
}

/// Write a complete package: content types, relationships, workbook with
/// defined names, a minimal stylesheet and every sheet.
pub(crate) fn write_package(sheets: &[Grid], names: &[DefinedName]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut part = |path: &str, xml: &str| -> Result<()> {
        writer.start_file(path, options)?;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    };

    part("[Content_Types].xml", &content_types_xml(sheets.len()))?;
    part("_rels/.rels", &root_rels_xml())?;
    part("xl/workbook.xml", &workbook_xml(sheets, names))?;
    part("xl/_rels/workbook.xml.rels", &workbook_rels_xml(sheets.len()))?;
    part("xl/styles.xml", &styles_xml(style_count(sheets)))?;
    for (idx, grid) in sheets.iter().enumerate() {
        part(&sheet_path(idx), &write_sheet_xml(grid))?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut out = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#
    );
    for idx in 0..sheet_count {
        let _ = write!(
            out,
            r#"<Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            sheet_path(idx)
        );
    }
    out.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#);
    out
}

fn root_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_xml(sheets: &[Grid], names: &[DefinedName]) -> String {
    let mut out = format!(r#"{XML_DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#);
    for (idx, grid) in sheets.iter().enumerate() {
        let _ = write!(
            out,
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(&grid.name),
            idx + 1,
            idx + 1
        );
    }
    out.push_str("</sheets>");

    if !names.is_empty() {
        out.push_str("<definedNames>");
        for name in names {
            let _ = write!(out, r#"<definedName name="{}""#, xml_escape(&name.name));
            if let NameScope::Sheet(sheet) = name.scope {
                let _ = write!(out, r#" localSheetId="{}""#, sheet.index());
            }
            if name.hidden {
                out.push_str(r#" hidden="1""#);
            }
            if let Some(comment) = &name.comment {
                let _ = write!(out, r#" comment="{}""#, xml_escape(comment));
            }
            let _ = write!(out, ">{}</definedName>", xml_escape(&name.refers_to));
        }
        out.push_str("</definedNames>");
    }

    out.push_str("</workbook>");
    out
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut out = format!(r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}">"#);
    for idx in 0..sheet_count {
        let _ = write!(
            out,
            r#"<Relationship Id="rId{}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            idx + 1,
            idx + 1
        );
    }
    let _ = write!(
        out,
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/></Relationships>"#,
        sheet_count + 1
    );
    out
}

/// Number of cell formats the stylesheet must define so every style handle
/// used in the sheets resolves.
fn style_count(sheets: &[Grid]) -> u32 {
    sheets
        .iter()
        .flat_map(|grid| grid.rows())
        .flat_map(|(_, row)| {
            row.style
                .into_iter()
                .chain(row.cells.values().filter_map(|cell| cell.style))
        })
        .map(|style| style.0.saturating_add(1))
        .max()
        .unwrap_or(1)
        .max(1)
}

/// A default font, the two mandatory fills, an empty border and `xf_count`
/// identical plain cell formats.
fn styles_xml(xf_count: u32) -> String {
    let mut out = format!(
        r#"{XML_DECL}<styleSheet xmlns="{MAIN_NS}"><fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="{xf_count}">"#
    );
    for _ in 0..xf_count {
        out.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    }
    out.push_str(r#"</cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#);
    out
}
