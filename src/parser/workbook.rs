//! Workbook metadata: sheet list and defined names from xl/workbook.xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::Result;
use crate::xml_helpers::{attr_bool_default, attr_string, attr_string_local, attr_u32};

/// Sheet entry from `<sheets>`.
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// A `<definedName>` before its `localSheetId` is mapped onto a sheet.
#[derive(Debug, Clone, Default)]
pub(super) struct RawDefinedName {
    pub name: String,
    pub local_sheet_id: Option<u32>,
    pub hidden: bool,
    pub comment: Option<String>,
    pub refers_to: String,
}

#[derive(Debug, Default)]
pub(super) struct WorkbookMeta {
    pub sheets: Vec<SheetInfo>,
    pub defined_names: Vec<RawDefinedName>,
}

/// Parse workbook.xml for sheet info and defined names
///
/// Parses:
/// - `<sheets><sheet name="..." r:id="rId1"/></sheets>`
/// - `<definedNames><definedName name="DATA" localSheetId="0">Sheet1!$A$2:$F$2</definedName></definedNames>`
pub(super) fn parse_workbook_xml<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<WorkbookMeta> {
    let file = archive.by_name("xl/workbook.xml")?;

    let reader = BufReader::new(file);
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut meta = WorkbookMeta::default();
    let mut buf = Vec::new();
    let mut current_name: Option<RawDefinedName> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if e.local_name().as_ref() == b"definedName" {
                    current_name = Some(parse_defined_name_attributes(e));
                }
            }
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sheet" => {
                    if let Some(info) = parse_sheet_element(e, relationships, meta.sheets.len()) {
                        meta.sheets.push(info);
                    }
                }
                b"definedName" => {
                    let builder = parse_defined_name_attributes(e);
                    if !builder.name.is_empty() {
                        meta.defined_names.push(builder);
                    }
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if let Some(ref mut builder) = current_name {
                    builder.refers_to.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) => {
                if e.local_name().as_ref() == b"definedName" {
                    if let Some(mut builder) = current_name.take() {
                        if !builder.name.is_empty() {
                            builder.refers_to = builder.refers_to.trim().to_string();
                            meta.defined_names.push(builder);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(meta)
}

fn parse_defined_name_attributes(e: &BytesStart<'_>) -> RawDefinedName {
    RawDefinedName {
        name: attr_string(e, b"name").unwrap_or_default(),
        local_sheet_id: attr_u32(e, b"localSheetId"),
        hidden: attr_bool_default(e, b"hidden", false),
        comment: attr_string(e, b"comment").filter(|c| !c.is_empty()),
        refers_to: String::new(),
    }
}

fn parse_sheet_element(
    e: &BytesStart<'_>,
    relationships: &HashMap<String, String>,
    sheet_index: usize,
) -> Option<SheetInfo> {
    let name = attr_string(e, b"name").filter(|n| !n.is_empty())?;
    let r_id = attr_string_local(e, b"id").unwrap_or_default();

    let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
        let idx = sheet_index + 1;
        log::warn!("sheet '{name}' has no worksheet relationship, assuming sheet{idx}.xml");
        format!("xl/worksheets/sheet{idx}.xml")
    });

    Some(SheetInfo { name, path })
}
