//! Patch a template xlsx archive with regenerated sheet XML.
//!
//! Unmodified entries are copied via `raw_copy_file` (no recompression).
//! Only dirty sheets get new XML. Because rewritten sheets may have moved
//! formula cells, the calculation chain is dropped along with its
//! content-type override and relationship; Excel rebuilds it on load.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;
use crate::types::Grid;
use crate::xml_helpers::attr_string;

use super::sheet_writer::write_sheet_xml;

const CALC_CHAIN: &str = "xl/calcChain.xml";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";

/// Patch the template bytes, replacing only sheets in `dirty_sheets`.
pub(crate) fn patch_zip(
    template: &[u8],
    sheets: &[Grid],
    sheet_paths: &[String],
    dirty_sheets: &HashSet<usize>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;

    let dirty_paths: HashMap<&str, &Grid> = dirty_sheets
        .iter()
        .filter_map(|&idx| Some((sheet_paths.get(idx)?.as_str(), sheets.get(idx)?)))
        .collect();
    let drop_calc_chain = !dirty_paths.is_empty() && archive.by_name(CALC_CHAIN).is_ok();

    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        if let Some(grid) = dirty_paths.get(name.as_str()) {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(write_sheet_xml(grid).as_bytes())?;
            continue;
        }

        if drop_calc_chain {
            if name == CALC_CHAIN {
                log::debug!("dropping stale calculation chain");
                continue;
            }
            if name == CONTENT_TYPES || name == WORKBOOK_RELS {
                let mut xml = String::new();
                archive.by_index(i)?.read_to_string(&mut xml)?;
                let filtered = without_calc_chain_refs(&xml)?;
                writer.start_file(name.as_str(), options)?;
                writer.write_all(&filtered)?;
                continue;
            }
        }

        writer.raw_copy_file(archive.by_index_raw(i)?)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Copy a package XML part, leaving out the `Override` or `Relationship`
/// entries that point at the calculation chain.
fn without_calc_chain_refs(xml: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Empty(ref e) if refers_to_calc_chain(e) => {}
            event => writer.write_event(event)?,
        }
    }
    Ok(writer.into_inner())
}

fn refers_to_calc_chain(e: &quick_xml::events::BytesStart) -> bool {
    let target = match e.local_name().as_ref() {
        b"Override" => attr_string(e, b"PartName"),
        b"Relationship" => attr_string(e, b"Target"),
        _ => None,
    };
    target.is_some_and(|t| t.ends_with("calcChain.xml"))
}
