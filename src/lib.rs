//! xlreport - fill XLSX report templates
//!
//! Loads a template workbook, resolves its defined names to cells and
//! areas, and applies row-level structural edits before saving:
//! - Write values, styles and page breaks into named cells
//! - Copy a detail block once per record, insert, delete, clear or hide rows
//! - Merged regions and manual page breaks follow the rows they belong to
//! - Untouched parts of the template are saved byte-identical
//!
//! # Usage
//!
//! ```no_run
//! use xlreport::{CopyPolicy, Document};
//!
//! # fn main() -> xlreport::Result<()> {
//! let mut doc = Document::open("invoice_template.xlsx")?;
//! doc.cell_by_name("Customer")?.value("ACME Corp");
//!
//! let line = doc.range("Line")?;
//! doc.copy_rows(&line, 2, CopyPolicy::Full)?;
//!
//! doc.save("out/invoice.xlsx")?;
//! # Ok(())
//! # }
//! ```

pub mod cell_ref;
pub mod document;
pub mod editor;
pub mod error;
pub mod formula;
pub mod names;
pub mod parser;
pub mod shift;
pub mod types;
pub mod xml_helpers;

pub(crate) mod export;

pub use document::Document;
pub use editor::{CellMut, CopyPolicy};
pub use error::{ReportError, Result};
pub use names::{NameResolver, NameTarget};

pub use types::*;

/// Get the library version
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
