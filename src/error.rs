//! Structured error types for xlreport.
//!
//! Every fallible operation in the crate returns [`ReportError`]. Precondition
//! violations are programmer errors; they are reported instead of corrected.

/// All errors that can occur while loading, mutating, or saving a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A defined name, sheet name, or sheet index does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller broke an operation's contract (inverted selection,
    /// shift past the grid bounds, overlapping merge, ...).
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Invalid cell or area reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// Structurally invalid template content.
    #[error("Parse error: {0}")]
    Parse(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
