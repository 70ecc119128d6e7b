//! Structured error types for xltower.
//!
//! Only the load boundary (file, archive, sheet selection) and the carrier
//! registry produce errors. The inference stages never fail; an unresolved
//! slot is simply left empty.

use std::path::PathBuf;

/// All errors that can occur while loading a sheet or a carrier registry.
#[derive(Debug, thiserror::Error)]
pub enum XltowerError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The input path does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input exists but is not a readable XLSX workbook.
    #[error("Invalid or unsupported format: {0}")]
    InvalidFormat(String),

    /// The requested worksheet is not in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Carrier registry could not be deserialized.
    #[error("Carrier config: {0}")]
    Config(String),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XltowerError>;

impl From<serde_yaml::Error> for XltowerError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}
