//! Table store error types

use thiserror::Error;

/// Result type for table store operations
pub type SheetResult<T> = std::result::Result<T, SheetError>;

/// Errors that can occur while reading or updating a table file
#[derive(Debug, Error)]
pub enum SheetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File extension with no store behind it
    #[error("Unsupported table file '{0}' (expected .xlsx, .xlsm, .csv or .tsv)")]
    UnsupportedExtension(String),

    /// Data row index outside the table
    #[error("Row {row} out of bounds (rows: {rows})")]
    RowOutOfBounds { row: usize, rows: usize },
}

impl From<quick_xml::events::attributes::AttrError> for SheetError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        SheetError::Xml(e.into())
    }
}

impl From<tempfile::PersistError> for SheetError {
    fn from(e: tempfile::PersistError) -> Self {
        SheetError::Io(e.error)
    }
}

impl From<SheetError> for interview_notifier_core::Error {
    fn from(e: SheetError) -> Self {
        match e {
            SheetError::RowOutOfBounds { row, rows } => {
                interview_notifier_core::Error::RowOutOfBounds(row, rows)
            }
            other => interview_notifier_core::Error::store(other),
        }
    }
}
