//! # interview-notifier-sheets
//!
//! Table stores for interview-notifier: the spreadsheet files the notifier
//! reads candidates from and writes the `"Sent"` status back into.
//!
//! - [`XlsxStore`] - first worksheet of an `.xlsx` / `.xlsm` workbook
//! - [`CsvStore`] - `.csv` and `.tsv` files
//! - [`open_store`] - pick the store from the file extension
//! - [`write_template`] - starter tables with sample rows
//!
//! Every store implements [`StateWriter`], and every save replaces the file
//! atomically.

mod atomic;
mod delimited;
mod error;
mod template;
mod xlsx;

use std::path::Path;

use interview_notifier_core::{StateWriter, Table};

pub use delimited::{CsvOptions, CsvStore};
pub use error::{SheetError, SheetResult};
pub use template::{write_template, TemplateLayout};
pub use xlsx::XlsxStore;

/// Worksheet name used for generated workbooks
pub const SHEET_NAME: &str = "Interviews";

/// File formats a table can be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv { delimiter: u8 },
}

impl TableFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> SheetResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(TableFormat::Xlsx),
            Some("csv") => Ok(TableFormat::Csv { delimiter: b',' }),
            Some("tsv") => Ok(TableFormat::Csv { delimiter: b'\t' }),
            _ => Err(SheetError::UnsupportedExtension(path.display().to_string())),
        }
    }
}

/// Any supported table store
#[derive(Debug)]
pub enum TableStore {
    Xlsx(XlsxStore),
    Csv(CsvStore),
}

impl TableStore {
    pub fn path(&self) -> &Path {
        match self {
            TableStore::Xlsx(store) => store.path(),
            TableStore::Csv(store) => store.path(),
        }
    }

    pub fn format(&self) -> &'static str {
        match self {
            TableStore::Xlsx(_) => "xlsx",
            TableStore::Csv(_) => "csv",
        }
    }
}

impl StateWriter for TableStore {
    fn read_table(&mut self) -> interview_notifier_core::Result<Table> {
        match self {
            TableStore::Xlsx(store) => store.read_table(),
            TableStore::Csv(store) => store.read_table(),
        }
    }

    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> interview_notifier_core::Result<()> {
        match self {
            TableStore::Xlsx(store) => store.write_cell(row, col, value),
            TableStore::Csv(store) => store.write_cell(row, col, value),
        }
    }

    fn persist(&mut self) -> interview_notifier_core::Result<()> {
        match self {
            TableStore::Xlsx(store) => store.persist(),
            TableStore::Csv(store) => store.persist(),
        }
    }
}

/// Open the table at `path`, choosing the store from its extension
pub fn open_store<P: AsRef<Path>>(path: P) -> SheetResult<TableStore> {
    let path = path.as_ref();
    let store = match TableFormat::from_path(path)? {
        TableFormat::Xlsx => TableStore::Xlsx(XlsxStore::open(path)?),
        TableFormat::Csv { delimiter } => TableStore::Csv(CsvStore::open(
            path,
            CsvOptions {
                delimiter,
                ..CsvOptions::default()
            },
        )?),
    };
    tracing::debug!(path = %path.display(), format = store.format(), "Opened table");
    Ok(store)
}
