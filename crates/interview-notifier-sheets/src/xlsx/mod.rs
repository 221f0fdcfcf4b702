//! XLSX table store
//!
//! Reads the first worksheet as display text and writes status updates back
//! by patching only that worksheet's XML part. Every other entry of the
//! package is copied over raw, so styles, other sheets, charts and the like
//! survive untouched.

mod cell_ref;
mod number_format;
mod patch;
mod reader;
mod writer;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use interview_notifier_core::{StateWriter, Table};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::atomic::replace_file;
use crate::error::{SheetError, SheetResult};
use patch::{patch_sheet, CellEdits};

pub(crate) use writer::NewSheet;

/// A table backed by the first worksheet of an `.xlsx` / `.xlsm` file
#[derive(Debug, Clone)]
pub struct XlsxStore {
    path: PathBuf,
    sheet_name: String,
    sheet_part: String,
    saved: Table,
    table: Table,
    edits: CellEdits,
}

impl XlsxStore {
    /// Open a workbook and load its first worksheet
    pub fn open<P: AsRef<Path>>(path: P) -> SheetResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(lock) = office_lock_file(&path) {
            tracing::warn!(
                path = %path.display(),
                lock = %lock.display(),
                "Workbook appears to be open in a spreadsheet application; saving may fail"
            );
        }

        let file = File::open(&path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let sheet = reader::read_first_sheet(&mut archive)?;
        let table = Table::from_grid(sheet.grid);

        Ok(Self {
            path,
            sheet_name: sheet.name,
            sheet_part: sheet.part,
            saved: table.clone(),
            table,
            edits: CellEdits::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the worksheet being read and updated
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn stage(&mut self, row: usize, col: usize, value: &str) -> SheetResult<()> {
        if row > self.table.row_count() {
            return Err(SheetError::RowOutOfBounds {
                row,
                rows: self.table.row_count(),
            });
        }
        let sheet_row = u32::try_from(row + 1)
            .map_err(|_| SheetError::Parse(format!("Row {} is beyond the sheet", row)))?;
        let sheet_col = u32::try_from(col)
            .map_err(|_| SheetError::Parse(format!("Column {} is beyond the sheet", col)))?;

        self.edits
            .entry(sheet_row)
            .or_default()
            .insert(sheet_col, value.to_string());
        if row == 0 {
            self.table.set_header(col, value);
        } else {
            self.table.set_cell(row, col, value);
        }
        Ok(())
    }

    fn save(&self) -> SheetResult<()> {
        let file = File::open(&self.path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let mut original = Vec::new();
        archive
            .by_name(&self.sheet_part)
            .map_err(|_| SheetError::MissingPart(self.sheet_part.clone()))?
            .read_to_end(&mut original)?;
        let patched = patch_sheet(&original, &self.edits)?;

        replace_file(&self.path, |out| {
            let mut zip = ZipWriter::new(out);
            for i in 0..archive.len() {
                let entry = archive.by_index_raw(i)?;
                if entry.name() == self.sheet_part {
                    let options = SimpleFileOptions::default()
                        .compression_method(CompressionMethod::Deflated);
                    let name = entry.name().to_string();
                    drop(entry);
                    zip.start_file(name, options)?;
                    zip.write_all(&patched)?;
                } else {
                    zip.raw_copy_file(entry)?;
                }
            }
            zip.finish()?;
            Ok(())
        })?;

        tracing::info!(
            path = %self.path.display(),
            cells = self.edits.values().map(|cells| cells.len()).sum::<usize>(),
            "Saved cell updates"
        );
        Ok(())
    }
}

impl StateWriter for XlsxStore {
    fn read_table(&mut self) -> interview_notifier_core::Result<Table> {
        Ok(self.table.clone())
    }

    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> interview_notifier_core::Result<()> {
        Ok(self.stage(row, col, value)?)
    }

    fn persist(&mut self) -> interview_notifier_core::Result<()> {
        if self.edits.is_empty() {
            return Ok(());
        }
        let result = self.save();
        self.edits.clear();
        match result {
            Ok(()) => {
                self.saved = self.table.clone();
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), "Failed to save workbook: {e}");
                self.table = self.saved.clone();
                Err(e.into())
            }
        }
    }
}

/// `~$name.xlsx` next to the file while Excel or LibreOffice has it open
fn office_lock_file(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let lock = path.with_file_name(format!("~${}", name));
    lock.exists().then_some(lock)
}

/// Write a new single-sheet workbook to `path`
pub(crate) fn create<P: AsRef<Path>>(path: P, sheet: &NewSheet<'_>) -> SheetResult<()> {
    replace_file(path.as_ref(), |out| writer::write_workbook(out, sheet))
}
