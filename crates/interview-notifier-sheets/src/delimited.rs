//! CSV / TSV table store

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use interview_notifier_core::{StateWriter, Table};

use crate::atomic::replace_file;
use crate::error::{SheetError, SheetResult};

const BOM: &str = "\u{feff}";

/// Options for delimited files
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvOptions {
    /// Tab-separated values
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }
}

/// A table backed by a delimited text file.
///
/// The file must be UTF-8 encoded. It is held in memory and `persist`
/// rewrites it; a leading byte order mark is kept.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
    options: CsvOptions,
    bom: bool,
    saved: Vec<Vec<String>>,
    grid: Vec<Vec<String>>,
}

impl CsvStore {
    /// Load a delimited file
    pub fn open<P: AsRef<Path>>(path: P, options: CsvOptions) -> SheetResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let (bom, body) = match bytes.strip_prefix(BOM.as_bytes()) {
            Some(rest) => (true, rest),
            None => (false, bytes.as_slice()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(body);

        let mut grid = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| read_error(&path, e))?;
            grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        tracing::debug!(path = %path.display(), rows = grid.len(), "Loaded delimited table");

        Ok(Self {
            path,
            options,
            bom,
            saved: grid.clone(),
            grid,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn set(&mut self, row: usize, col: usize, value: &str) -> SheetResult<()> {
        if row == 0 && self.grid.is_empty() {
            self.grid.push(Vec::new());
        }
        let rows = self.grid.len().saturating_sub(1);
        let cells = self
            .grid
            .get_mut(row)
            .ok_or(SheetError::RowOutOfBounds { row, rows })?;
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    fn save(&self) -> SheetResult<()> {
        replace_file(&self.path, |file| {
            if self.bom {
                file.write_all(BOM.as_bytes())?;
            }
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.options.delimiter)
                .quote(self.options.quote)
                .flexible(true)
                .from_writer(file);
            for row in &self.grid {
                writer.write_record(row)?;
            }
            writer.flush()?;
            Ok(())
        })
    }
}

fn read_error(path: &Path, err: csv::Error) -> SheetError {
    match err.kind() {
        csv::ErrorKind::Utf8 { pos, .. } => {
            let line = pos.as_ref().map_or(0, |p| p.line());
            SheetError::Parse(format!(
                "{} is not UTF-8 encoded (line {line}); re-save it as CSV UTF-8",
                path.display()
            ))
        }
        _ => err.into(),
    }
}

impl StateWriter for CsvStore {
    fn read_table(&mut self) -> interview_notifier_core::Result<Table> {
        Ok(Table::from_grid(self.grid.clone()))
    }

    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> interview_notifier_core::Result<()> {
        Ok(self.set(row, col, value)?)
    }

    fn persist(&mut self) -> interview_notifier_core::Result<()> {
        if self.grid == self.saved {
            return Ok(());
        }
        match self.save() {
            Ok(()) => {
                self.saved = self.grid.clone();
                Ok(())
            }
            Err(e) => {
                self.grid = self.saved.clone();
                Err(e.into())
            }
        }
    }
}
