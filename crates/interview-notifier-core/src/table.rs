//! In-memory view of the source table

/// A header row plus data rows, every cell rendered as text.
///
/// Data rows are addressed by their 1-based `row_index` (the header row is
/// not counted), matching how outcomes are reported to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from a header row and data rows
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from a grid whose first row is the header row.
    ///
    /// An empty grid yields an empty table.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let headers = grid.remove(0);
        Self {
            headers,
            rows: grid,
        }
    }

    /// Header names, in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (the widest of header and data rows)
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Cell text at a 1-based data row and 0-based column; missing cells read as `""`
    pub fn cell(&self, row_index: usize, col: usize) -> &str {
        row_index
            .checked_sub(1)
            .and_then(|r| self.rows.get(r))
            .and_then(|row| row.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Iterate data rows with their 1-based row index
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i + 1, row.as_slice()))
    }

    /// Column index of the first header equal to `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Overwrite a data cell, growing the row if needed
    pub fn set_cell(&mut self, row_index: usize, col: usize, value: impl Into<String>) {
        let Some(row) = row_index.checked_sub(1).and_then(|r| self.rows.get_mut(r)) else {
            return;
        };
        if row.len() <= col {
            row.resize(col + 1, String::new());
        }
        row[col] = value.into();
    }

    /// Overwrite a header, growing the header row if needed
    pub fn set_header(&mut self, col: usize, name: impl Into<String>) {
        if self.headers.len() <= col {
            self.headers.resize(col + 1, String::new());
        }
        self.headers[col] = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_from_grid_splits_header() {
        let table = Table::from_grid(grid(&[&["Email", "Date"], &["a@x.com", "2025-01-01"]]));
        assert_eq!(table.headers(), &["Email".to_string(), "Date".to_string()]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(1, 0), "a@x.com");
    }

    #[test]
    fn test_from_empty_grid() {
        let table = Table::from_grid(Vec::new());
        assert!(table.headers().is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let table = Table::from_grid(grid(&[&["Email"], &["a@x.com"]]));
        assert_eq!(table.cell(0, 0), "");
        assert_eq!(table.cell(2, 0), "");
        assert_eq!(table.cell(1, 5), "");
    }

    #[test]
    fn test_ragged_rows() {
        let table = Table::from_grid(grid(&[&["A"], &["1", "2", "3"]]));
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_set_cell_grows_row() {
        let mut table = Table::from_grid(grid(&[&["A", "B", "C"], &["1"]]));
        table.set_cell(1, 2, "Sent");
        assert_eq!(table.cell(1, 2), "Sent");
        assert_eq!(table.cell(1, 1), "");
    }

    #[test]
    fn test_column_index_first_match() {
        let table = Table::from_grid(grid(&[&["Email", "Email"]]));
        assert_eq!(table.column_index("Email"), Some(0));
        assert_eq!(table.column_index("Nope"), None);
    }
}
