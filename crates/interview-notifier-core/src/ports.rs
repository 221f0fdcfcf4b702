//! Collaborators the dispatch loop talks to
//!
//! The loop never touches the mail client or the table file directly; it goes
//! through these traits so both can be swapped for test doubles.

use crate::error::Result;
use crate::table::Table;

/// One outgoing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Hands messages to whatever mail client is installed
pub trait MailDispatcher {
    /// Verify the client is reachable and has an account to send from.
    ///
    /// Called once before any row is processed; an error aborts the run.
    fn connect(&mut self) -> Result<()>;

    /// Hand over a single message. Success means the client accepted it,
    /// not that it was delivered.
    fn send(&mut self, message: &OutgoingMessage) -> Result<()>;
}

/// Reads the table and persists single-cell updates back to its file
pub trait StateWriter {
    /// Current contents of the table
    fn read_table(&mut self) -> Result<Table>;

    /// Stage a cell update. `row` 0 is the header row, data rows start at 1.
    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()>;

    /// Flush staged updates to the underlying file
    fn persist(&mut self) -> Result<()>;
}

impl<T: MailDispatcher + ?Sized> MailDispatcher for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        (**self).send(message)
    }
}

impl<T: StateWriter + ?Sized> StateWriter for Box<T> {
    fn read_table(&mut self) -> Result<Table> {
        (**self).read_table()
    }

    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        (**self).write_cell(row, col, value)
    }

    fn persist(&mut self) -> Result<()> {
        (**self).persist()
    }
}

/// A [`StateWriter`] backed by an in-memory [`Table`]; `persist` is a no-op
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: Table,
    persist_count: usize,
}

impl MemoryStore {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            persist_count: 0,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// How many times `persist` was called
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl StateWriter for MemoryStore {
    fn read_table(&mut self) -> Result<Table> {
        Ok(self.table.clone())
    }

    fn write_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        if row == 0 {
            self.table.set_header(col, value);
            return Ok(());
        }
        if row > self.table.row_count() {
            return Err(crate::Error::RowOutOfBounds(row, self.table.row_count()));
        }
        self.table.set_cell(row, col, value);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.persist_count += 1;
        Ok(())
    }
}
