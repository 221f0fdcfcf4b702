//! Session context and the dispatch loop

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityLog, LogLevel};
use crate::error::Result;
use crate::mapping::{map_columns, Column, Field, FieldMapping};
use crate::ports::{MailDispatcher, OutgoingMessage, StateWriter};
use crate::record::{
    FailReason, InterviewRecord, RowOutcome, RowReport, SessionSummary, SENT_SENTINEL,
};
use crate::select::{select_pending, Selection};
use crate::table::Table;
use crate::template::{format_body, TemplateConfig};

/// Header written when the table has no status column yet
pub const STATUS_HEADER: &str = "Status";

/// When the sentinel is persisted relative to the send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistOrder {
    /// Send, then mark. A failed save leaves a sent but unmarked row
    /// (re-running sends it again).
    #[default]
    SendThenMark,
    /// Mark, then send. A failed send leaves a marked but unsent row
    /// (re-running skips it).
    MarkThenSend,
}

/// Per-run settings shared by every row
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub template: TemplateConfig,
    pub persist_order: PersistOrder,
}

/// Every row's outcome, in file order, plus the counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub reports: Vec<RowReport>,
    pub summary: SessionSummary,
    /// Rows whose sentinel was saved, including marked rows that failed to send
    pub marked: Vec<usize>,
}

impl SessionReport {
    pub fn sent(&self) -> impl Iterator<Item = &RowReport> {
        self.reports.iter().filter(|r| r.outcome == RowOutcome::Sent)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RowReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Failed(_)))
    }
}

/// Working state of one operator session: the loaded table and its mapping.
///
/// Built once from a [`StateWriter`], adjusted by the operator (column
/// overrides), then handed to [`Session::run`].
#[derive(Debug, Clone)]
pub struct Session {
    table: Table,
    mapping: FieldMapping,
    options: RunOptions,
}

impl Session {
    /// Read the table and auto-detect the mapping
    pub fn load<W: StateWriter + ?Sized>(writer: &mut W) -> Result<Self> {
        let table = writer.read_table()?;
        Ok(Self::new(table))
    }

    pub fn new(table: Table) -> Self {
        let mapping = map_columns(table.headers());
        Self {
            table,
            mapping,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Bind a field to a header by name
    pub fn assign(&mut self, field: Field, header: &str) -> Result<()> {
        self.mapping.assign(field, header, self.table.headers())
    }

    pub fn unassign(&mut self, field: Field) {
        self.mapping.unassign(field);
    }

    /// Classify the rows against the current mapping
    pub fn select(&self) -> Selection {
        select_pending(&self.table, &self.mapping)
    }

    /// Connect, then send every pending row.
    ///
    /// With no status column mapped and at least one pending row, a status
    /// header is added in the first free column; it reaches the file together
    /// with the first mark, so a run that marks nothing leaves the file as it
    /// was. Every marked row is mirrored in the in-memory table, so a second
    /// call on the same session sends nothing.
    pub fn run<D, W, L>(
        &mut self,
        dispatcher: &mut D,
        writer: &mut W,
        log: &mut L,
    ) -> Result<SessionReport>
    where
        D: MailDispatcher + ?Sized,
        W: StateWriter + ?Sized,
        L: ActivityLog + ?Sized,
    {
        log.session_start()?;
        connect(dispatcher, log)?;

        let selection = self.select();
        let mut marker = match self.mapping.index(Field::Status) {
            Some(col) => StatusMarker::existing(col),
            None if selection.pending.is_empty() => StatusMarker::disabled(),
            None => {
                let index = self.table.column_count();
                note(
                    log,
                    LogLevel::Warning,
                    &format!(
                        "No status column mapped; adding '{STATUS_HEADER}' in column {}",
                        index + 1
                    ),
                );
                StatusMarker::adding(index)
            }
        };

        let report = process(&selection, &mut marker, &self.options, dispatcher, writer, log);
        close(log, &report.summary);

        if let Some(col) = marker.column {
            if marker.header_written {
                self.table.set_header(col, STATUS_HEADER);
                self.mapping.set(
                    Field::Status,
                    Column {
                        index: col,
                        header: STATUS_HEADER.to_string(),
                    },
                );
            }
            for &row in &report.marked {
                self.table.set_cell(row, col, SENT_SENTINEL);
            }
        }
        Ok(report)
    }
}

/// Send every pending row of `selection` and record the outcomes.
///
/// The dispatcher is connected first; if that fails nothing is sent and the
/// error is returned. Skipped and rejected rows from the selection are logged
/// at their row position and counted in the summary. With no status column
/// sent rows are not marked.
pub fn run<D, W, L>(
    selection: &Selection,
    status_column: Option<usize>,
    options: &RunOptions,
    dispatcher: &mut D,
    writer: &mut W,
    log: &mut L,
) -> Result<SessionReport>
where
    D: MailDispatcher + ?Sized,
    W: StateWriter + ?Sized,
    L: ActivityLog + ?Sized,
{
    log.session_start()?;
    connect(dispatcher, log)?;
    let mut marker = match status_column {
        Some(col) => StatusMarker::existing(col),
        None => StatusMarker::disabled(),
    };
    let report = process(selection, &mut marker, options, dispatcher, writer, log);
    close(log, &report.summary);
    Ok(report)
}

/// Writes the sentinel, staging a new status header along with the first mark
#[derive(Debug)]
struct StatusMarker {
    column: Option<usize>,
    needs_header: bool,
    header_written: bool,
}

impl StatusMarker {
    fn existing(col: usize) -> Self {
        Self {
            column: Some(col),
            needs_header: false,
            header_written: false,
        }
    }

    fn disabled() -> Self {
        Self {
            column: None,
            needs_header: false,
            header_written: false,
        }
    }

    fn adding(col: usize) -> Self {
        Self {
            column: Some(col),
            needs_header: true,
            header_written: false,
        }
    }

    /// Returns whether the row was marked. A failed save keeps the header
    /// pending for the next row.
    fn mark<W: StateWriter + ?Sized>(&mut self, writer: &mut W, row_index: usize) -> Result<bool> {
        let Some(col) = self.column else {
            return Ok(false);
        };
        if self.needs_header {
            writer.write_cell(0, col, STATUS_HEADER)?;
        }
        writer.write_cell(row_index, col, SENT_SENTINEL)?;
        writer.persist()?;
        if self.needs_header {
            self.needs_header = false;
            self.header_written = true;
        }
        Ok(true)
    }
}

fn connect<D, L>(dispatcher: &mut D, log: &mut L) -> Result<()>
where
    D: MailDispatcher + ?Sized,
    L: ActivityLog + ?Sized,
{
    if let Err(e) = dispatcher.connect() {
        note(log, LogLevel::Error, &e.to_string());
        close(log, &SessionSummary::default());
        return Err(e);
    }
    Ok(())
}

fn process<D, W, L>(
    selection: &Selection,
    marker: &mut StatusMarker,
    options: &RunOptions,
    dispatcher: &mut D,
    writer: &mut W,
    log: &mut L,
) -> SessionReport
where
    D: MailDispatcher + ?Sized,
    W: StateWriter + ?Sized,
    L: ActivityLog + ?Sized,
{
    if marker.column.is_none() && !selection.pending.is_empty() {
        note(
            log,
            LogLevel::Warning,
            "No status column mapped; sent rows will not be marked",
        );
    }

    let mut classified = selection.outcomes_in_row_order().into_iter().peekable();
    let mut reports = Vec::with_capacity(
        selection.pending.len() + selection.skipped.len() + selection.rejected.len(),
    );
    let mut marked = Vec::new();

    for record in &selection.pending {
        while let Some(early) = classified.next_if(|r| r.row_index < record.row_index) {
            emit(log, &early);
            reports.push(early);
        }

        let (report, was_marked) = dispatch_one(record, marker, options, dispatcher, writer);
        if was_marked {
            marked.push(record.row_index);
        }
        emit(log, &report);
        reports.push(report);
    }
    for rest in classified {
        emit(log, &rest);
        reports.push(rest);
    }

    let summary = SessionSummary::from_reports(&reports);
    SessionReport {
        reports,
        summary,
        marked,
    }
}

/// Send one row in the configured order. The flag tells whether the row's
/// sentinel reached the file, whatever the outcome.
fn dispatch_one<D, W>(
    record: &InterviewRecord,
    marker: &mut StatusMarker,
    options: &RunOptions,
    dispatcher: &mut D,
    writer: &mut W,
) -> (RowReport, bool)
where
    D: MailDispatcher + ?Sized,
    W: StateWriter + ?Sized,
{
    let message = OutgoingMessage {
        to: record.email.clone(),
        subject: options.template.subject().to_string(),
        body: format_body(record, &options.template),
    };
    let report = |outcome| RowReport::new(record.row_index, record.email.as_str(), outcome);

    match options.persist_order {
        PersistOrder::SendThenMark => {
            if let Err(e) = dispatcher.send(&message) {
                let failed =
                    report(RowOutcome::Failed(FailReason::SendFailed)).with_detail(e.to_string());
                return (failed, false);
            }
            match marker.mark(writer, record.row_index) {
                Ok(marked) => (report(RowOutcome::Sent), marked),
                Err(e) => (
                    report(RowOutcome::Failed(FailReason::ExcelUpdateFailed))
                        .with_detail(format!("email was sent but the row was not marked: {e}")),
                    false,
                ),
            }
        }
        PersistOrder::MarkThenSend => {
            let marked = match marker.mark(writer, record.row_index) {
                Ok(marked) => marked,
                Err(e) => {
                    let failed = report(RowOutcome::Failed(FailReason::ExcelUpdateFailed))
                        .with_detail(format!("nothing was sent: {e}"));
                    return (failed, false);
                }
            };
            match dispatcher.send(&message) {
                Ok(()) => (report(RowOutcome::Sent), marked),
                Err(e) => (
                    report(RowOutcome::Failed(FailReason::SendFailed))
                        .with_detail(format!("row is marked {SENT_SENTINEL} but was not sent: {e}")),
                    marked,
                ),
            }
        }
    }
}

fn emit<L: ActivityLog + ?Sized>(log: &mut L, report: &RowReport) {
    if let Err(e) = log.row(report) {
        tracing::warn!(row = report.row_index, "Failed to write activity log: {e}");
    }
}

fn note<L: ActivityLog + ?Sized>(log: &mut L, level: LogLevel, message: &str) {
    if let Err(e) = log.append(level, message) {
        tracing::warn!("Failed to write activity log: {e}");
    }
}

fn close<L: ActivityLog + ?Sized>(log: &mut L, summary: &SessionSummary) {
    if let Err(e) = log.session_end(summary) {
        tracing::warn!("Failed to write activity log: {e}");
    }
}
