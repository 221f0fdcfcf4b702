//! # interview-notifier
//!
//! Sends interview notifications to the candidates listed in a spreadsheet
//! and marks each notified row `"Sent"` so a re-run never mails them twice.
//!
//! ## Features
//!
//! - Reads `.xlsx` / `.xlsm` (first worksheet), `.csv` and `.tsv` tables
//! - Detects the email, date, time, description and status columns from
//!   their headers, with manual overrides
//! - Sends through sendmail-compatible programs or the desktop Mail app
//! - Appends every outcome to an activity log
//!
//! ## Example
//!
//! ```no_run
//! use interview_notifier::prelude::*;
//!
//! let mut notifier = Notifier::open("interviews.xlsx").unwrap();
//! let mut mailer = dispatcher(&MailConfig::default());
//! let mut log = FileActivityLog::open(DEFAULT_LOG_FILE).unwrap();
//!
//! let report = notifier.send(&mut mailer, &mut log).unwrap();
//! println!("{}", report.summary);
//! ```

pub mod prelude;

use std::path::Path;

pub use interview_notifier_core::{
    format_body, map_columns, run, select_pending, ActivityLog, BuiltinTemplate, Column, Error,
    FailReason, Field, FieldMapping, FileActivityLog, InterviewRecord, LogEntry, LogLevel,
    MailDispatcher, MemoryActivityLog, MemoryStore, OutgoingMessage, PersistOrder, Result,
    RowOutcome, RowReport, RunOptions, Selection, Session, SessionReport, SessionSummary,
    SkipReason, StateWriter, Table, TemplateConfig, DEFAULT_LOG_FILE, SENT_SENTINEL,
    STATUS_HEADER,
};
pub use interview_notifier_mail::{
    diagnose, dispatcher, AppleMailDispatcher, Check, Diagnosis, MailClient, MailConfig, MailError,
    SendmailDispatcher,
};
pub use interview_notifier_sheets::{
    open_store, write_template, CsvOptions, CsvStore, SheetError, TableFormat, TableStore,
    TemplateLayout, XlsxStore,
};

/// A table file together with the session built from it
#[derive(Debug)]
pub struct Notifier {
    store: TableStore,
    session: Session,
}

impl Notifier {
    /// Open the table at `path` and detect its columns
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = open_store(path)?;
        let session = Session::load(&mut store)?;
        Ok(Self { store, session })
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.session = self.session.with_options(options);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Session access for column overrides
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Notify every pending row, marking each one in the file as it is sent
    pub fn send<D, L>(&mut self, dispatcher: &mut D, log: &mut L) -> Result<SessionReport>
    where
        D: MailDispatcher + ?Sized,
        L: ActivityLog + ?Sized,
    {
        self.session.run(dispatcher, &mut self.store, log)
    }

    /// Notify every pending row without writing anything back to the file
    pub fn send_unmarked<D, L>(&mut self, dispatcher: &mut D, log: &mut L) -> Result<SessionReport>
    where
        D: MailDispatcher + ?Sized,
        L: ActivityLog + ?Sized,
    {
        let selection = self.session.select();
        run(
            &selection,
            None,
            self.session.options(),
            dispatcher,
            &mut self.store,
            log,
        )
    }
}
