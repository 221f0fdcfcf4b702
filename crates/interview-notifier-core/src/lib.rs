//! # interview-notifier-core
//!
//! Core logic for sending interview notifications from a spreadsheet.
//!
//! This crate knows nothing about file formats or mail clients. It provides:
//! - [`Table`] - Header row plus data rows, every cell as text
//! - [`map_columns`] and [`FieldMapping`] - Header detection for the five fields
//! - [`select_pending`] - Row validation and the work list
//! - [`format_body`] and [`TemplateConfig`] - Message text
//! - [`Session`] and [`run`] - The dispatch loop
//! - [`MailDispatcher`], [`StateWriter`], [`ActivityLog`] - Adapter seams
//!
//! ## Example
//!
//! ```rust
//! use interview_notifier_core::{map_columns, select_pending, Field, Table};
//!
//! let table = Table::from_grid(vec![
//!     vec!["Email ID".into(), "Date".into(), "Time".into(), "Details".into(), "Sent".into()],
//!     vec!["a@x.com".into(), "2025-01-01".into(), "10:00".into(), "Tech Round".into(), "".into()],
//!     vec!["b@x.com".into(), "2025-01-02".into(), "11:00".into(), "HR Round".into(), "Sent".into()],
//! ]);
//!
//! let mapping = map_columns(table.headers());
//! assert_eq!(mapping.index(Field::Status), Some(4));
//!
//! let selection = select_pending(&table, &mapping);
//! assert_eq!(selection.pending.len(), 1);
//! assert_eq!(selection.skipped.len(), 1);
//! ```

pub mod activity;
pub mod error;
pub mod mapping;
pub mod ports;
pub mod record;
pub mod select;
pub mod session;
pub mod table;
pub mod template;

pub use activity::{ActivityLog, FileActivityLog, LogEntry, LogLevel, MemoryActivityLog};
pub use error::{BoxError, Error, Result};
pub use mapping::{map_columns, Column, Field, FieldMapping};
pub use ports::{MailDispatcher, MemoryStore, OutgoingMessage, StateWriter};
pub use record::{
    FailReason, InterviewRecord, RowOutcome, RowReport, SessionSummary, SkipReason, SENT_SENTINEL,
};
pub use select::{select_pending, Selection};
pub use session::{run, PersistOrder, RunOptions, Session, SessionReport, STATUS_HEADER};
pub use table::Table;
pub use template::{format_body, BuiltinTemplate, TemplateConfig};

/// Default activity log file name
pub const DEFAULT_LOG_FILE: &str = "email_notifications.log";
