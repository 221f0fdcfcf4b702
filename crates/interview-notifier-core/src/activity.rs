//! Append-only activity log
//!
//! Each entry is one line: `YYYY-MM-DD HH:MM:SS | LEVEL | message`. A run is
//! bracketed by a start banner and a summary banner so several sessions can
//! share one file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::record::{RowOutcome, RowReport, SessionSummary};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const BANNER_WIDTH: usize = 70;

/// Severity of an activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        })
    }
}

/// Sink for session and per-row events
pub trait ActivityLog {
    /// Append one entry
    fn append(&mut self, level: LogLevel, message: &str) -> io::Result<()>;

    fn session_start(&mut self) -> io::Result<()> {
        let rule = "=".repeat(BANNER_WIDTH);
        self.append(LogLevel::Info, &rule)?;
        self.append(LogLevel::Info, "NEW SESSION STARTED")?;
        self.append(LogLevel::Info, &rule)
    }

    fn row(&mut self, report: &RowReport) -> io::Result<()> {
        let email = if report.email.is_empty() {
            "(none)"
        } else {
            report.email.as_str()
        };
        let (level, mut message) = match report.outcome {
            RowOutcome::Sent => (
                LogLevel::Info,
                format!("Row {} | Email: {} | Status: Sent", report.row_index, email),
            ),
            RowOutcome::Failed(reason) => (
                LogLevel::Error,
                format!(
                    "Row {} | Email: {} | Status: Failed | Error: {}",
                    report.row_index, email, reason
                ),
            ),
            RowOutcome::Skipped(reason) => (
                LogLevel::Info,
                format!(
                    "Row {} | Email: {} | Status: Skipped | Reason: {}",
                    report.row_index, email, reason
                ),
            ),
        };
        if let Some(detail) = &report.detail {
            message.push_str(" | Detail: ");
            message.push_str(detail);
        }
        self.append(level, &message)
    }

    fn session_end(&mut self, summary: &SessionSummary) -> io::Result<()> {
        self.append(LogLevel::Info, &"-".repeat(BANNER_WIDTH))?;
        self.append(LogLevel::Info, &format!("SESSION SUMMARY: {summary}"))?;
        self.append(LogLevel::Info, &"=".repeat(BANNER_WIDTH))
    }
}

impl<T: ActivityLog + ?Sized> ActivityLog for Box<T> {
    fn append(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        (**self).append(level, message)
    }
}

/// Activity log appended to a text file and mirrored to `tracing`
#[derive(Debug)]
pub struct FileActivityLog {
    path: PathBuf,
    file: File,
}

impl FileActivityLog {
    /// Open (or create) the log file for appending
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivityLog for FileActivityLog {
    fn append(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        writeln!(self.file, "{timestamp} | {level} | {message}")?;
        self.file.flush()
    }
}

/// One captured entry of a [`MemoryActivityLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Activity log kept in memory, for previews and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryActivityLog {
    pub entries: Vec<LogEntry>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }
}

impl ActivityLog for MemoryActivityLog {
    fn append(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        self.entries.push(LogEntry {
            level,
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FailReason, SkipReason};

    #[test]
    fn test_file_log_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.log");

        let mut log = FileActivityLog::open(&path).unwrap();
        log.row(&RowReport::new(3, "a@x.com", RowOutcome::Failed(FailReason::SendFailed)))
            .unwrap();
        drop(log);

        let text = std::fs::read_to_string(&path).unwrap();
        let line = text.lines().next().unwrap();
        let parts: Vec<&str> = line.splitn(3, " | ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), "2025-01-01 10:00:00".len());
        assert_eq!(parts[1], "ERROR");
        assert_eq!(parts[2], "Row 3 | Email: a@x.com | Status: Failed | Error: send-failed");
    }

    #[test]
    fn test_file_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.log");

        FileActivityLog::open(&path).unwrap().session_start().unwrap();
        FileActivityLog::open(&path)
            .unwrap()
            .session_end(&SessionSummary::default())
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("| INFO | NEW SESSION STARTED"));
        assert!(text.contains("| INFO | SESSION SUMMARY: 0 sent, 0 failed, 0 skipped"));
    }

    #[test]
    fn test_row_messages() {
        let mut log = MemoryActivityLog::new();
        log.row(&RowReport::new(1, "a@x.com", RowOutcome::Sent)).unwrap();
        log.row(&RowReport::new(2, "", RowOutcome::Skipped(SkipReason::NoEmail)))
            .unwrap();
        log.row(
            &RowReport::new(3, "c@x.com", RowOutcome::Failed(FailReason::ExcelUpdateFailed))
                .with_detail("disk full"),
        )
        .unwrap();

        let messages: Vec<&str> = log.messages().collect();
        assert_eq!(
            messages,
            vec![
                "Row 1 | Email: a@x.com | Status: Sent",
                "Row 2 | Email: (none) | Status: Skipped | Reason: no-email",
                "Row 3 | Email: c@x.com | Status: Failed | Error: excel-update-failed | Detail: disk full",
            ]
        );
        assert_eq!(log.entries[2].level, LogLevel::Error);
    }
}
