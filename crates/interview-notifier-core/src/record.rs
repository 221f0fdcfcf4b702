//! Per-row records and outcomes

use std::fmt;

/// Literal written into the status column once a row has been notified
pub const SENT_SENTINEL: &str = "Sent";

/// A row that passed validation and is ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewRecord {
    /// 1-based data row position (header excluded)
    pub row_index: usize,
    pub email: String,
    pub date: String,
    pub time: String,
    pub description: String,
}

/// Why a row was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Status column already holds the sentinel
    AlreadySent,
    /// Email cell is empty
    NoEmail,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadySent => "already-sent",
            SkipReason::NoEmail => "no-email",
        }
    }
}

/// Why a row could not be notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailReason {
    /// One of email/date/time/description is empty
    MissingRequiredData,
    /// The mail client rejected the message
    SendFailed,
    /// The message went out but the sentinel could not be saved
    ExcelUpdateFailed,
}

impl FailReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailReason::MissingRequiredData => "missing-required-data",
            FailReason::SendFailed => "send-failed",
            FailReason::ExcelUpdateFailed => "excel-update-failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final classification of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowOutcome {
    Sent,
    Failed(FailReason),
    Skipped(SkipReason),
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOutcome::Sent => f.write_str("Sent"),
            RowOutcome::Failed(reason) => write!(f, "Failed ({reason})"),
            RowOutcome::Skipped(reason) => write!(f, "Skipped ({reason})"),
        }
    }
}

/// An outcome tied to the row it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub row_index: usize,
    /// Email cell text, empty when the row has none
    pub email: String,
    pub outcome: RowOutcome,
    /// Adapter error text for dispatch/persistence failures
    pub detail: Option<String>,
}

impl RowReport {
    pub fn new(row_index: usize, email: impl Into<String>, outcome: RowOutcome) -> Self {
        Self {
            row_index,
            email: email.into(),
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Outcome counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SessionSummary {
    /// Count one outcome
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Sent => self.sent += 1,
            RowOutcome::Failed(_) => self.failed += 1,
            RowOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Tally a set of reports
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a RowReport>) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(report.outcome);
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed + self.skipped
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sent, {} failed, {} skipped",
            self.sent, self.failed, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let reports = [
            RowReport::new(1, "a@x.com", RowOutcome::Sent),
            RowReport::new(2, "", RowOutcome::Skipped(SkipReason::NoEmail)),
            RowReport::new(3, "c@x.com", RowOutcome::Failed(FailReason::SendFailed)),
            RowReport::new(4, "d@x.com", RowOutcome::Skipped(SkipReason::AlreadySent)),
        ];
        let summary = SessionSummary::from_reports(&reports);
        assert_eq!(
            summary,
            SessionSummary {
                sent: 1,
                failed: 1,
                skipped: 2
            }
        );
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.to_string(), "1 sent, 1 failed, 2 skipped");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(RowOutcome::Sent.to_string(), "Sent");
        assert_eq!(
            RowOutcome::Failed(FailReason::ExcelUpdateFailed).to_string(),
            "Failed (excel-update-failed)"
        );
        assert_eq!(
            RowOutcome::Skipped(SkipReason::AlreadySent).to_string(),
            "Skipped (already-sent)"
        );
    }
}
