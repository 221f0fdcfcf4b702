//! Row validation and work-list selection

use crate::mapping::{Field, FieldMapping};
use crate::record::{FailReason, InterviewRecord, RowOutcome, RowReport, SkipReason, SENT_SENTINEL};
use crate::table::Table;

/// Result of classifying every data row of a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Rows to send, in file order
    pub pending: Vec<InterviewRecord>,
    /// Already-sent and email-less rows
    pub skipped: Vec<RowReport>,
    /// Rows missing required data
    pub rejected: Vec<RowReport>,
}

impl Selection {
    /// Skipped and rejected reports merged back into file order
    pub fn outcomes_in_row_order(&self) -> Vec<RowReport> {
        let mut reports: Vec<RowReport> = self
            .skipped
            .iter()
            .chain(self.rejected.iter())
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.row_index);
        reports
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Classify every data row as pending, skipped or rejected.
///
/// Rows are visited top to bottom; the produced work list keeps that order.
/// An unmapped field reads as an empty value.
pub fn select_pending(table: &Table, mapping: &FieldMapping) -> Selection {
    let mut selection = Selection::default();

    for (row_index, _) in table.data_rows() {
        let value = |field: Field| {
            mapping
                .index(field)
                .map(|col| table.cell(row_index, col))
                .unwrap_or("")
        };

        if mapping.get(Field::Status).is_some() && value(Field::Status) == SENT_SENTINEL {
            selection.skipped.push(RowReport::new(
                row_index,
                value(Field::Email).trim(),
                RowOutcome::Skipped(SkipReason::AlreadySent),
            ));
            continue;
        }

        let email = value(Field::Email).trim();
        if email.is_empty() {
            selection.skipped.push(RowReport::new(
                row_index,
                "",
                RowOutcome::Skipped(SkipReason::NoEmail),
            ));
            continue;
        }

        let date = value(Field::Date).trim();
        let time = value(Field::Time).trim();
        let description = value(Field::Description).trim();
        if [date, time, description].iter().any(|v| v.is_empty()) {
            selection.rejected.push(RowReport::new(
                row_index,
                email,
                RowOutcome::Failed(FailReason::MissingRequiredData),
            ));
            continue;
        }

        selection.pending.push(InterviewRecord {
            row_index,
            email: email.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            description: description.to_string(),
        });
    }

    selection
}
