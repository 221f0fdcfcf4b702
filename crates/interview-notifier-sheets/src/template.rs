//! Starter tables with sample rows

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};

use crate::atomic::replace_file;
use crate::error::{SheetError, SheetResult};
use crate::xlsx::{self, NewSheet};
use crate::{TableFormat, SHEET_NAME};

/// Header layout of a generated table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateLayout {
    /// Candidate Email, Interview Date, Interview Time, Interview Description, Status
    #[default]
    Standard,
    /// Email ID, Date, Time, Details, Sent
    Alternate1,
    /// Recipient, Schedule Date, Hour, Interview Info, Status
    Alternate2,
    /// Candidate, When, Timing, Subject, State
    Alternate3,
}

impl TemplateLayout {
    pub const ALL: [TemplateLayout; 4] = [
        TemplateLayout::Standard,
        TemplateLayout::Alternate1,
        TemplateLayout::Alternate2,
        TemplateLayout::Alternate3,
    ];

    pub fn headers(self) -> [&'static str; 5] {
        match self {
            TemplateLayout::Standard => [
                "Candidate Email",
                "Interview Date",
                "Interview Time",
                "Interview Description",
                "Status",
            ],
            TemplateLayout::Alternate1 => ["Email ID", "Date", "Time", "Details", "Sent"],
            TemplateLayout::Alternate2 => {
                ["Recipient", "Schedule Date", "Hour", "Interview Info", "Status"]
            }
            TemplateLayout::Alternate3 => ["Candidate", "When", "Timing", "Subject", "State"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateLayout::Standard => "standard",
            TemplateLayout::Alternate1 => "alternate1",
            TemplateLayout::Alternate2 => "alternate2",
            TemplateLayout::Alternate3 => "alternate3",
        }
    }

    /// Sample rows dated relative to `today`
    pub fn sample_rows(self, today: NaiveDate) -> Vec<Vec<String>> {
        let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
        let row = |email: &str, date: String, time: &str, description: &str| {
            vec![
                email.to_string(),
                date,
                time.to_string(),
                description.to_string(),
                String::new(),
            ]
        };

        match self {
            TemplateLayout::Standard => vec![
                row(
                    "candidate1@example.com",
                    day(3),
                    "10:00 AM",
                    "Technical Interview - Python & System Design",
                ),
                row(
                    "candidate2@example.com",
                    day(5),
                    "2:00 PM",
                    "HR Round - Cultural Fit Discussion",
                ),
                row(
                    "candidate3@example.com",
                    day(7),
                    "11:30 AM",
                    "Final Round - Meet the Team",
                ),
            ],
            _ => vec![row(
                "test@example.com",
                day(3),
                "10:00 AM",
                "Technical Interview - Python",
            )],
        }
    }
}

impl fmt::Display for TemplateLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateLayout {
    type Err = SheetError;

    fn from_str(s: &str) -> SheetResult<Self> {
        TemplateLayout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SheetError::Parse(format!("Unknown template layout '{}'", s)))
    }
}

const COLUMN_WIDTHS: [f64; 5] = [30.0, 15.0, 15.0, 50.0, 15.0];

/// Write a starter table to `path`, choosing the format from its extension
pub fn write_template<P: AsRef<Path>>(
    path: P,
    layout: TemplateLayout,
    today: NaiveDate,
) -> SheetResult<()> {
    let path = path.as_ref();
    let headers = layout.headers();
    let rows = layout.sample_rows(today);

    match TableFormat::from_path(path)? {
        TableFormat::Xlsx => xlsx::create(
            path,
            &NewSheet {
                name: SHEET_NAME,
                headers: &headers,
                rows: &rows,
                widths: &COLUMN_WIDTHS,
            },
        ),
        TableFormat::Csv { delimiter } => replace_file(path, |file: &mut File| {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(file);
            writer.write_record(headers)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
            Ok(())
        }),
    }?;

    tracing::info!(path = %path.display(), layout = %layout, "Wrote template table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_notifier_core::{map_columns, Field, StateWriter};
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_sample_dates() {
        let rows = TemplateLayout::Standard.sample_rows(today());
        let dates: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(dates, vec!["2025-01-04", "2025-01-06", "2025-01-08"]);
    }

    #[test]
    fn test_every_layout_maps_all_fields() {
        for layout in TemplateLayout::ALL {
            let mapping = map_columns(&layout.headers());
            for (i, field) in Field::ALL.into_iter().enumerate() {
                assert_eq!(mapping.index(field), Some(i), "{layout} {field}");
            }
        }
    }

    #[test]
    fn test_write_xlsx_template_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        write_template(&path, TemplateLayout::Standard, today()).unwrap();

        let mut store = crate::XlsxStore::open(&path).unwrap();
        assert_eq!(store.sheet_name(), "Interviews");
        let table = store.read_table().unwrap();
        assert_eq!(table.headers()[0], "Candidate Email");
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.cell(1, 3),
            "Technical Interview - Python & System Design"
        );
        assert_eq!(table.cell(3, 2), "11:30 AM");
    }

    #[test]
    fn test_write_tsv_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.tsv");
        write_template(&path, TemplateLayout::Alternate3, today()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Candidate\tWhen\tTiming\tSubject\tState\ntest@example.com\t2025-01-04\t10:00 AM\tTechnical Interview - Python\t\n"
        );
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("Alternate2".parse::<TemplateLayout>().unwrap(), TemplateLayout::Alternate2);
        assert!("fancy".parse::<TemplateLayout>().is_err());
    }
}
