//! Header-to-field mapping
//!
//! Spreadsheets arrive with free-text headers ("Candidate Email", "Schedule
//! Date", "Hour", ...). [`map_columns`] guesses which header carries each
//! semantic [`Field`] using a fixed, per-field list of substring patterns.
//!
//! For each field the patterns are tried in priority order; for each pattern
//! the headers are scanned left to right and the first header whose
//! lowercase text contains the pattern is taken. Fields are resolved
//! independently, so one header may end up claimed by two fields (see
//! [`FieldMapping::conflicts`]).

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Semantic columns the notifier needs from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Candidate email address
    Email,
    /// Interview date
    Date,
    /// Interview time
    Time,
    /// Interview round / description
    Description,
    /// Processing status (holds the `"Sent"` sentinel)
    Status,
}

impl Field {
    /// All fields, in mapping order
    pub const ALL: [Field; 5] = [
        Field::Email,
        Field::Date,
        Field::Time,
        Field::Description,
        Field::Status,
    ];

    /// Substring patterns, highest priority first
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            Field::Email => &["email", "mail", "e-mail", "candidate", "recipient"],
            Field::Date => &["date", "day", "when", "schedule"],
            Field::Time => &["time", "hour", "timing"],
            Field::Description => &["description", "detail", "info", "note", "subject", "topic"],
            Field::Status => &["status", "sent", "state"],
        }
    }

    /// Substring that disqualifies a header for this field.
    ///
    /// Keeps "Schedule Time" out of the date slot.
    fn excluded(self) -> Option<&'static str> {
        match self {
            Field::Date => Some("time"),
            _ => None,
        }
    }

    /// Whether a row needs this field to be sendable
    pub fn is_required(self) -> bool {
        !matches!(self, Field::Status)
    }

    /// Lowercase name used on the command line and in messages
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Date => "date",
            Field::Time => "time",
            Field::Description => "description",
            Field::Status => "status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Field::Email),
            "date" => Ok(Field::Date),
            "time" => Ok(Field::Time),
            "description" => Ok(Field::Description),
            "status" => Ok(Field::Status),
            other => Err(Error::other(format!("Unknown field: {other}"))),
        }
    }
}

/// A header bound to a field: its text and its 0-based column position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub header: String,
}

/// Which column (if any) carries each [`Field`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    pub email: Option<Column>,
    pub date: Option<Column>,
    pub time: Option<Column>,
    pub description: Option<Column>,
    pub status: Option<Column>,
}

impl FieldMapping {
    /// Column bound to `field`
    pub fn get(&self, field: Field) -> Option<&Column> {
        self.slot(field).as_ref()
    }

    /// Column index bound to `field`
    pub fn index(&self, field: Field) -> Option<usize> {
        self.get(field).map(|c| c.index)
    }

    fn slot(&self, field: Field) -> &Option<Column> {
        match field {
            Field::Email => &self.email,
            Field::Date => &self.date,
            Field::Time => &self.time,
            Field::Description => &self.description,
            Field::Status => &self.status,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<Column> {
        match field {
            Field::Email => &mut self.email,
            Field::Date => &mut self.date,
            Field::Time => &mut self.time,
            Field::Description => &mut self.description,
            Field::Status => &mut self.status,
        }
    }

    /// Bind `field` to the first header named `header`
    pub fn assign<S: AsRef<str>>(&mut self, field: Field, header: &str, headers: &[S]) -> Result<()> {
        let index = headers
            .iter()
            .position(|h| h.as_ref() == header)
            .ok_or_else(|| Error::UnknownHeader {
                field,
                header: header.to_string(),
            })?;
        *self.slot_mut(field) = Some(Column {
            index,
            header: header.to_string(),
        });
        Ok(())
    }

    /// Bind `field` to an explicit column
    pub fn set(&mut self, field: Field, column: Column) {
        *self.slot_mut(field) = Some(column);
    }

    /// Leave `field` unmapped
    pub fn unassign(&mut self, field: Field) {
        *self.slot_mut(field) = None;
    }

    /// Required fields that have no column
    pub fn missing_required(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| f.is_required() && self.get(*f).is_none())
            .collect()
    }

    /// Columns claimed by more than one field, with the claiming fields
    pub fn conflicts(&self) -> Vec<(Column, Vec<Field>)> {
        let mut claims: Vec<(Column, Vec<Field>)> = Vec::new();
        for field in Field::ALL {
            let Some(column) = self.get(field) else {
                continue;
            };
            match claims.iter_mut().find(|(c, _)| c.index == column.index) {
                Some((_, fields)) => fields.push(field),
                None => claims.push((column.clone(), vec![field])),
            }
        }
        claims.retain(|(_, fields)| fields.len() > 1);
        claims
    }
}

/// Guess the column for every field from the header row
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> FieldMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.as_ref().to_lowercase()).collect();
    let mut mapping = FieldMapping::default();

    for field in Field::ALL {
        if let Some(index) = find_column(field, &lowered) {
            mapping.set(
                field,
                Column {
                    index,
                    header: headers[index].as_ref().to_string(),
                },
            );
        }
    }

    mapping
}

fn find_column(field: Field, lowered: &[String]) -> Option<usize> {
    let eligible = |header: &String| field.excluded().map_or(true, |ex| !header.contains(ex));

    field.patterns().iter().find_map(|pattern| {
        lowered
            .iter()
            .position(|header| eligible(header) && header.contains(pattern))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn header(mapping: &FieldMapping, field: Field) -> Option<&str> {
        mapping.get(field).map(|c| c.header.as_str())
    }

    #[test]
    fn test_standard_headers() {
        let headers = [
            "Candidate Email",
            "Interview Date",
            "Interview Time",
            "Interview Description",
            "Status",
        ];
        let mapping = map_columns(&headers);

        assert_eq!(header(&mapping, Field::Email), Some("Candidate Email"));
        assert_eq!(header(&mapping, Field::Date), Some("Interview Date"));
        assert_eq!(header(&mapping, Field::Time), Some("Interview Time"));
        assert_eq!(header(&mapping, Field::Description), Some("Interview Description"));
        assert_eq!(header(&mapping, Field::Status), Some("Status"));
        assert_eq!(mapping.index(Field::Status), Some(4));
    }

    #[test]
    fn test_alternate_headers() {
        let mapping = map_columns(&["Email ID", "Date", "Time", "Details", "Sent"]);
        assert_eq!(header(&mapping, Field::Email), Some("Email ID"));
        assert_eq!(header(&mapping, Field::Description), Some("Details"));
        assert_eq!(header(&mapping, Field::Status), Some("Sent"));

        let mapping = map_columns(&["Recipient", "Schedule Date", "Hour", "Interview Info", "Status"]);
        assert_eq!(header(&mapping, Field::Email), Some("Recipient"));
        assert_eq!(header(&mapping, Field::Date), Some("Schedule Date"));
        assert_eq!(header(&mapping, Field::Time), Some("Hour"));
        assert_eq!(header(&mapping, Field::Description), Some("Interview Info"));

        let mapping = map_columns(&["Candidate", "When", "Timing", "Subject", "State"]);
        assert_eq!(header(&mapping, Field::Email), Some("Candidate"));
        assert_eq!(header(&mapping, Field::Date), Some("When"));
        assert_eq!(header(&mapping, Field::Time), Some("Timing"));
        assert_eq!(header(&mapping, Field::Description), Some("Subject"));
        assert_eq!(header(&mapping, Field::Status), Some("State"));
    }

    #[test]
    fn test_pattern_priority_beats_header_order() {
        // "mail" appears in an earlier header, but "email" is the higher priority pattern
        let mapping = map_columns(&["Mailing Address", "Email"]);
        assert_eq!(header(&mapping, Field::Email), Some("Email"));
    }

    #[test]
    fn test_date_excludes_time_headers() {
        let mapping = map_columns(&["Schedule Time", "Schedule Date"]);
        assert_eq!(header(&mapping, Field::Date), Some("Schedule Date"));
        assert_eq!(header(&mapping, Field::Time), Some("Schedule Time"));

        let mapping = map_columns(&["Date and Time"]);
        assert_eq!(header(&mapping, Field::Date), None);
        assert_eq!(header(&mapping, Field::Time), Some("Date and Time"));
    }

    #[test]
    fn test_case_insensitive() {
        let mapping = map_columns(&["EMAIL", "DATE"]);
        assert_eq!(header(&mapping, Field::Email), Some("EMAIL"));
        assert_eq!(header(&mapping, Field::Date), Some("DATE"));
    }

    #[test]
    fn test_unmatched_fields_stay_unmapped() {
        let mapping = map_columns(&["Name", "Phone"]);
        assert_eq!(mapping, FieldMapping::default());
        assert_eq!(
            mapping.missing_required(),
            vec![Field::Email, Field::Date, Field::Time, Field::Description]
        );
    }

    #[test]
    fn test_duplicate_headers_first_wins() {
        let mapping = map_columns(&["Email", "Email"]);
        assert_eq!(mapping.index(Field::Email), Some(0));
    }

    #[test]
    fn test_shared_header_is_reported_as_conflict() {
        // "Sent Date" is claimed by date (pattern "date") and status (pattern "sent")
        let mapping = map_columns(&["Email", "Sent Date", "Time", "Notes"]);
        assert_eq!(header(&mapping, Field::Date), Some("Sent Date"));
        assert_eq!(header(&mapping, Field::Status), Some("Sent Date"));

        let conflicts = mapping.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0.header, "Sent Date");
        assert_eq!(conflicts[0].1, vec![Field::Date, Field::Status]);
    }

    #[test]
    fn test_assign_override() {
        let headers = ["Contact", "Day", "Slot", "Round"];
        let mut mapping = map_columns(&headers);
        assert_eq!(header(&mapping, Field::Email), None);

        mapping.assign(Field::Email, "Contact", &headers).unwrap();
        mapping.assign(Field::Time, "Slot", &headers).unwrap();
        assert_eq!(mapping.index(Field::Email), Some(0));
        assert_eq!(mapping.index(Field::Time), Some(2));

        let err = mapping.assign(Field::Description, "Missing", &headers).unwrap_err();
        assert!(matches!(err, Error::UnknownHeader { field: Field::Description, .. }));

        mapping.unassign(Field::Email);
        assert_eq!(mapping.get(Field::Email), None);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("Email".parse::<Field>().unwrap(), Field::Email);
        assert_eq!(" status ".parse::<Field>().unwrap(), Field::Status);
        assert!("phone".parse::<Field>().is_err());
    }

    proptest! {
        #[test]
        fn prop_email_header_beats_later_recipient(
            before in proptest::collection::vec("[a-z ]{0,8}", 0..4),
            between in proptest::collection::vec("[a-z ]{0,8}", 0..4),
        ) {
            let mut headers: Vec<String> = before
                .into_iter()
                .filter(|h| !h.contains("email"))
                .collect();
            let email_at = headers.len();
            headers.push("Work Email".to_string());
            headers.extend(between);
            headers.push("Recipient".to_string());

            let mapping = map_columns(&headers);
            let mapped = mapping.index(Field::Email).unwrap();
            prop_assert_eq!(mapped, email_at);
        }

        #[test]
        fn prop_date_never_contains_time(headers in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..8)) {
            let mapping = map_columns(&headers);
            if let Some(column) = mapping.get(Field::Date) {
                prop_assert!(!column.header.to_lowercase().contains("time"));
            }
        }

        #[test]
        fn prop_mapped_header_matches_index(headers in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..8)) {
            let mapping = map_columns(&headers);
            for field in Field::ALL {
                if let Some(column) = mapping.get(field) {
                    prop_assert_eq!(&headers[column.index], &column.header);
                }
            }
        }
    }
}
