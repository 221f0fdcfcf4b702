//! A full session delivering through a stand-in sendmail program
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use interview_notifier_core::{
    FailReason, MemoryActivityLog, MemoryStore, RowOutcome, Session, SkipReason, StateWriter, Table,
};
use interview_notifier_mail::{dispatcher, MailConfig};
use pretty_assertions::assert_eq;

fn grid(rows: &[&[&str]]) -> Table {
    Table::from_grid(
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

/// Appends each message it receives to `spool`, rejecting one recipient
fn fake_sendmail(dir: &Path, spool: &Path) -> PathBuf {
    let path = dir.join("sendmail");
    let script = format!(
        "#!/bin/sh\nmsg=$(cat)\ncase \"$msg\" in\n  *'To: bounce@example.com'*) echo 'mailbox unavailable' >&2; exit 67 ;;\nesac\nprintf '%s\\n----\\n' \"$msg\" >> {}\n",
        spool.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_session_through_sendmail() {
    let dir = tempfile::tempdir().unwrap();
    let spool = dir.path().join("spool");
    let config = MailConfig {
        sendmail_path: fake_sendmail(dir.path(), &spool),
        from: Some("hr@example.com".to_string()),
        ..MailConfig::default()
    };

    let mut store = MemoryStore::new(grid(&[
        &["Candidate Email", "Interview Date", "Interview Time", "Interview Description", "Status"],
        &["a@x.com", "2025-03-01", "10:00 AM", "Technical", ""],
        &["bounce@example.com", "2025-03-02", "11:00 AM", "HR", ""],
        &["c@x.com", "2025-03-03", "2:00 PM", "Final", "Sent"],
        &["", "2025-03-04", "3:00 PM", "Extra", ""],
    ]));
    let mut session = Session::load(&mut store).unwrap();
    let mut mailer = dispatcher(&config);
    let mut log = MemoryActivityLog::new();

    let report = session.run(&mut mailer, &mut store, &mut log).unwrap();

    let outcomes: Vec<(usize, RowOutcome)> =
        report.reports.iter().map(|r| (r.row_index, r.outcome)).collect();
    assert_eq!(
        outcomes,
        vec![
            (1, RowOutcome::Sent),
            (2, RowOutcome::Failed(FailReason::SendFailed)),
            (3, RowOutcome::Skipped(SkipReason::AlreadySent)),
            (4, RowOutcome::Skipped(SkipReason::NoEmail)),
        ]
    );

    let table = store.read_table().unwrap();
    assert_eq!(table.cell(1, 4), "Sent");
    assert_eq!(table.cell(2, 4), "");

    let failed = report.failed().next().unwrap();
    assert!(failed.detail.as_deref().unwrap().contains("mailbox unavailable"));

    let spooled = std::fs::read_to_string(&spool).unwrap();
    assert_eq!(spooled.matches("----").count(), 1);
    assert!(spooled.contains("From: hr@example.com\nTo: a@x.com\n"));
    assert!(spooled.contains("Technical"));
}

#[test]
fn test_missing_program_aborts_before_any_row() {
    let mut store = MemoryStore::new(grid(&[
        &["Email", "Date", "Time", "Description", "Status"],
        &["a@x.com", "2025-03-01", "10:00", "Technical", ""],
    ]));
    let mut session = Session::load(&mut store).unwrap();
    let mut mailer = dispatcher(&MailConfig {
        sendmail_path: PathBuf::from("/nonexistent/sendmail"),
        ..MailConfig::default()
    });
    let mut log = MemoryActivityLog::new();

    assert!(session.run(&mut mailer, &mut store, &mut log).is_err());
    assert_eq!(store.persist_count(), 0);
    assert_eq!(store.read_table().unwrap().cell(1, 4), "");
}
