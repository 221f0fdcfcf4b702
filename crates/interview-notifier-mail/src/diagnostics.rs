//! Step-by-step readiness checks for the configured mail client

use std::fmt;

use chrono::Local;
use interview_notifier_core::OutgoingMessage;

use crate::apple_mail::Osascript;
use crate::config::{MailClient, MailConfig};
use crate::message::render_message;
use crate::sendmail::find_program;

/// Accounts listed by name before the rest are summarized
const SHOWN_ACCOUNTS: usize = 3;

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub details: Vec<String>,
    /// What the operator should do about a failure
    pub fix: Option<String>,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            details: vec![detail.into()],
            fix: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            details: vec![detail.into()],
            fix: Some(fix.into()),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "ok" } else { "FAILED" };
        write!(f, "[{}] {}", mark, self.name)?;
        for detail in &self.details {
            write!(f, "\n      {}", detail)?;
        }
        if let Some(fix) = &self.fix {
            write!(f, "\n      Fix: {}", fix)?;
        }
        Ok(())
    }
}

/// Checks run so far; stops at the first failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    pub client: MailClient,
    pub checks: Vec<Check>,
}

impl Diagnosis {
    pub fn is_ready(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }

    fn push(&mut self, check: Check) -> bool {
        let passed = check.passed;
        if passed {
            tracing::debug!(check = check.name, "Mail check passed");
        } else {
            tracing::warn!(check = check.name, details = ?check.details, "Mail check failed");
        }
        self.checks.push(check);
        passed
    }
}

/// Diagnose the client selected by `config`
pub fn diagnose(config: &MailConfig) -> Diagnosis {
    match config.client {
        MailClient::Sendmail => diagnose_sendmail(config),
        MailClient::AppleMail => diagnose_apple_mail(config, &Osascript::default()),
    }
}

pub fn diagnose_sendmail(config: &MailConfig) -> Diagnosis {
    let mut diagnosis = Diagnosis {
        client: MailClient::Sendmail,
        checks: Vec::new(),
    };

    let program = &config.sendmail_path;
    let installed = match find_program(program) {
        Some(path) => Check::pass("Mail program installed", format!("found {}", path.display())),
        None => Check::fail(
            "Mail program installed",
            format!("'{}' not found", program.display()),
            "Install sendmail or msmtp, or set mail.sendmail_path in the configuration",
        ),
    };
    if !diagnosis.push(installed) {
        return diagnosis;
    }

    let sender = match &config.from {
        Some(from) => Check::pass("Sender", format!("messages are sent as {}", from)),
        None => Check::pass("Sender", "not set; the mail program chooses the sender"),
    };
    diagnosis.push(sender);

    diagnosis.push(probe_render(config));
    diagnosis
}

pub fn diagnose_apple_mail(config: &MailConfig, script: &Osascript) -> Diagnosis {
    let mut diagnosis = Diagnosis {
        client: MailClient::AppleMail,
        checks: Vec::new(),
    };

    let reachable = match script.account_count() {
        Ok(_) => Check::pass("Mail application reachable", "osascript can drive Mail"),
        Err(e) => Check::fail(
            "Mail application reachable",
            e.to_string(),
            "Run on macOS with Mail installed and allow automation access",
        ),
    };
    if !diagnosis.push(reachable) {
        return diagnosis;
    }

    let accounts = match script.account_names() {
        Ok(names) if names.is_empty() => Check::fail(
            "Email accounts",
            "no email accounts configured in Mail",
            "Open Mail and add an email account",
        ),
        Ok(names) => {
            let mut check = Check::pass(
                "Email accounts",
                format!("{} email account(s) configured", names.len()),
            );
            check
                .details
                .extend(names.iter().take(SHOWN_ACCOUNTS).map(|n| format!("- {}", n)));
            check
        }
        Err(e) => Check::fail(
            "Email accounts",
            e.to_string(),
            "Open Mail and check its accounts",
        ),
    };
    if !diagnosis.push(accounts) {
        return diagnosis;
    }

    let draft = match script.probe_draft() {
        Ok(()) => Check::pass("Create message", "can create outgoing messages"),
        Err(e) => Check::fail(
            "Create message",
            e.to_string(),
            "Allow this terminal to control Mail in System Settings > Privacy & Security > Automation",
        ),
    };
    if !diagnosis.push(draft) {
        return diagnosis;
    }

    diagnosis.push(probe_render(config));
    diagnosis
}

fn probe_render(config: &MailConfig) -> Check {
    let probe = OutgoingMessage {
        to: "candidate@example.com".to_string(),
        subject: "Test - Connection Successful".to_string(),
        body: String::new(),
    };
    match render_message(&probe, config.from.as_deref(), Local::now()) {
        Ok(_) => Check::pass("Compose message", "test message composed"),
        Err(e) => Check::fail(
            "Compose message",
            e.to_string(),
            "Check the 'from' address in the mail configuration",
        ),
    }
}
