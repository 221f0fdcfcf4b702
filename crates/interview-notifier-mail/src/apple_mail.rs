//! Delivery through the desktop Mail application, scripted with `osascript`
//!
//! Message fields travel as script arguments (`on run argv`), never spliced
//! into the script text, so subjects and bodies need no AppleScript quoting.

use std::path::PathBuf;
use std::process::Command;

use interview_notifier_core::{Error, MailDispatcher, OutgoingMessage, Result};

use crate::config::MailConfig;
use crate::error::{MailError, MailResult};
use crate::message::validate_address;

const CLIENT_NAME: &str = "Mail";

const COUNT_ACCOUNTS: &str = r#"
on run argv
    tell application "Mail" to return count of accounts
end run
"#;

const LIST_ACCOUNTS: &str = r#"
on run argv
    set output to ""
    tell application "Mail"
        repeat with acct in accounts
            set output to output & (name of acct) & linefeed
        end repeat
    end tell
    return output
end run
"#;

const DRAFT_AND_DISCARD: &str = r#"
on run argv
    tell application "Mail"
        set probe to make new outgoing message with properties {subject:"probe", content:"", visible:false}
        delete probe
    end tell
    return "ok"
end run
"#;

const SEND_MESSAGE: &str = r#"
on run argv
    set theRecipient to item 1 of argv
    set theSubject to item 2 of argv
    set theBody to item 3 of argv
    tell application "Mail"
        set newMessage to make new outgoing message with properties {subject:theSubject, content:theBody, visible:false}
        if (count of argv) > 3 then set sender of newMessage to item 4 of argv
        tell newMessage
            make new to recipient at end of to recipients with properties {address:theRecipient}
        end tell
        send newMessage
    end tell
    return "sent"
end run
"#;

/// Runs AppleScript through an `osascript`-compatible program
#[derive(Debug, Clone)]
pub struct Osascript {
    program: PathBuf,
}

impl Default for Osascript {
    fn default() -> Self {
        Self {
            program: PathBuf::from("osascript"),
        }
    }
}

impl Osascript {
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `script` with `args` as its argv and return trimmed stdout
    pub fn run(&self, script: &str, args: &[&str]) -> MailResult<String> {
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MailError::NotInstalled(self.program.display().to_string())
                } else {
                    MailError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(MailError::Client {
                program: self.program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn account_count(&self) -> MailResult<usize> {
        let output = self.run(COUNT_ACCOUNTS, &[])?;
        output.parse().map_err(|_| MailError::UnexpectedOutput {
            program: self.program.display().to_string(),
            output,
        })
    }

    pub fn account_names(&self) -> MailResult<Vec<String>> {
        Ok(self
            .run(LIST_ACCOUNTS, &[])?
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Create an outgoing message and delete it again
    pub fn probe_draft(&self) -> MailResult<()> {
        self.run(DRAFT_AND_DISCARD, &[]).map(|_| ())
    }
}

/// Sends through the Mail application's default (or configured) account
#[derive(Debug, Clone)]
pub struct AppleMailDispatcher {
    script: Osascript,
    from: Option<String>,
}

impl AppleMailDispatcher {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            script: Osascript::default(),
            from: config.from.clone(),
        }
    }

    pub fn with_osascript(mut self, script: Osascript) -> Self {
        self.script = script;
        self
    }

    pub fn osascript(&self) -> &Osascript {
        &self.script
    }

    fn check_accounts(&self) -> MailResult<()> {
        let count = self.script.account_count()?;
        tracing::debug!(accounts = count, "Mail accounts configured");
        if count == 0 {
            return Err(MailError::NoAccount(CLIENT_NAME.to_string()));
        }
        Ok(())
    }

    fn deliver(&self, message: &OutgoingMessage) -> MailResult<()> {
        validate_address(&message.to)?;
        let mut args = vec![
            message.to.as_str(),
            message.subject.as_str(),
            message.body.as_str(),
        ];
        if let Some(from) = &self.from {
            args.push(from);
        }

        let output = self.script.run(SEND_MESSAGE, &args)?;
        if output != "sent" {
            return Err(MailError::UnexpectedOutput {
                program: CLIENT_NAME.to_string(),
                output,
            });
        }
        Ok(())
    }
}

impl MailDispatcher for AppleMailDispatcher {
    fn connect(&mut self) -> Result<()> {
        self.check_accounts().map_err(Error::mail_unavailable)
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        self.deliver(message).map_err(Error::send_failed)
    }
}
