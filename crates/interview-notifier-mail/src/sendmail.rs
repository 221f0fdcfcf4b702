//! Delivery through a sendmail-compatible program

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Local;
use interview_notifier_core::{Error, MailDispatcher, OutgoingMessage, Result};

use crate::config::MailConfig;
use crate::error::{MailError, MailResult};
use crate::message::render_message;

/// Directories sendmail usually lives in even when they are not on `PATH`
const SYSTEM_DIRS: [&str; 3] = ["/usr/sbin", "/usr/lib", "/usr/local/sbin"];

/// Pipes each message into `sendmail -t -i` (or a configured replacement)
#[derive(Debug, Clone)]
pub struct SendmailDispatcher {
    program: PathBuf,
    args: Vec<String>,
    from: Option<String>,
    resolved: Option<PathBuf>,
}

impl SendmailDispatcher {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            program: config.sendmail_path.clone(),
            args: config.sendmail_args.clone(),
            from: config.from.clone(),
            resolved: None,
        }
    }

    /// Configured program name or path
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Locate the program, caching the result
    pub fn locate(&mut self) -> MailResult<&Path> {
        if self.resolved.is_none() {
            let found = find_program(&self.program)
                .ok_or_else(|| MailError::NotInstalled(self.program.display().to_string()))?;
            tracing::debug!(program = %found.display(), "Found sendmail program");
            self.resolved = Some(found);
        }
        match &self.resolved {
            Some(path) => Ok(path),
            None => Err(MailError::NotInstalled(self.program.display().to_string())),
        }
    }

    /// Render and pipe one message, waiting for the program to exit
    pub fn deliver(&mut self, message: &OutgoingMessage) -> MailResult<()> {
        let text = render_message(message, self.from.as_deref(), Local::now())?;
        let program = self.locate()?.to_path_buf();

        let mut child = Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MailError::NotInstalled(program.display().to_string())
                } else {
                    MailError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(MailError::Client {
                program: program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!(to = %message.to, "Handed message to sendmail");
        Ok(())
    }
}

impl MailDispatcher for SendmailDispatcher {
    fn connect(&mut self) -> Result<()> {
        self.locate().map(|_| ()).map_err(Error::mail_unavailable)
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        self.deliver(message).map_err(Error::send_failed)
    }
}

/// Resolve `program` to an existing file: paths are taken as given, bare
/// names are searched on `PATH` and then in the usual system directories
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }

    let path_var = std::env::var_os("PATH").unwrap_or_else(OsString::new);
    std::env::split_paths(&path_var)
        .chain(SYSTEM_DIRS.iter().map(PathBuf::from))
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            to: "a@x.com".to_string(),
            subject: "Interview Invitation".to_string(),
            body: "Dear Candidate,\n".to_string(),
        }
    }

    #[test]
    fn test_pipes_message_to_program() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("captured.eml");
        let program = script(dir.path(), "fake-sendmail", "cat > \"$2\"");

        let mut dispatcher = SendmailDispatcher::new(&MailConfig {
            sendmail_path: program,
            sendmail_args: vec!["-t".to_string(), out.display().to_string()],
            from: Some("hr@example.com".to_string()),
            ..MailConfig::default()
        });
        dispatcher.connect().unwrap();
        dispatcher.send(&message()).unwrap();

        let captured = std::fs::read_to_string(&out).unwrap();
        assert!(captured.starts_with("From: hr@example.com\nTo: a@x.com\n"));
        assert!(captured.ends_with("\n\nDear Candidate,\n"));
    }

    #[test]
    fn test_missing_program_fails_connect() {
        let mut dispatcher = SendmailDispatcher::new(&MailConfig {
            sendmail_path: PathBuf::from("/nonexistent/dir/sendmail"),
            ..MailConfig::default()
        });
        let err = dispatcher.connect().unwrap_err();
        assert!(matches!(err, Error::MailUnavailable(_)));
    }

    #[test]
    fn test_non_zero_exit_is_send_failure() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "failing", "cat > /dev/null; echo 'relay denied' >&2; exit 75");

        let mut dispatcher = SendmailDispatcher::new(&MailConfig {
            sendmail_path: program,
            ..MailConfig::default()
        });
        dispatcher.connect().unwrap();

        let err = dispatcher.deliver(&message()).unwrap_err();
        match err {
            MailError::Client { stderr, .. } => assert_eq!(stderr, "relay denied"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(dispatcher.send(&message()), Err(Error::SendFailed(_))));
    }

    #[test]
    fn test_invalid_recipient_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let program = script(dir.path(), "marker", &format!("touch {}", marker.display()));

        let mut dispatcher = SendmailDispatcher::new(&MailConfig {
            sendmail_path: program,
            ..MailConfig::default()
        });
        let mut bad = message();
        bad.to = "a@x.com\nBcc: b@y.com".to_string();
        assert!(dispatcher.send(&bad).is_err());
        assert!(!marker.exists());
    }

    #[test]
    fn test_find_program_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(dir.path(), "tool", "true");
        assert_eq!(find_program(&program), Some(program.clone()));
        assert_eq!(find_program(&dir.path().join("missing")), None);
    }
}
