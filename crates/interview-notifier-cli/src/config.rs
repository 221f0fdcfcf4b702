//! JSON configuration file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use interview_notifier::{MailConfig, PersistOrder, RunOptions, TemplateConfig, DEFAULT_LOG_FILE};
use serde::Deserialize;

/// Everything a run can be configured with; every field is optional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub template: TemplateConfig,
    /// Read the body from this file; relative paths resolve against the
    /// configuration file
    pub body_file: Option<PathBuf>,
    pub mail: MailConfig,
    pub log_file: PathBuf,
    pub persist_order: PersistOrder,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            template: TemplateConfig::default(),
            body_file: None,
            mail: MailConfig::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            persist_order: PersistOrder::default(),
        }
    }
}

impl AppConfig {
    /// Load `path`, or the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;

        if let Some(body_file) = config.body_file.take() {
            let body_path = match path.parent() {
                Some(dir) if body_file.is_relative() => dir.join(&body_file),
                _ => body_file,
            };
            let body = std::fs::read_to_string(&body_path)
                .with_context(|| format!("Failed to read body file '{}'", body_path.display()))?;
            config.template.body = Some(body);
        }

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            template: self.template.clone(),
            persist_order: self.persist_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_notifier::{BuiltinTemplate, MailClient};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_file_gives_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_file, PathBuf::from("email_notifications.log"));
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.txt"), "Hello {date}").unwrap();
        let path = dir.path().join("notifier.json");
        std::fs::write(
            &path,
            r#"{
                "subject": "Your interview",
                "company_name": "Acme",
                "template": "simple",
                "body_file": "body.txt",
                "mail": {"client": "apple-mail"},
                "log_file": "runs.log",
                "persist_order": "mark-then-send"
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.template.subject, "Your interview");
        assert_eq!(config.template.company_name, "Acme");
        assert_eq!(config.template.hr_email, "hr@company.com");
        assert_eq!(config.template.template, BuiltinTemplate::Simple);
        assert_eq!(config.template.body.as_deref(), Some("Hello {date}"));
        assert_eq!(config.mail.client, MailClient::AppleMail);
        assert_eq!(config.log_file, PathBuf::from("runs.log"));
        assert_eq!(config.run_options().persist_order, PersistOrder::MarkThenSend);
    }

    #[test]
    fn test_missing_body_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifier.json");
        std::fs::write(&path, r#"{"body_file": "nope.txt"}"#).unwrap();

        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("nope.txt"));
    }

    #[test]
    fn test_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifier.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
