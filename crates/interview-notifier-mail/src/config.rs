//! Mail client configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which installed client hands messages over for delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailClient {
    /// A sendmail-compatible program (sendmail, msmtp, ssmtp, ...)
    #[default]
    Sendmail,
    /// The desktop Mail application, driven through `osascript`
    AppleMail,
}

/// Settings for the mail adapters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub client: MailClient,
    /// Program to pipe messages into; bare names are looked up on `PATH`
    pub sendmail_path: PathBuf,
    pub sendmail_args: Vec<String>,
    /// `From` header; when unset the client picks its default account
    pub from: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            client: MailClient::Sendmail,
            sendmail_path: PathBuf::from("sendmail"),
            sendmail_args: vec!["-t".to_string(), "-i".to_string()],
            from: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MailConfig =
            serde_json::from_str(r#"{"client": "apple-mail", "from": "hr@example.com"}"#).unwrap();
        assert_eq!(config.client, MailClient::AppleMail);
        assert_eq!(config.from.as_deref(), Some("hr@example.com"));
        assert_eq!(config.sendmail_path, PathBuf::from("sendmail"));
        assert_eq!(config.sendmail_args, vec!["-t", "-i"]);
    }

    #[test]
    fn test_unknown_client_rejected() {
        assert!(serde_json::from_str::<MailConfig>(r#"{"client": "outlook"}"#).is_err());
    }
}
