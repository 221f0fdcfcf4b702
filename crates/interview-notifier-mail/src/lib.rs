//! # interview-notifier-mail
//!
//! [`MailDispatcher`] implementations for interview-notifier.
//!
//! - [`SendmailDispatcher`] - pipes RFC 5322 messages into `sendmail -t -i`
//!   or any compatible program (msmtp, ssmtp, ...)
//! - [`AppleMailDispatcher`] - drives the desktop Mail application
//! - [`diagnose`] - the checks behind `notify-interviews doctor`

mod apple_mail;
mod config;
mod diagnostics;
mod error;
mod message;
mod sendmail;

use interview_notifier_core::MailDispatcher;

pub use apple_mail::{AppleMailDispatcher, Osascript};
pub use config::{MailClient, MailConfig};
pub use diagnostics::{diagnose, diagnose_apple_mail, diagnose_sendmail, Check, Diagnosis};
pub use error::{MailError, MailResult};
pub use message::{encode_header, render_message, validate_address};
pub use sendmail::{find_program, SendmailDispatcher};

/// Build the dispatcher selected by `config`
pub fn dispatcher(config: &MailConfig) -> Box<dyn MailDispatcher> {
    match config.client {
        MailClient::Sendmail => Box::new(SendmailDispatcher::new(config)),
        MailClient::AppleMail => Box::new(AppleMailDispatcher::new(config)),
    }
}
