//! RFC 5322 rendering of outgoing notifications

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};
use interview_notifier_core::OutgoingMessage;

use crate::error::{MailError, MailResult};

/// Longest run of input bytes per encoded word; keeps each word under 75 chars
const ENCODED_WORD_BYTES: usize = 45;
const BASE64_LINE: usize = 76;

/// Reject anything that could not be a single mailbox in a header
pub fn validate_address(address: &str) -> MailResult<()> {
    let valid = match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !address.chars().any(|c| c.is_whitespace() || c.is_control())
                && !address.contains(['<', '>', ',', ';', '"'])
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(MailError::InvalidAddress(address.to_string()))
    }
}

/// Render `message` as a complete RFC 5322 message with `\n` line endings
pub fn render_message(
    message: &OutgoingMessage,
    from: Option<&str>,
    date: DateTime<Local>,
) -> MailResult<String> {
    validate_address(&message.to)?;
    if let Some(from) = from {
        validate_address(from)?;
    }

    let mut out = String::new();
    if let Some(from) = from {
        out.push_str(&format!("From: {}\n", from));
    }
    out.push_str(&format!("To: {}\n", message.to));
    out.push_str(&format!("Subject: {}\n", encode_header(&message.subject)));
    out.push_str(&format!("Date: {}\n", date.to_rfc2822()));
    out.push_str("MIME-Version: 1.0\n");
    out.push_str("Content-Type: text/plain; charset=utf-8\n");

    let body = normalize_newlines(&message.body);
    if body.is_ascii() {
        out.push_str("Content-Transfer-Encoding: 7bit\n\n");
        out.push_str(&body);
    } else {
        out.push_str("Content-Transfer-Encoding: base64\n\n");
        let encoded = STANDARD.encode(body.as_bytes());
        for line in encoded.as_bytes().chunks(BASE64_LINE) {
            // base64 output is ASCII, so every chunk is valid UTF-8
            out.push_str(&String::from_utf8_lossy(line));
            out.push('\n');
        }
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Header value with line breaks flattened and non-ASCII text as RFC 2047 words
pub fn encode_header(value: &str) -> String {
    let flat: String = value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();

    if flat.is_ascii() {
        return flat;
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in flat.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

fn normalize_newlines(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n")
}
