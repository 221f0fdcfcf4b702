//! Notification text
//!
//! The body is plain text built by substituting `{placeholder}` tokens:
//!
//! | Token             | Value                         |
//! |-------------------|-------------------------------|
//! | `{date}`          | interview date                |
//! | `{time}`          | interview time                |
//! | `{description}`   | interview round / description |
//! | `{company_name}`  | [`TemplateConfig::company_name`] |
//! | `{hr_email}`      | [`TemplateConfig::hr_email`]  |
//! | `{hr_department}` | [`TemplateConfig::hr_department`] |
//!
//! Unknown tokens are copied through untouched.

use serde::{Deserialize, Serialize};

use crate::record::InterviewRecord;

pub const DEFAULT_SUBJECT: &str = "Interview Scheduled";
pub const DEFAULT_COMPANY_NAME: &str = "Our Company";
pub const DEFAULT_HR_EMAIL: &str = "hr@company.com";
pub const DEFAULT_HR_DEPARTMENT: &str = "Recruitment Department";

const STANDARD_BODY: &str = "Dear Candidate,

We are pleased to inform you that your interview has been scheduled with our team at {company_name}.

══════════════════════════════════════════════════════════════
                    INTERVIEW DETAILS
══════════════════════════════════════════════════════════════

📅 Date:        {date}
⏰ Time:        {time}
📝 Round:       {description}

══════════════════════════════════════════════════════════════

IMPORTANT INSTRUCTIONS:
------------------------
✓ Please join 5-10 minutes before the scheduled time
✓ Ensure you have a stable internet connection
✓ Keep your resume and relevant documents ready
✓ Prepare any questions you may have for us

If you need to reschedule or have any questions, please contact us immediately.

We look forward to speaking with you!

Best Regards,
HR Team
{hr_department}

══════════════════════════════════════════════════════════════
This is an automated notification. Please do not reply to this email.
For queries, contact: {hr_email}
══════════════════════════════════════════════════════════════
";

const SIMPLE_BODY: &str = "Dear Candidate,

Your interview has been scheduled:

Date: {date}
Time: {time}
Details: {description}

Please confirm your availability.

Thanks,
{company_name} HR Team
Contact: {hr_email}
";

/// Built-in body layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinTemplate {
    /// Bordered notice with instructions
    #[default]
    Standard,
    /// Short plain notice
    Simple,
}

impl BuiltinTemplate {
    pub fn body(self) -> &'static str {
        match self {
            BuiltinTemplate::Standard => STANDARD_BODY,
            BuiltinTemplate::Simple => SIMPLE_BODY,
        }
    }
}

/// Static values shared by every message of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub subject: String,
    pub company_name: String,
    pub hr_email: String,
    pub hr_department: String,
    pub template: BuiltinTemplate,
    /// Custom body; takes precedence over `template`
    pub body: Option<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            hr_email: DEFAULT_HR_EMAIL.to_string(),
            hr_department: DEFAULT_HR_DEPARTMENT.to_string(),
            template: BuiltinTemplate::default(),
            body: None,
        }
    }
}

impl TemplateConfig {
    /// The body text before substitution
    pub fn body_template(&self) -> &str {
        self.body
            .as_deref()
            .unwrap_or_else(|| self.template.body())
    }

    /// Subject line; the same for every row
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Render the message body for one record
pub fn format_body(record: &InterviewRecord, config: &TemplateConfig) -> String {
    render(config.body_template(), |name| match name {
        "date" => Some(record.date.as_str()),
        "time" => Some(record.time.as_str()),
        "description" => Some(record.description.as_str()),
        "company_name" => Some(config.company_name.as_str()),
        "hr_email" => Some(config.hr_email.as_str()),
        "hr_department" => Some(config.hr_department.as_str()),
        _ => None,
    })
}

fn render<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
