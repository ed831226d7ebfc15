//! Message bodies for the two contact emails.

use serde::Serialize;
use shared::validation::NormalizedSubmission;

use crate::NotifierConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    OperatorNotification,
    SubmitterAcknowledgment,
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailKind::OperatorNotification => f.write_str("owner email"),
            EmailKind::SubmitterAcknowledgment => f.write_str("user email"),
        }
    }
}

/// Provider request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

pub fn operator_notification(
    config: &NotifierConfig,
    submission: &NormalizedSubmission,
) -> OutboundEmail {
    let company_line = submission
        .company
        .as_deref()
        .map(|company| format!("<p><strong>Company:</strong> {}</p>", escape_html(company)))
        .unwrap_or_default();

    OutboundEmail {
        from: config.from.clone(),
        to: vec![config.operator_address.clone()],
        subject: format!("New Contact Form Submission from {}", submission.name),
        html: format!(
            "<h2>New Contact Form Submission</h2>\
             <p><strong>Name:</strong> {name}</p>\
             <p><strong>Email:</strong> {email}</p>\
             {company_line}\
             <p><strong>Message:</strong></p>\
             <p>{message}</p>\
             <hr>\
             <p><em>Sent via {site} contact form</em></p>",
            name = escape_html(&submission.name),
            email = escape_html(&submission.email),
            message = escape_html(&submission.message),
            site = escape_html(&config.site_name),
        ),
    }
}

pub fn submitter_acknowledgment(
    config: &NotifierConfig,
    submission: &NormalizedSubmission,
) -> OutboundEmail {
    OutboundEmail {
        from: config.from.clone(),
        to: vec![submission.email.clone()],
        subject: "We received your message!".to_string(),
        html: format!(
            "<h1>Thank you for contacting us, {name}!</h1>\
             <p>We have received your message and will get back to you as soon as possible.</p>\
             <p><strong>Your message:</strong></p>\
             <p>{message}</p>\
             <br>\
             <p>Best regards,<br>The {site} Team</p>",
            name = escape_html(&submission.name),
            message = escape_html(&submission.message),
            site = escape_html(&config.site_name),
        ),
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
