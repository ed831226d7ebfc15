use shared::validation::{
    validate_contact, ContactField, ContactForm, FieldErrors, NormalizedSubmission,
};
use tracing::debug;

use crate::{
    error::SubmissionError,
    submission::{ContactBackend, SubmissionClient, SubmissionOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Validating,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl FormOutcome {
    pub fn notice(self) -> Notice {
        let (title, description) = match self {
            FormOutcome::Succeeded => (
                "Message sent!",
                "We'll get back to you as soon as possible.",
            ),
            FormOutcome::PartiallySucceeded => (
                "Message saved",
                "Your message was saved but email notification failed. We'll still respond soon!",
            ),
            FormOutcome::Failed => ("Error", "Failed to send message. Please try again."),
        };
        Notice {
            outcome: self,
            title,
            description,
        }
    }
}

impl From<&SubmissionOutcome> for FormOutcome {
    fn from(value: &SubmissionOutcome) -> Self {
        match value {
            SubmissionOutcome::Stored { .. } => FormOutcome::Succeeded,
            SubmissionOutcome::StoredNotifyFailed { .. } => FormOutcome::PartiallySucceeded,
            SubmissionOutcome::NotStored { .. } => FormOutcome::Failed,
        }
    }
}

/// User-facing toast for a finished submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub outcome: FormOutcome,
    pub title: &'static str,
    pub description: &'static str,
}

/// State machine behind the contact form.
///
/// `submit` is the whole round trip. Callers that render between steps can
/// use `begin_submit` and `finish` directly; while a submission is in
/// flight the form is locked and edits are dropped.
#[derive(Debug)]
pub struct ContactFormController {
    form: ContactForm,
    errors: FieldErrors,
    phase: FormPhase,
    notice: Option<Notice>,
}

impl Default for ContactFormController {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactFormController {
    pub fn new() -> Self {
        Self {
            form: ContactForm::default(),
            errors: FieldErrors::new(),
            phase: FormPhase::Idle,
            notice: None,
        }
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: ContactField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    /// Most recent terminal notice, if any.
    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// Returns false when the edit was dropped because the form is locked.
    pub fn edit(&mut self, field: ContactField, value: impl Into<String>) -> bool {
        if self.is_locked() {
            return false;
        }
        self.form.set_field(field, value);
        self.errors.remove(&field);
        true
    }

    /// Validates the current fields. On success the form locks and the
    /// normalized record is handed back for sending; on failure the field
    /// errors are recorded and the form returns to idle.
    pub fn begin_submit(&mut self) -> Option<NormalizedSubmission> {
        if self.is_locked() {
            return None;
        }
        self.phase = FormPhase::Validating;
        match validate_contact(&self.form) {
            Ok(normalized) => {
                self.errors.clear();
                self.phase = FormPhase::Submitting;
                Some(normalized)
            }
            Err(errors) => {
                debug!(fields = errors.len(), "contact form has invalid fields");
                self.errors = errors;
                self.phase = FormPhase::Idle;
                None
            }
        }
    }

    pub fn finish(&mut self, outcome: &SubmissionOutcome) -> Notice {
        let notice = FormOutcome::from(outcome).notice();
        if notice.outcome != FormOutcome::Failed {
            self.form = ContactForm::default();
        }
        // Field errors from the store render inline like local ones.
        if let SubmissionOutcome::NotStored {
            reason: SubmissionError::Validation(fields),
        } = outcome
        {
            self.errors = fields.clone();
        }
        self.phase = FormPhase::Idle;
        self.notice = Some(notice);
        notice
    }

    /// Returns `None` when validation failed or a submission is already in
    /// flight; the field errors are then available from [`Self::errors`].
    pub async fn submit<B: ContactBackend>(
        &mut self,
        client: &SubmissionClient<B>,
    ) -> Option<Notice> {
        let submission = self.begin_submit()?;
        let outcome = client.submit(&submission).await;
        Some(self.finish(&outcome))
    }
}

#[cfg(test)]
#[path = "tests/contact_form_tests.rs"]
mod tests;
