use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{ContactId, ContactSubmission},
    protocol::{ContactCreated, NotificationReceipt},
    validation::{validate_contact, ContactForm, NormalizedSubmission},
};

use crate::{error::SubmissionError, submission::ContactBackend};

/// Store and notification function in one process. Inserts are validated
/// the same way the server validates them.
#[derive(Default)]
pub(crate) struct InMemoryBackend {
    pub(crate) rows: Mutex<Vec<ContactSubmission>>,
    pub(crate) notified: Mutex<Vec<NormalizedSubmission>>,
    pub(crate) fail_insert: bool,
    pub(crate) fail_notify: bool,
}

impl InMemoryBackend {
    pub(crate) fn failing_insert() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_notify() -> Self {
        Self {
            fail_notify: true,
            ..Self::default()
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.lock().expect("lock").len()
    }

    pub(crate) fn notify_count(&self) -> usize {
        self.notified.lock().expect("lock").len()
    }
}

#[async_trait]
impl ContactBackend for InMemoryBackend {
    async fn insert_contact(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<Option<ContactCreated>, SubmissionError> {
        if self.fail_insert {
            return Err(SubmissionError::Persistence("store unavailable".into()));
        }
        let normalized = validate_contact(&ContactForm::from(submission.clone()))
            .map_err(SubmissionError::Validation)?;
        let row = ContactSubmission {
            id: ContactId::new_v4(),
            name: normalized.name,
            email: normalized.email,
            company: normalized.company,
            message: normalized.message,
            created_at: Utc::now(),
        };
        let created = ContactCreated {
            id: row.id,
            created_at: row.created_at,
        };
        self.rows.lock().expect("lock").push(row);
        Ok(Some(created))
    }

    async fn invoke_notification(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<NotificationReceipt, SubmissionError> {
        if self.fail_notify {
            return Err(SubmissionError::Notification(
                "failed to send owner email".into(),
            ));
        }
        self.notified.lock().expect("lock").push(submission.clone());
        Ok(NotificationReceipt {
            success: true,
            owner_email: serde_json::json!({ "id": "owner" }),
            user_email: serde_json::json!({ "id": "user" }),
        })
    }
}
