use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        ContactCreated, NotificationFailure, NotificationReceipt, CONTACTS_ROUTE,
        NOTIFICATION_FUNCTION_ROUTE,
    },
    validation::NormalizedSubmission,
};
use tracing::{error, info, warn};

use crate::error::{Phase, SubmissionError};

/// The two remote calls a submission makes.
#[async_trait]
pub trait ContactBackend: Send + Sync {
    /// `Ok(None)` means the store accepted the row but its receipt could
    /// not be read.
    async fn insert_contact(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<Option<ContactCreated>, SubmissionError>;

    async fn invoke_notification(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<NotificationReceipt, SubmissionError>;
}

pub struct HttpContactBackend {
    http: Client,
    server_url: String,
    api_key: Option<String>,
}

impl HttpContactBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Public key sent as both `apikey` and bearer on every call.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn post(&self, route: &str) -> RequestBuilder {
        let request = self.http.post(format!("{}{route}", self.server_url));
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ContactBackend for HttpContactBackend {
    async fn insert_contact(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<Option<ContactCreated>, SubmissionError> {
        let transport = |source| SubmissionError::Transport {
            phase: Phase::Persist,
            source,
        };
        let response = self
            .post(CONTACTS_ROUTE)
            .json(submission)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return match response.json::<ContactCreated>().await {
                Ok(created) => Ok(Some(created)),
                Err(error) => {
                    warn!(%status, %error, "store accepted contact but the receipt was unreadable");
                    Ok(None)
                }
            };
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ApiError>(&body) {
            Ok(ApiError {
                code: ErrorCode::Validation,
                fields: Some(fields),
                ..
            }) => SubmissionError::Validation(fields),
            Ok(err) => SubmissionError::Persistence(err.message),
            Err(_) => SubmissionError::Persistence(format!("status {status}: {body}")),
        })
    }

    async fn invoke_notification(
        &self,
        submission: &NormalizedSubmission,
    ) -> Result<NotificationReceipt, SubmissionError> {
        let transport = |source| SubmissionError::Transport {
            phase: Phase::Notify,
            source,
        };
        let response = self
            .post(NOTIFICATION_FUNCTION_ROUTE)
            .json(submission)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<NotificationFailure>(&body)
                .map(|failure| failure.error)
                .unwrap_or_else(|_| format!("status {status}: {body}"));
            return Err(SubmissionError::Notification(reason));
        }

        let receipt: NotificationReceipt = response.json().await.map_err(transport)?;
        if !receipt.success {
            return Err(SubmissionError::Notification(
                "function reported failure".to_string(),
            ));
        }
        Ok(receipt)
    }
}

/// Result of one submission attempt.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Stored {
        contact: Option<ContactCreated>,
    },
    StoredNotifyFailed {
        contact: Option<ContactCreated>,
        reason: SubmissionError,
    },
    NotStored {
        reason: SubmissionError,
    },
}

impl SubmissionOutcome {
    pub fn is_stored(&self) -> bool {
        !matches!(self, SubmissionOutcome::NotStored { .. })
    }
}

/// Persist, then notify. No retries; the notification is attempted only
/// once the row exists.
pub struct SubmissionClient<B> {
    backend: B,
}

impl<B: ContactBackend> SubmissionClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn submit(&self, submission: &NormalizedSubmission) -> SubmissionOutcome {
        let contact = match self.backend.insert_contact(submission).await {
            Ok(contact) => contact,
            Err(reason) => {
                error!(%reason, "error saving contact");
                return SubmissionOutcome::NotStored { reason };
            }
        };
        let contact_id = contact.as_ref().map(|created| created.id);
        info!(contact_id = ?contact_id, "contact saved");

        match self.backend.invoke_notification(submission).await {
            Ok(_) => SubmissionOutcome::Stored { contact },
            Err(reason) => {
                warn!(contact_id = ?contact_id, %reason, "email notification failed");
                SubmissionOutcome::StoredNotifyFailed { contact, reason }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
