use shared::{protocol::NotificationReceipt, validation::NormalizedSubmission};
use thiserror::Error;
use tracing::{error, info};

pub mod email;
pub mod transport;

pub use email::{EmailKind, OutboundEmail};
pub use transport::{CredentialSource, DeliveryError, EmailTransport, HttpEmailTransport};

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub from: String,
    pub operator_address: String,
    pub site_name: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            from: "Dennic Engineering <onboarding@resend.dev>".into(),
            operator_address: "your-email@example.com".into(),
            site_name: "Dennic Engineering".into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to send {kind}: {source}")]
pub struct NotifierError {
    pub kind: EmailKind,
    #[source]
    pub source: DeliveryError,
}

/// Sends the operator notification, then the submitter acknowledgment.
///
/// Each message is attempted at most once. The first failure ends the call,
/// so a rejected operator email means no acknowledgment is attempted.
pub async fn send_contact_emails(
    transport: &dyn EmailTransport,
    config: &NotifierConfig,
    submission: &NormalizedSubmission,
) -> Result<NotificationReceipt, NotifierError> {
    info!(
        name = %submission.name,
        email = %submission.email,
        company = ?submission.company,
        "sending contact form emails"
    );

    let owner_email = deliver(
        transport,
        EmailKind::OperatorNotification,
        &email::operator_notification(config, submission),
    )
    .await?;
    info!(response = %owner_email, "owner notification sent");

    let user_email = deliver(
        transport,
        EmailKind::SubmitterAcknowledgment,
        &email::submitter_acknowledgment(config, submission),
    )
    .await?;
    info!(response = %user_email, "user confirmation sent");

    Ok(NotificationReceipt {
        success: true,
        owner_email,
        user_email,
    })
}

async fn deliver(
    transport: &dyn EmailTransport,
    kind: EmailKind,
    message: &OutboundEmail,
) -> Result<serde_json::Value, NotifierError> {
    transport.send(message).await.map_err(|source| {
        error!(%kind, error = %source, "contact email delivery failed");
        NotifierError { kind, source }
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
