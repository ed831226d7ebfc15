use async_trait::async_trait;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::email::OutboundEmail;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email API credential {0} is not set")]
    MissingCredential(String),
    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Where the provider bearer credential comes from. `Env` is resolved on
/// every send, so rotating the variable takes effect without a restart.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Env(String),
    Static(String),
}

impl CredentialSource {
    pub fn resolve(&self) -> Result<String, DeliveryError> {
        match self {
            CredentialSource::Env(var) => std::env::var(var)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| DeliveryError::MissingCredential(var.clone())),
            CredentialSource::Static(value) => Ok(value.clone()),
        }
    }
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends one email and returns the provider's JSON reply.
    async fn send(&self, email: &OutboundEmail) -> Result<serde_json::Value, DeliveryError>;
}

/// Transactional email API client: one JSON POST per message.
#[derive(Debug, Clone)]
pub struct HttpEmailTransport {
    http: Client,
    endpoint: Url,
    credential: CredentialSource,
}

impl HttpEmailTransport {
    pub fn new(endpoint: Url, credential: CredentialSource) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            credential,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<serde_json::Value, DeliveryError> {
        let api_key = self.credential.resolve()?;
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        debug!(subject = %email.subject, "email provider accepted message");
        Ok(body)
    }
}
