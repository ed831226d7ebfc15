use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ContactId;

pub const CONTACTS_ROUTE: &str = "/rest/v1/contacts";
pub const NOTIFICATION_FUNCTION_ROUTE: &str = "/functions/v1/send-contact-email";

/// Row identity assigned by the store after a successful insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCreated {
    pub id: ContactId,
    pub created_at: DateTime<Utc>,
}

/// Successful notification function response; the nested values are the
/// email provider's own JSON replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReceipt {
    pub success: bool,
    pub owner_email: serde_json::Value,
    pub user_email: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFailure {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSessionInfo {
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactsQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}
