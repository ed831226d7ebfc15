use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::protocol::AdminSessionInfo;

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub admin_email: String,
    pub admin_password: String,
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// An authenticated admin, decoded from a bearer token for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<AdminSession> for AdminSessionInfo {
    fn from(value: AdminSession) -> Self {
        Self {
            email: value.email,
            issued_at: value.issued_at,
            expires_at: value.expires_at,
        }
    }
}

pub fn credentials_match(cfg: &SessionConfig, email: &str, password: &str) -> bool {
    !cfg.admin_password.is_empty()
        && cfg.admin_email.eq_ignore_ascii_case(email.trim())
        && cfg.admin_password == password
}

pub fn mint_session_token(
    cfg: &SessionConfig,
    email: &str,
) -> anyhow::Result<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let exp = Duration::try_seconds(cfg.ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| anyhow!("session ttl of {} seconds is out of range", cfg.ttl_seconds))?;
    let claims = Claims {
        sub: email.to_string(),
        role: ADMIN_ROLE.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )?;
    Ok((token, exp))
}

/// Returns `None` for expired, forged or non-admin tokens.
pub fn verify_session_token(cfg: &SessionConfig, token: &str) -> Option<AdminSession> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    let claims = decoded.claims;
    if claims.role != ADMIN_ROLE {
        return None;
    }
    Some(AdminSession {
        email: claims.sub,
        issued_at: Utc.timestamp_opt(claims.iat, 0).single()?,
        expires_at: Utc.timestamp_opt(claims.exp, 0).single()?,
    })
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
