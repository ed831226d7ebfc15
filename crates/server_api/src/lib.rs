use std::sync::Arc;

use notifier::{EmailTransport, NotifierConfig};
use shared::{
    domain::{ContactSubmission, Project, Service, TeamMember},
    error::{ApiError, ErrorCode},
    protocol::{
        AdminLoginRequest, AdminLoginResponse, ContactCreated, NotificationReceipt, ProjectQuery,
    },
    validation::{validate_contact, ContactForm},
};
use storage::Storage;
use tracing::{info, warn};

pub mod auth;

use auth::{credentials_match, mint_session_token, AdminSession, SessionConfig};

pub const DEFAULT_CONTACTS_LIMIT: u32 = 50;
pub const MAX_CONTACTS_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub mailer: Arc<dyn EmailTransport>,
    pub notifier: NotifierConfig,
    pub session: SessionConfig,
}

/// Store write for one submission. Input is re-validated here so nothing
/// unvalidated reaches the table.
pub async fn create_contact(ctx: &ApiContext, form: &ContactForm) -> Result<ContactCreated, ApiError> {
    let normalized = validate_contact(form).map_err(ApiError::invalid_fields)?;
    let stored = ctx
        .storage
        .insert_contact(&normalized)
        .await
        .map_err(internal)?;
    info!(contact_id = %stored.id, "contact submission persisted");
    Ok(ContactCreated {
        id: stored.id,
        created_at: stored.created_at,
    })
}

/// Notification function body: both emails or an upstream error.
pub async fn send_contact_notification(
    ctx: &ApiContext,
    form: &ContactForm,
) -> Result<NotificationReceipt, ApiError> {
    let normalized = validate_contact(form).map_err(ApiError::invalid_fields)?;
    notifier::send_contact_emails(ctx.mailer.as_ref(), &ctx.notifier, &normalized)
        .await
        .map_err(|e| ApiError::new(ErrorCode::Upstream, e.to_string()))
}

pub async fn list_projects(ctx: &ApiContext, query: &ProjectQuery) -> Result<Vec<Project>, ApiError> {
    let projects = ctx
        .storage
        .list_published_projects()
        .await
        .map_err(internal)?;
    let term = query.q.as_deref().unwrap_or_default();
    let tag = query
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty());
    Ok(projects
        .into_iter()
        .filter(|project| project.matches_search(term))
        .filter(|project| tag.map_or(true, |tag| project.has_tag(tag)))
        .collect())
}

pub async fn get_project(ctx: &ApiContext, slug: &str) -> Result<Project, ApiError> {
    ctx.storage
        .project_by_slug(slug)
        .await
        .map_err(internal)?
        .filter(|project| project.published)
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "project not found"))
}

pub async fn list_services(ctx: &ApiContext) -> Result<Vec<Service>, ApiError> {
    ctx.storage.list_services().await.map_err(internal)
}

pub async fn list_team(ctx: &ApiContext) -> Result<Vec<TeamMember>, ApiError> {
    ctx.storage.list_team().await.map_err(internal)
}

pub fn admin_login(ctx: &ApiContext, req: &AdminLoginRequest) -> Result<AdminLoginResponse, ApiError> {
    if !credentials_match(&ctx.session, &req.email, &req.password) {
        warn!(email = %req.email, "rejected admin sign-in");
        return Err(ApiError::new(ErrorCode::Unauthorized, "invalid credentials"));
    }
    let (access_token, expires_at) = mint_session_token(&ctx.session, &ctx.session.admin_email)
        .map_err(|e| ApiError::new(ErrorCode::Internal, format!("token mint failed: {e}")))?;
    info!(email = %ctx.session.admin_email, "admin signed in");
    Ok(AdminLoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_at,
    })
}

pub async fn list_contacts(
    ctx: &ApiContext,
    session: &AdminSession,
    limit: Option<u32>,
) -> Result<Vec<ContactSubmission>, ApiError> {
    let limit = limit
        .unwrap_or(DEFAULT_CONTACTS_LIMIT)
        .clamp(1, MAX_CONTACTS_LIMIT);
    info!(admin = %session.email, limit, "listing contact submissions");
    ctx.storage.list_contacts(limit).await.map_err(internal)
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
