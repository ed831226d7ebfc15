use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notifier::{CredentialSource, HttpEmailTransport, NotifierConfig};
use server_api::{
    auth::{verify_session_token, AdminSession, SessionConfig},
    ApiContext,
};
use shared::{
    domain::{ContactSubmission, Project, Service, TeamMember},
    error::{ApiError, ErrorCode},
    protocol::{
        AdminLoginRequest, AdminLoginResponse, AdminSessionInfo, ContactCreated, ContactsQuery,
        NotificationFailure, ProjectQuery, CONTACTS_ROUTE, NOTIFICATION_FUNCTION_ROUTE,
    },
    validation::{ContactForm, FieldErrors},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

const CORS_ALLOW_ORIGIN: &str = "*";
const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    settings.warn_on_weak_defaults();

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let email_api_url = Url::parse(&settings.email_api_url)
        .with_context(|| format!("invalid email API url '{}'", settings.email_api_url))?;
    let mailer = HttpEmailTransport::new(
        email_api_url,
        CredentialSource::Env(settings.email_api_key_env.clone()),
    );

    let api = ApiContext {
        storage,
        mailer: Arc::new(mailer),
        notifier: NotifierConfig {
            from: settings.email_from,
            operator_address: settings.operator_email,
            site_name: settings.site_name,
        },
        session: SessionConfig {
            admin_email: settings.admin_email,
            admin_password: settings.admin_password,
            secret: settings.session_secret,
            ttl_seconds: settings.session_ttl_seconds,
        },
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(CONTACTS_ROUTE, post(create_contact))
        .route(
            NOTIFICATION_FUNCTION_ROUTE,
            post(send_contact_email).options(contact_email_preflight),
        )
        .route("/projects", get(list_projects))
        .route("/projects/:slug", get(get_project))
        .route("/services", get(list_services))
        .route("/team", get(list_team))
        .route("/auth/login", post(admin_login))
        .route("/admin/session", get(admin_session))
        .route("/admin/contacts", get(admin_contacts))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bearer-token guard for admin routes.
struct AdminAuth(AdminSession);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| reject(ApiError::new(ErrorCode::Unauthorized, "missing bearer token")))?;

        verify_session_token(&state.api.session, token)
            .map(AdminAuth)
            .ok_or_else(|| {
                reject(ApiError::new(
                    ErrorCode::Unauthorized,
                    "session expired or invalid",
                ))
            })
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn create_contact(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<ContactCreated>), (StatusCode, Json<ApiError>)> {
    let created = server_api::create_contact(&state.api, &form)
        .await
        .map_err(|e| {
            if e.code != ErrorCode::Validation {
                error!(error = %e.message, "contact insert failed");
            }
            reject(e)
        })?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn contact_email_preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

async fn send_contact_email(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let form: ContactForm = match serde_json::from_slice(&body) {
        Ok(form) => form,
        Err(e) => {
            return function_error(StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
        }
    };

    match server_api::send_contact_notification(&state.api, &form).await {
        Ok(receipt) => (StatusCode::OK, cors_headers(), Json(receipt)).into_response(),
        Err(ApiError {
            code: ErrorCode::Validation,
            fields,
            message,
        }) => {
            let message = fields
                .as_ref()
                .map(describe_field_errors)
                .unwrap_or(message);
            function_error(StatusCode::BAD_REQUEST, message)
        }
        Err(e) => {
            error!(error = %e.message, "error in send-contact-email function");
            function_error(StatusCode::INTERNAL_SERVER_ERROR, e.message)
        }
    }
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProjectQuery>,
) -> Result<Json<Vec<Project>>, (StatusCode, Json<ApiError>)> {
    let projects = server_api::list_projects(&state.api, &q)
        .await
        .map_err(reject)?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, (StatusCode, Json<ApiError>)> {
    let project = server_api::get_project(&state.api, &slug)
        .await
        .map_err(reject)?;
    Ok(Json(project))
}

async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, (StatusCode, Json<ApiError>)> {
    let services = server_api::list_services(&state.api).await.map_err(reject)?;
    Ok(Json(services))
}

async fn list_team(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamMember>>, (StatusCode, Json<ApiError>)> {
    let team = server_api::list_team(&state.api).await.map_err(reject)?;
    Ok(Json(team))
}

async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, (StatusCode, Json<ApiError>)> {
    let login = server_api::admin_login(&state.api, &req).map_err(reject)?;
    Ok(Json(login))
}

async fn admin_session(AdminAuth(session): AdminAuth) -> Json<AdminSessionInfo> {
    Json(session.into())
}

async fn admin_contacts(
    State(state): State<Arc<AppState>>,
    AdminAuth(session): AdminAuth,
    Query(q): Query<ContactsQuery>,
) -> Result<Json<Vec<ContactSubmission>>, (StatusCode, Json<ApiError>)> {
    let contacts = server_api::list_contacts(&state.api, &session, q.limit)
        .await
        .map_err(reject)?;
    Ok(Json(contacts))
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers
}

fn function_error(status: StatusCode, error: String) -> Response {
    (status, cors_headers(), Json(NotificationFailure { error })).into_response()
}

fn describe_field_errors(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {message}", field.as_str()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
