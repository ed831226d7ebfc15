use super::*;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use notifier::{DeliveryError, EmailTransport, OutboundEmail};
use shared::protocol::CONTACTS_ROUTE;
use std::sync::Mutex;
use storage::NewProject;
use tower::ServiceExt;

#[derive(Default)]
struct StubMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    reject: bool,
}

#[async_trait]
impl EmailTransport for StubMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<serde_json::Value, DeliveryError> {
        self.sent.lock().expect("lock").push(email.clone());
        if self.reject {
            return Err(DeliveryError::Rejected {
                status: 403,
                body: "domain not verified".into(),
            });
        }
        Ok(serde_json::json!({ "id": format!("msg-{}", self.sent.lock().expect("lock").len()) }))
    }
}

async fn test_app(mailer: Arc<StubMailer>) -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage,
        mailer,
        notifier: NotifierConfig::default(),
        session: SessionConfig {
            admin_email: "admin@dennic.example".into(),
            admin_password: "correct horse".into(),
            secret: "route-test-secret".into(),
            ttl_seconds: 600,
        },
    };
    let app = build_router(Arc::new(AppState { api: api.clone() }));
    (app, api.storage)
}

fn json_post(uri: &str, value: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn jane() -> serde_json::Value {
    serde_json::json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "company": "",
        "message": "Hello"
    })
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app(Arc::default()).await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn preflight_returns_cors_headers_without_sending_mail() {
    let mailer = Arc::new(StubMailer::default());
    let (app, _storage) = test_app(mailer.clone()).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri(NOTIFICATION_FUNCTION_ROUTE)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-headers"],
        "authorization, x-client-info, apikey, content-type"
    );
    assert!(mailer.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn contact_submission_is_stored_then_both_emails_go_out() {
    let mailer = Arc::new(StubMailer::default());
    let (app, storage) = test_app(mailer.clone()).await;

    let response = app
        .clone()
        .oneshot(json_post(CONTACTS_ROUTE, jane()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: ContactCreated = read_json(response).await;

    let stored = storage.list_contacts(10).await.expect("list");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, created.id);
    assert_eq!(stored[0].company, None);

    let response = app
        .oneshot(json_post(NOTIFICATION_FUNCTION_ROUTE, jane()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let receipt: serde_json::Value = read_json(response).await;
    assert_eq!(receipt["success"], true);
    assert_eq!(receipt["ownerEmail"]["id"], "msg-1");
    assert_eq!(receipt["userEmail"]["id"], "msg-2");
    assert!(receipt.get("owner_email").is_none());

    let sent = mailer.sent.lock().expect("lock");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "New Contact Form Submission from Jane Doe");
    assert_eq!(sent[1].to, vec!["jane@example.com".to_string()]);
}

#[tokio::test]
async fn invalid_email_is_rejected_before_storage() {
    let (app, storage) = test_app(Arc::default()).await;
    let mut form = jane();
    form["email"] = "not-an-email".into();

    let response = app
        .oneshot(json_post(CONTACTS_ROUTE, form))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
    let fields = err.fields.expect("fields");
    assert_eq!(fields.len(), 1);
    assert_eq!(storage.count_contacts().await.expect("count"), 0);
}

#[tokio::test]
async fn notification_function_rejects_invalid_payload_with_cors() {
    let mailer = Arc::new(StubMailer::default());
    let (app, _storage) = test_app(mailer.clone()).await;
    let mut form = jane();
    form["message"] = "   ".into();

    let response = app
        .oneshot(json_post(NOTIFICATION_FUNCTION_ROUTE, form))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let failure: NotificationFailure = read_json(response).await;
    assert!(failure.error.contains("Message is required"));
    assert!(mailer.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn provider_rejection_maps_to_server_error() {
    let mailer = Arc::new(StubMailer {
        reject: true,
        ..StubMailer::default()
    });
    let (app, _storage) = test_app(mailer.clone()).await;

    let response = app
        .oneshot(json_post(NOTIFICATION_FUNCTION_ROUTE, jane()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let failure: NotificationFailure = read_json(response).await;
    assert!(failure.error.contains("owner email"));
    assert_eq!(mailer.sent.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn admin_routes_require_a_valid_session() {
    let (app, storage) = test_app(Arc::default()).await;
    storage
        .insert_contact(&shared::validation::NormalizedSubmission {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            company: None,
            message: "Hello".into(),
        })
        .await
        .expect("insert");

    let anonymous = Request::get("/admin/contacts")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(anonymous).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bad_login = json_post(
        "/auth/login",
        serde_json::json!({ "email": "admin@dennic.example", "password": "wrong" }),
    );
    let response = app.clone().oneshot(bad_login).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let login = json_post(
        "/auth/login",
        serde_json::json!({ "email": "admin@dennic.example", "password": "correct horse" }),
    );
    let response = app.clone().oneshot(login).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let login: AdminLoginResponse = read_json(response).await;

    let session = Request::get("/admin/session")
        .header("authorization", format!("Bearer {}", login.access_token))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(session).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let info: AdminSessionInfo = read_json(response).await;
    assert_eq!(info.email, "admin@dennic.example");

    let contacts = Request::get("/admin/contacts?limit=5")
        .header("authorization", format!("Bearer {}", login.access_token))
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(contacts).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let contacts: Vec<ContactSubmission> = read_json(response).await;
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Jane Doe");
}

#[tokio::test]
async fn project_routes_filter_and_hide_drafts() {
    let (app, storage) = test_app(Arc::default()).await;
    storage
        .insert_project(&NewProject {
            slug: "harbour-bridge".into(),
            title: "Harbour Bridge Retrofit".into(),
            tags: vec!["structural".into()],
            published: true,
            ..NewProject::default()
        })
        .await
        .expect("project");
    storage
        .insert_project(&NewProject {
            slug: "draft-tower".into(),
            title: "Draft Tower".into(),
            published: false,
            ..NewProject::default()
        })
        .await
        .expect("project");

    let list = Request::get("/projects?q=harbour&tag=structural")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(list).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let projects: Vec<Project> = read_json(response).await;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].slug, "harbour-bridge");

    let draft = Request::get("/projects/draft-tower")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(draft).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
