//! End-to-end tests of the HTTP client against an in-process mock backend

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mindcare::admin::{AdminApi, AdminConsole};
use mindcare::api::{AccessToken, ApiClient, ApiError, ClientConfig};
use mindcare::auth::{AuthApi, AuthSession, CredentialStore, FileCredentialStore};
use mindcare::chat::{ChatApi, ChatView};
use mindcare::types::{RequestStatus, Role, Sender, SessionId, UserStatus};

const TOKEN: &str = "good-token";

type Sent = Arc<Mutex<Vec<Value>>>;

fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        )),
    }
}

async fn login(Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let username = form.get("username").map(String::as_str).unwrap_or("");
    let password = form.get("password").map(String::as_str).unwrap_or("");

    match (username, password) {
        ("emma@email.com", "secret1") => (
            StatusCode::OK,
            Json(json!({
                "access_token": TOKEN,
                "token_type": "bearer",
                "user": {
                    "id": 1,
                    "role": "user",
                    "username": "emma@email.com",
                    "email": "emma@email.com",
                    "first_name": "Emma",
                    "last_name": "Wilson",
                    "session_count": 3,
                    "last_login": "2024-03-01T10:00:00"
                }
            })),
        ),
        ("wrapped@email.com", _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal server error: 401: Incorrect username or password"})),
        ),
        ("wrapped-blocked@email.com", _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Internal server error: 403: Your account is blocked or inactive. Please contact support."})),
        ),
        ("blocked@email.com", _) => (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "User is blocked"})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        ),
    }
}

async fn me(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({
        "id": 1,
        "username": "emma@email.com",
        "role": {"name": "user"},
        "session_count": 4,
        "days_active": 12,
        "last_login": "2024-03-02T09:30:00",
        "user": {
            "email": "emma@email.com",
            "first_name": "Emma",
            "last_name": "Wilson",
            "phone_number": "+1 555 0100",
            "created_at": "2024-01-15T08:00:00"
        }
    })))
}

async fn sessions(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({
        "sessions": [
            {"session_id": "srv-1", "title": "Sleep trouble", "last_updated": "2024-03-02T21:15:00.123456"},
            {"session_id": "srv-2", "title": null, "last_updated": "2024-03-01 08:00:00"}
        ]
    })))
}

async fn history(
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({
        "session_id": session_id,
        "messages": [
            {"role": "user", "content": "I can't sleep", "emotion": "sad", "created_at": "2024-03-02T21:14:00"},
            {"role": "bot", "content": "That sounds hard.", "emotion": "", "created_at": "2024-03-02T21:15:00"}
        ]
    })))
}

async fn chat(
    State(sent): State<Sent>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    sent.lock().unwrap().push(body.clone());

    let text = body["user_message"].as_str().unwrap_or_default().to_string();
    let reply = match body["session_id"].as_str() {
        Some(id) => json!({"session_id": id, "reply": format!("Still here: {}", text)}),
        None => json!({
            "session_id": "srv-42",
            "reply": format!("I hear you: {}", text),
            "title": "Feeling anxious",
            "emotion": "anxious"
        }),
    };
    Ok(Json(reply))
}

async fn admin_users(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!([
        {"id": 1, "name": "Emma Wilson", "email": "emma@email.com", "status": "active", "sessions": 3, "joinedDate": "Jan 15, 2024", "lastActive": "2 hours ago"},
        {"id": 2, "name": "Lucas Chen", "email": "lucas.c@email.com", "status": "inactive", "sessions": 12}
    ])))
}

async fn block_user(
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    if user_id == 2 {
        Ok(Json(json!({"message": "User blocked"})))
    } else {
        Err((StatusCode::NOT_FOUND, Json(json!({"detail": "User not found"}))))
    }
}

async fn admin_requests(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({
        "support_requests": [
            {"id": 7, "title": "Can't log in", "description": "Locked out", "priority": "high", "status": "open", "user_id": 1},
            {"id": 8, "title": "Billing", "description": "Charged twice", "priority": "low", "status": "in_progress", "user_id": 2}
        ]
    })))
}

async fn resolve_request(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if let Err(rejection) = authorized(&headers) {
        return rejection;
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"detail": "database unavailable"})),
    )
}

async fn stats(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!({"total_users": 2, "active_sessions": 1})))
}

async fn admin_sessions(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    authorized(&headers)?;
    Ok(Json(json!([{"session_id": "srv-1", "title": "Sleep trouble", "user_id": 1}])))
}

/// Start the mock backend and return its base URL
async fn spawn_backend() -> (String, Sent) {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/api/v1/user/login", post(login))
        .route("/api/v1/user/me", get(me))
        .route("/chat/sessions", get(sessions))
        .route("/chat/history/:session_id", get(history))
        .route("/chat/", post(chat))
        .route("/api/v1/admin/users", get(admin_users))
        .route("/api/v1/admin/:user_id/block_user", patch(block_user))
        .route("/api/v1/admin/support_requests", get(admin_requests))
        .route(
            "/api/v1/admin/support_request/:request_id/mark_resolved",
            patch(resolve_request),
        )
        .route("/api/v1/admin/stats", get(stats))
        .route("/api/v1/admin/chat/sessions", get(admin_sessions))
        .with_state(Arc::clone(&sent));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), sent)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ClientConfig {
        base_url: base_url.to_string(),
        request_timeout_ms: 5_000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_login_persists_token_and_restores() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");

    let mut auth = AuthSession::new(Box::new(FileCredentialStore::new(&token_path)));
    let user = auth.login(&api, "emma@email.com", "secret1").await.unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.name, "Emma Wilson");
    assert_eq!(user.role, Role::User);

    // A fresh session picks the token up from disk and refetches the user
    let mut restored = AuthSession::new(Box::new(FileCredentialStore::new(&token_path)));
    assert!(restored.restore(&api).await);
    let user = restored.user().unwrap();
    assert_eq!(user.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(user.days_active, 12);
    assert_eq!(user.sessions_count, 4);

    restored.logout().unwrap();
    assert!(!token_path.exists());
}

#[tokio::test]
async fn test_stale_token_is_discarded_on_restore() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");

    let mut store = FileCredentialStore::new(&token_path);
    store.save(&AccessToken::new("expired")).unwrap();

    let mut auth = AuthSession::new(Box::new(store));
    assert!(!auth.restore(&api).await);
    assert!(auth.store().load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_errors_are_classified() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);

    let err = api.login("emma@email.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials(ref m) if m == "Incorrect username or password"));
    assert_eq!(err.login_message(), "Invalid email or password. Please try again.");

    let err = api.login("blocked@email.com", "secret1").await.unwrap_err();
    assert!(matches!(err, ApiError::AccountBlocked(_)));
    assert_eq!(
        err.login_message(),
        "Your account is blocked or inactive. Please contact support."
    );

    let err = api
        .current_user(&AccessToken::new("nope"))
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_login_errors_wrapped_in_500() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);

    let invalid = api.login("wrapped@email.com", "secret1").await.unwrap_err();
    assert!(matches!(invalid, ApiError::InvalidCredentials(ref m) if m == "Incorrect username or password"));

    let blocked = api
        .login("wrapped-blocked@email.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(blocked, ApiError::AccountBlocked(_)));

    assert_eq!(invalid.login_message(), "Invalid email or password. Please try again.");
    assert_ne!(invalid.login_message(), blocked.login_message());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{}", addr));
    let err = api.login("emma@email.com", "secret1").await.unwrap_err();
    assert!(matches!(err, ApiError::Unreachable));
    assert_eq!(
        err.login_message(),
        "Unable to reach MindCare. Check your connection and try again."
    );
}

#[tokio::test]
async fn test_chat_flow_promotes_new_session() {
    let (url, sent) = spawn_backend().await;
    let api = client(&url);
    let token = AccessToken::new(TOKEN);

    let mut view = ChatView::new();
    view.load_sessions(&api, &token).await.unwrap();

    // Wrapped list with naive timestamps; the first session's history is loaded
    assert_eq!(view.sessions().len(), 2);
    assert_eq!(view.sessions()[1].title, "New Conversation");
    let messages = view.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].emotion.as_deref(), Some("sad"));
    assert_eq!(messages[1].sender, Sender::Assistant);
    assert_eq!(messages[1].emotion, None);

    let temp = view.new_chat();
    let reply = view
        .send_message(&api, &token, "I feel anxious")
        .await
        .unwrap();
    assert_eq!(reply.content, "I hear you: I feel anxious");
    assert_eq!(reply.emotion.as_deref(), Some("anxious"));

    let active = view.active().unwrap();
    assert_eq!(active.id, SessionId::persisted("srv-42"));
    assert_eq!(active.title, "Feeling anxious");
    assert_eq!(active.messages.len(), 2);
    assert!(view.get(&temp).is_none());
    assert_eq!(view.sessions().len(), 3);

    view.send_message(&api, &token, "Thanks").await.unwrap();

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["session_id"], Value::Null);
    assert_eq!(sent[0]["user_message"], "I feel anxious");
    assert_eq!(sent[1]["session_id"], "srv-42");
}

#[tokio::test]
async fn test_chat_requires_token() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);

    let err = api
        .list_sessions(&AccessToken::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredentials(_)));
}

#[tokio::test]
async fn test_admin_console_against_backend() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);
    let token = AccessToken::new(TOKEN);

    let mut console = AdminConsole::new();
    console.refresh(&api, &token).await.unwrap();

    // Bare array and wrapped object decode alike
    assert_eq!(console.users().len(), 2);
    assert_eq!(console.tickets().len(), 2);
    assert_eq!(console.tickets()[1].status, RequestStatus::InProgress);
    assert_eq!(console.stats().total_users, 2);
    assert_eq!(console.stats().avg_response_time, "0s");
    assert_eq!(console.chat_sessions()[0].user_id, Some(1));

    console.block_user(&api, &token, 2).await.unwrap();
    assert_eq!(console.users()[1].status, UserStatus::Blocked);
    assert_eq!(console.users()[0].status, UserStatus::Active);

    assert!(console.block_user(&api, &token, 1).await.is_err());
    assert_eq!(console.users()[0].status, UserStatus::Active);
    assert_eq!(console.alert(), Some("Failed to block user. Please try again."));

    let err = console.resolve_request(&api, &token, 7).await.unwrap_err();
    assert!(matches!(
        err,
        mindcare::admin::AdminError::Api(ApiError::Server { status: 500, .. })
    ));
    assert_eq!(console.tickets()[0].status, RequestStatus::Open);
    assert_eq!(
        console.alert(),
        Some("Failed to mark request as resolved. Please try again.")
    );
}

#[tokio::test]
async fn test_admin_list_shapes_match() {
    let (url, _) = spawn_backend().await;
    let api = client(&url);
    let token = AccessToken::new(TOKEN);

    let wrapped = api.list_sessions(&token).await.unwrap();
    let bare = api.chat_sessions(&token).await.unwrap();
    assert_eq!(wrapped[0].session_id, bare[0].session_id);
    assert_eq!(wrapped[0].title, bare[0].title);
}
