//! In-memory backend for view tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::admin::AdminApi;
use crate::api::{AccessToken, ApiError, ApiResult, ChatReply, NewSupportRequest, ProfileUpdate};
use crate::auth::AuthApi;
use crate::chat::ChatApi;
use crate::profile::ProfileApi;
use crate::types::{
    AdminStats, ManagedUser, Message, Priority, RequestStatus, Role, Sender, SessionSummary,
    SupportRequest, User, UserStatus,
};

const TOKEN: &str = "test-token";

pub fn sample_user(email: &str) -> User {
    User {
        id: "1".to_string(),
        email: email.to_string(),
        username: email.to_string(),
        role: Role::User,
        name: "Emma Wilson".to_string(),
        phone: None,
        sessions_count: 3,
        days_active: 12,
        joined_date: Some("2024-01-15".to_string()),
        last_login: None,
    }
}

fn managed(id: u64, name: &str, email: &str) -> ManagedUser {
    ManagedUser {
        id,
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        status: UserStatus::Active,
        sessions: id * 4,
        joined_date: Some("Jan 15, 2024".to_string()),
        last_active: Some("2 hours ago".to_string()),
    }
}

fn ticket(id: u64, title: &str, status: RequestStatus) -> SupportRequest {
    SupportRequest {
        id,
        title: title.to_string(),
        description: format!("{} details", title),
        priority: Priority::Medium,
        status,
        user_id: 1,
        created_at: None,
    }
}

fn transcript(session_id: &str) -> Vec<Message> {
    vec![
        Message {
            id: format!("{}-0", session_id),
            content: "Hello".to_string(),
            sender: Sender::User,
            timestamp: Utc::now(),
            emotion: Some("neutral".to_string()),
        },
        Message {
            id: format!("{}-1", session_id),
            content: "Hi, how are you feeling?".to_string(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            emotion: None,
        },
    ]
}

#[derive(Default)]
struct State {
    fail_next: Option<ApiError>,
    fail_current_user: Option<ApiError>,
    current: Option<User>,
    registered: Vec<String>,
    sessions: Vec<String>,
    created: usize,
    titles: bool,
    sent: Vec<(String, Option<String>)>,
    history_calls: Vec<String>,
    users: Vec<ManagedUser>,
    tickets: Vec<SupportRequest>,
}

/// Fake implementation of every backend trait
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::with_sessions(&[])
    }

    /// A backend whose user already owns `sessions`, each with a two-message
    /// transcript
    pub fn with_sessions(sessions: &[&str]) -> Self {
        let state = State {
            titles: true,
            sessions: sessions.iter().map(|s| s.to_string()).collect(),
            users: vec![
                managed(1, "Emma Wilson", "emma@email.com"),
                managed(2, "Lucas Chen", "lucas.c@email.com"),
                managed(3, "Sofia Rossi", "sofia.r@email.com"),
            ],
            tickets: vec![
                ticket(1, "Login issue", RequestStatus::Open),
                ticket(2, "Billing question", RequestStatus::InProgress),
                ticket(3, "Feature request", RequestStatus::Resolved),
            ],
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn token(&self) -> AccessToken {
        AccessToken::new(TOKEN)
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Make the next `/me` fetch fail with `error`, leaving other calls alone
    pub fn fail_current_user(&self, error: ApiError) {
        self.state.lock().unwrap().fail_current_user = Some(error);
    }

    /// Reply without a session title
    pub fn omit_titles(&self) {
        self.state.lock().unwrap().titles = false;
    }

    pub fn registered(&self) -> Vec<String> {
        self.state.lock().unwrap().registered.clone()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn sent(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn history_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().history_calls.clone()
    }

    fn call<T>(&self, f: impl FnOnce(&mut State) -> ApiResult<T>) -> ApiResult<T> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        f(&mut state)
    }

    fn authorized<T>(
        &self,
        token: &AccessToken,
        f: impl FnOnce(&mut State) -> ApiResult<T>,
    ) -> ApiResult<T> {
        self.call(|state| {
            if token.as_str() != TOKEN {
                return Err(ApiError::InvalidCredentials("Could not validate credentials".into()));
            }
            f(state)
        })
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, email: &str, _password: &str) -> ApiResult<(AccessToken, User)> {
        self.call(|state| {
            let user = sample_user(email);
            state.current = Some(user.clone());
            Ok((AccessToken::new(TOKEN), user))
        })
    }

    async fn register(&self, _name: &str, email: &str, _password: &str) -> ApiResult<()> {
        self.call(|state| {
            state.registered.push(email.to_string());
            Ok(())
        })
    }

    async fn current_user(&self, token: &AccessToken) -> ApiResult<User> {
        self.authorized(token, |state| {
            if let Some(error) = state.fail_current_user.take() {
                return Err(error);
            }
            Ok(state
                .current
                .clone()
                .unwrap_or_else(|| sample_user("emma@email.com")))
        })
    }
}

#[async_trait]
impl ChatApi for FakeBackend {
    async fn list_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>> {
        self.authorized(token, |state| {
            Ok(state
                .sessions
                .iter()
                .map(|id| SessionSummary {
                    session_id: id.clone(),
                    title: Some(format!("Chat {}", id)),
                    last_updated: None,
                    user_id: Some(1),
                })
                .collect())
        })
    }

    async fn history(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>> {
        self.authorized(token, |state| {
            state.history_calls.push(session_id.to_string());
            if state.sessions.iter().any(|s| s == session_id) {
                Ok(transcript(session_id))
            } else {
                Err(ApiError::NotFound("Session not found".into()))
            }
        })
    }

    async fn send(
        &self,
        token: &AccessToken,
        text: &str,
        session_id: Option<&str>,
    ) -> ApiResult<ChatReply> {
        self.authorized(token, |state| {
            state
                .sent
                .push((text.to_string(), session_id.map(str::to_string)));

            let (session_id, title) = match session_id {
                Some(id) => (id.to_string(), None),
                None => {
                    state.created += 1;
                    let id = format!("session-{}", state.created);
                    if !state.sessions.contains(&id) {
                        state.sessions.push(id.clone());
                    }
                    let title = format!("Title {}", state.created);
                    (id, Some(title).filter(|_| state.titles))
                }
            };

            Ok(ChatReply {
                session_id,
                reply: format!("Reply to: {}", text),
                title,
                emotion: Some("neutral".to_string()),
            })
        })
    }
}

#[async_trait]
impl ProfileApi for FakeBackend {
    async fn update_profile(&self, token: &AccessToken, update: &ProfileUpdate) -> ApiResult<()> {
        self.authorized(token, |state| {
            if let Some(user) = state.current.as_mut() {
                user.name = update.full_name.clone();
                user.email = update.email.clone();
                user.phone = update.phone.clone();
            }
            Ok(())
        })
    }

    async fn change_password(
        &self,
        token: &AccessToken,
        _old_password: &str,
        _new_password: &str,
    ) -> ApiResult<()> {
        self.authorized(token, |_| Ok(()))
    }

    async fn my_tickets(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>> {
        self.authorized(token, |state| {
            Ok(state
                .tickets
                .iter()
                .filter(|t| t.user_id == 1)
                .cloned()
                .collect())
        })
    }

    async fn create_ticket(
        &self,
        token: &AccessToken,
        request: &NewSupportRequest,
    ) -> ApiResult<SupportRequest> {
        self.authorized(token, |state| {
            let created = SupportRequest {
                id: state.tickets.len() as u64 + 1,
                title: request.title.clone(),
                description: request.description.clone(),
                priority: request.priority,
                status: RequestStatus::Open,
                user_id: 1,
                created_at: None,
            };
            state.tickets.push(created.clone());
            Ok(created)
        })
    }
}

#[async_trait]
impl AdminApi for FakeBackend {
    async fn users(&self, token: &AccessToken) -> ApiResult<Vec<ManagedUser>> {
        self.authorized(token, |state| Ok(state.users.clone()))
    }

    async fn block_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        self.authorized(token, |state| set_status(state, user_id, UserStatus::Blocked))
    }

    async fn unblock_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        self.authorized(token, |state| set_status(state, user_id, UserStatus::Active))
    }

    async fn delete_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        self.authorized(token, |state| {
            let before = state.users.len();
            state.users.retain(|u| u.id != user_id);
            if state.users.len() == before {
                return Err(ApiError::NotFound("User not found".into()));
            }
            Ok(())
        })
    }

    async fn stats(&self, token: &AccessToken) -> ApiResult<AdminStats> {
        self.authorized(token, |state| {
            Ok(AdminStats {
                total_users: state.users.len() as i64,
                active_sessions: state.sessions.len() as i64,
                ..AdminStats::default()
            })
        })
    }

    async fn support_requests(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>> {
        self.authorized(token, |state| Ok(state.tickets.clone()))
    }

    async fn resolve_request(&self, token: &AccessToken, request_id: u64) -> ApiResult<()> {
        self.authorized(token, |state| {
            match state.tickets.iter_mut().find(|t| t.id == request_id) {
                Some(ticket) => {
                    ticket.status = RequestStatus::Resolved;
                    Ok(())
                }
                None => Err(ApiError::NotFound("Support request not found".into())),
            }
        })
    }

    async fn chat_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>> {
        self.list_sessions(token).await
    }

    async fn transcript(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>> {
        self.authorized(token, |state| {
            if state.sessions.iter().any(|s| s == session_id) {
                Ok(transcript(session_id))
            } else {
                Err(ApiError::NotFound("Session not found".into()))
            }
        })
    }
}

fn set_status(state: &mut State, user_id: u64, status: UserStatus) -> ApiResult<()> {
    match state.users.iter_mut().find(|u| u.id == user_id) {
        Some(user) => {
            user.status = status;
            Ok(())
        }
        None => Err(ApiError::NotFound("User not found".into())),
    }
}
