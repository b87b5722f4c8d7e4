//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the MindCare backend, and
//! their conversion into the domain types in [`crate::types`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Message, Priority, Role, Sender, SessionSummary, User};

// ============================================
// List responses
// ============================================

/// Response schema shared by every list endpoint.
///
/// The backend answers list calls either with a bare JSON array or with an
/// object wrapping the array under a single key (`sessions`, `messages`,
/// `support_requests`, `users` or `items`). Both decode here; callers only
/// ever receive the `Vec<T>`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

/// Object form of [`ListResponse`]
#[derive(Debug, Deserialize)]
pub struct Wrapped<T> {
    #[serde(
        alias = "sessions",
        alias = "messages",
        alias = "support_requests",
        alias = "users"
    )]
    pub items: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Bare(items) => items,
            ListResponse::Wrapped(w) => w.items,
        }
    }
}

// ============================================
// Shared field shapes
// ============================================

/// Identifier sent as either a number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdField {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for IdField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdField::Number(n) => write!(f, "{}", n),
            IdField::Text(s) => f.write_str(s),
        }
    }
}

/// Role sent as a plain name or as a `{ "name": ... }` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RoleField {
    Name(String),
    Object { name: String },
}

impl RoleField {
    pub fn role(&self) -> Role {
        match self {
            RoleField::Name(name) | RoleField::Object { name } => Role::from_name(name),
        }
    }
}

/// Parse a backend timestamp. Accepts RFC 3339 and the naive ISO form the
/// backend emits without an offset (treated as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================
// Auth
// ============================================

#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserPayload,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
    pub role_name: &'a str,
}

/// Nested profile record (`user` key of `/me`)
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// User record returned by login and `/me`.
///
/// Login puts the profile fields at the top level; `/me` nests them under
/// `user`. Nested values win when both are present.
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub id: IdField,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<RoleField>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub session_count: Option<u64>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub days_active: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user: Option<ProfilePayload>,
}

impl UserPayload {
    pub fn into_user(self) -> User {
        let profile = self.user.unwrap_or_default();
        let first = profile.first_name.or(self.first_name).unwrap_or_default();
        let last = profile.last_name.or(self.last_name).unwrap_or_default();
        let username = self.username.unwrap_or_default();
        let email = profile
            .email
            .or(self.email)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| username.clone());

        User {
            id: self.id.to_string(),
            email,
            username,
            role: self.role.map(|r| r.role()).unwrap_or_default(),
            name: format!("{} {}", first, last).trim().to_string(),
            phone: profile.phone_number,
            sessions_count: self.session_count.unwrap_or(0),
            days_active: self.days_active.unwrap_or(0),
            joined_date: profile.created_at.or(self.created_at),
            last_login: self.last_login,
        }
    }
}

// ============================================
// Profile
// ============================================

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSupportRequest {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct CreatedSupportRequest {
    #[serde(default)]
    pub message: Option<String>,
    pub support_request: crate::types::SupportRequest,
}

/// Acknowledgement body of mutation endpoints
#[derive(Debug, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================
// Chat
// ============================================

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub user_message: &'a str,
    /// `null` asks the backend to open a new session
    pub session_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireSession {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl From<WireSession> for SessionSummary {
    fn from(s: WireSession) -> Self {
        SessionSummary {
            last_updated: s.last_updated.as_deref().and_then(parse_timestamp),
            session_id: s.session_id,
            title: s.title,
            user_id: s.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub id: Option<IdField>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireMessage {
    /// Convert to a domain message. `fallback_id` is used when the server
    /// omitted one.
    pub fn into_message(self, fallback_id: String) -> Message {
        Message {
            id: self.id.map(|id| id.to_string()).unwrap_or(fallback_id),
            content: self.content,
            sender: Sender::from_role(&self.role),
            timestamp: self
                .created_at
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or_else(Utc::now),
            emotion: self.emotion.filter(|e| !e.is_empty()),
        }
    }
}

/// Convert a transcript, numbering messages that carry no id
pub fn into_messages(session_id: &str, wire: Vec<WireMessage>) -> Vec<Message> {
    wire.into_iter()
        .enumerate()
        .map(|(i, m)| m.into_message(format!("{}-{}", session_id, i)))
        .collect()
}
