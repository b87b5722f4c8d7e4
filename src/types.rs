//! Core data types for the MindCare client
//!
//! This module defines the domain types shared by every view:
//! - `User` and `Role`: the signed-in account
//! - `SessionId`, `ChatSession` and `Message`: chat state
//! - `SupportRequest`, `Priority` and `RequestStatus`: support tickets
//! - `ManagedUser`, `UserStatus`, `AdminStats` and `SessionSummary`: admin console records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Title given to chat sessions the server has not named yet
pub const DEFAULT_SESSION_TITLE: &str = "New Conversation";

/// Prefix used when rendering temporary session ids
pub const TEMP_SESSION_PREFIX: &str = "temp-";

// ============================================
// Users
// ============================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Normalize a raw server role name. Anything mentioning "admin" is an admin.
    pub fn from_name(name: &str) -> Self {
        if name.to_lowercase().contains("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user
///
/// Owned by the auth session. Replaced wholesale on login or refresh and
/// cleared on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    /// Display name, `first_name last_name` trimmed
    pub name: String,
    pub phone: Option<String>,
    /// Number of logins recorded by the server
    pub sessions_count: u64,
    pub days_active: u64,
    pub joined_date: Option<String>,
    pub last_login: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name to show in headers, falling back to the email when no name is set
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

// ============================================
// Chat
// ============================================

/// Identity of a chat session
///
/// A session starts `Temporary` with a client-generated id and becomes
/// `Persisted` once the server has issued an id for it. Whether a session is
/// temporary is read off the variant, so the flag and the id cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionId {
    Temporary(Uuid),
    Persisted(String),
}

impl SessionId {
    /// Generate a fresh temporary id
    pub fn temporary() -> Self {
        SessionId::Temporary(Uuid::new_v4())
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        SessionId::Persisted(id.into())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, SessionId::Temporary(_))
    }

    /// The id to send to the server. Temporary sessions have none.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            SessionId::Temporary(_) => None,
            SessionId::Persisted(id) => Some(id),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Temporary(uuid) => write!(f, "{}{}", TEMP_SESSION_PREFIX, uuid),
            SessionId::Persisted(id) => f.write_str(id),
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Map the wire role (`user` / `bot`) to a sender
    pub fn from_role(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            Sender::User
        } else {
            Sender::Assistant
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub emotion: Option<String>,
}

impl Message {
    /// A message authored locally, stamped now
    pub fn local(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", Uuid::new_v4()),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            emotion: None,
        }
    }

    /// Builder method: attach an emotion tag
    pub fn with_emotion(mut self, emotion: Option<String>) -> Self {
        self.emotion = emotion;
        self
    }
}

/// A chat session held by the chat view
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    /// Ordered, append-only
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
    /// Whether the transcript has been fetched from the server
    pub history_loaded: bool,
}

impl ChatSession {
    /// A new client-only session
    pub fn temporary() -> Self {
        Self {
            id: SessionId::temporary(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
            // Nothing on the server to fetch
            history_loaded: true,
        }
    }

    /// A session known to the server, messages not yet loaded
    pub fn persisted(summary: &SessionSummary) -> Self {
        Self {
            id: SessionId::persisted(summary.session_id.clone()),
            title: summary
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            messages: Vec::new(),
            last_updated: summary.last_updated.unwrap_or_else(Utc::now),
            history_loaded: false,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }
}

/// Server-side listing entry for a chat session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Owner, present on admin listings
    pub user_id: Option<u64>,
}

// ============================================
// Support requests
// ============================================

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// Ticket status: open -> in-progress -> resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RequestStatus {
    #[default]
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "in-progress", alias = "in_progress")]
    InProgress,
    #[serde(rename = "resolved", alias = "closed")]
    Resolved,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-submitted support ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRequest {
    pub id: u64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: RequestStatus,
    /// Owner reference
    pub user_id: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================
// Admin console records
// ============================================

/// Account status as seen by moderators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
            UserStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account row in the admin console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub sessions: u64,
    #[serde(default, rename = "joinedDate")]
    pub joined_date: Option<String>,
    #[serde(default, rename = "lastActive")]
    pub last_active: Option<String>,
}

/// Dashboard counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub active_sessions: i64,
    #[serde(default = "default_response_time")]
    pub avg_response_time: String,
    #[serde(default = "default_satisfaction")]
    pub user_satisfaction: String,
}

fn default_response_time() -> String {
    "0s".to_string()
}

fn default_satisfaction() -> String {
    "0%".to_string()
}

impl Default for AdminStats {
    fn default() -> Self {
        Self {
            total_users: 0,
            active_sessions: 0,
            avg_response_time: default_response_time(),
            user_satisfaction: default_satisfaction(),
        }
    }
}
