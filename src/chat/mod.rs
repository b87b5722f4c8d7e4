//! Chat View
//!
//! Chat sessions and their messages, plus the reconciliation of temporary
//! sessions with the ids the server issues for them.
//!
//! ## Session lifecycle
//!
//! 1. `new_chat` creates a `Temporary` session and makes it active
//! 2. The first successful `send_message` on it sends `session_id = null`
//! 3. The reply carries the server id; the session is rewritten in place to
//!    `Persisted` and the active pointer follows it
//!
//! A failed send keeps the optimistic user message and changes no identity.

mod view;

pub use view::{summarize_title, ChatError, ChatView, TITLE_SUMMARY_LEN};

use async_trait::async_trait;

use crate::api::{AccessToken, ApiResult, ChatReply};
use crate::types::{Message, SessionSummary};

/// Backend calls used by the chat view
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sessions owned by the signed-in user
    async fn list_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>>;

    /// Transcript of a persisted session
    async fn history(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>>;

    /// Send a message. `None` asks the server to open a new session.
    async fn send(
        &self,
        token: &AccessToken,
        text: &str,
        session_id: Option<&str>,
    ) -> ApiResult<ChatReply>;
}
