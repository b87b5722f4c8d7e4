//! Admin Console
//!
//! Moderation of accounts and support requests. Every action is one
//! authorized call; the local lists change only after the call succeeds, and
//! a failure raises an alert instead.

mod console;

pub use console::{AdminConsole, AdminError, TicketCounts};

use async_trait::async_trait;

use crate::api::{AccessToken, ApiResult};
use crate::types::{AdminStats, ManagedUser, Message, SessionSummary, SupportRequest};

/// Backend calls used by the admin console
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn users(&self, token: &AccessToken) -> ApiResult<Vec<ManagedUser>>;

    async fn block_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()>;

    async fn unblock_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()>;

    async fn delete_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()>;

    async fn stats(&self, token: &AccessToken) -> ApiResult<AdminStats>;

    /// Every user's support requests
    async fn support_requests(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>>;

    async fn resolve_request(&self, token: &AccessToken, request_id: u64) -> ApiResult<()>;

    /// Chat sessions across all users
    async fn chat_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>>;

    async fn transcript(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>>;
}
