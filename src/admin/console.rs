use thiserror::Error;

use super::AdminApi;
use crate::api::{AccessToken, ApiError};
use crate::types::{
    AdminStats, ManagedUser, Message, RequestStatus, SessionSummary, SupportRequest, UserStatus,
};

const BLOCK_FAILED: &str = "Failed to block user. Please try again.";
const UNBLOCK_FAILED: &str = "Failed to unblock user. Please try again.";
const DELETE_FAILED: &str = "Failed to delete user. Please try again.";
const RESOLVE_FAILED: &str = "Failed to mark request as resolved. Please try again.";
const LOAD_FAILED: &str = "Failed to load admin data.";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Support request totals by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketCounts {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

/// State of the admin dashboard
#[derive(Debug, Default)]
pub struct AdminConsole {
    users: Vec<ManagedUser>,
    tickets: Vec<SupportRequest>,
    stats: AdminStats,
    chat_sessions: Vec<SessionSummary>,
    transcript: Option<(String, Vec<Message>)>,
    alert: Option<String>,
}

impl AdminConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[ManagedUser] {
        &self.users
    }

    pub fn tickets(&self) -> &[SupportRequest] {
        &self.tickets
    }

    pub fn stats(&self) -> &AdminStats {
        &self.stats
    }

    pub fn chat_sessions(&self) -> &[SessionSummary] {
        &self.chat_sessions
    }

    /// Session id and messages of the last opened transcript
    pub fn transcript(&self) -> Option<(&str, &[Message])> {
        self.transcript
            .as_ref()
            .map(|(id, messages)| (id.as_str(), messages.as_slice()))
    }

    /// Pending alert text, if the last action failed
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn raise(&mut self, text: &str, error: &ApiError) {
        tracing::error!(error = %error, alert = text, "Admin action failed");
        self.alert = Some(text.to_string());
    }

    /// Load users, tickets, stats and chat sessions together.
    ///
    /// Nothing is replaced unless all four loads succeed.
    pub async fn refresh(&mut self, api: &dyn AdminApi, token: &AccessToken) -> Result<(), AdminError> {
        let (users, tickets, stats, sessions) = tokio::join!(
            api.users(token),
            api.support_requests(token),
            api.stats(token),
            api.chat_sessions(token),
        );

        let loaded = users.and_then(|users| Ok((users, tickets?, stats?, sessions?)));
        match loaded {
            Ok((users, tickets, stats, sessions)) => {
                tracing::debug!(
                    users = users.len(),
                    tickets = tickets.len(),
                    sessions = sessions.len(),
                    "Admin data loaded"
                );
                self.users = users;
                self.tickets = tickets;
                self.stats = stats;
                self.chat_sessions = sessions;
                self.alert = None;
                Ok(())
            }
            Err(e) => {
                self.raise(LOAD_FAILED, &e);
                Err(e.into())
            }
        }
    }

    /// Set the user's status to `blocked`
    pub async fn block_user(
        &mut self,
        api: &dyn AdminApi,
        token: &AccessToken,
        user_id: u64,
    ) -> Result<(), AdminError> {
        if let Err(e) = api.block_user(token, user_id).await {
            self.raise(BLOCK_FAILED, &e);
            return Err(e.into());
        }
        self.set_status(user_id, UserStatus::Blocked);
        Ok(())
    }

    /// Set the user's status back to `active`
    pub async fn unblock_user(
        &mut self,
        api: &dyn AdminApi,
        token: &AccessToken,
        user_id: u64,
    ) -> Result<(), AdminError> {
        if let Err(e) = api.unblock_user(token, user_id).await {
            self.raise(UNBLOCK_FAILED, &e);
            return Err(e.into());
        }
        self.set_status(user_id, UserStatus::Active);
        Ok(())
    }

    /// Remove the user from the server and from the list
    pub async fn delete_user(
        &mut self,
        api: &dyn AdminApi,
        token: &AccessToken,
        user_id: u64,
    ) -> Result<(), AdminError> {
        if let Err(e) = api.delete_user(token, user_id).await {
            self.raise(DELETE_FAILED, &e);
            return Err(e.into());
        }
        tracing::info!(user_id, "User deleted");
        self.users.retain(|u| u.id != user_id);
        Ok(())
    }

    /// Set the ticket's status to `resolved`
    pub async fn resolve_request(
        &mut self,
        api: &dyn AdminApi,
        token: &AccessToken,
        request_id: u64,
    ) -> Result<(), AdminError> {
        if let Err(e) = api.resolve_request(token, request_id).await {
            self.raise(RESOLVE_FAILED, &e);
            return Err(e.into());
        }
        tracing::info!(request_id, "Support request resolved");

        // Server accepted it; a missing local row only means the list is stale
        match self.tickets.iter_mut().find(|t| t.id == request_id) {
            Some(ticket) => ticket.status = RequestStatus::Resolved,
            None => tracing::warn!(request_id, "Resolved request not in the loaded list"),
        }
        Ok(())
    }

    /// Load one session's messages for review
    pub async fn open_transcript(
        &mut self,
        api: &dyn AdminApi,
        token: &AccessToken,
        session_id: &str,
    ) -> Result<&[Message], AdminError> {
        let messages = api.transcript(token, session_id).await?;
        let (_, messages) = self
            .transcript
            .insert((session_id.to_string(), messages));
        Ok(messages.as_slice())
    }

    /// Users whose name or email contains `query`, ignoring case
    pub fn filtered_users(&self, query: &str) -> Vec<&ManagedUser> {
        let query = query.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                query.is_empty()
                    || u.name.to_lowercase().contains(&query)
                    || u.email.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn ticket_counts(&self) -> TicketCounts {
        self.tickets
            .iter()
            .fold(TicketCounts::default(), |mut counts, t| {
                match t.status {
                    RequestStatus::Open => counts.open += 1,
                    RequestStatus::InProgress => counts.in_progress += 1,
                    RequestStatus::Resolved => counts.resolved += 1,
                }
                counts
            })
    }

    fn set_status(&mut self, user_id: u64, status: UserStatus) {
        tracing::info!(user_id, status = %status, "User status changed");
        match self.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => user.status = status,
            None => tracing::warn!(user_id, "Changed user not in the loaded list"),
        }
    }
}
