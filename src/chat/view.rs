use chrono::Utc;
use thiserror::Error;

use super::ChatApi;
use crate::api::{AccessToken, ApiError, ChatReply};
use crate::types::{ChatSession, Message, Sender, SessionId, DEFAULT_SESSION_TITLE};

/// Characters of the first reply used as a fallback title
pub const TITLE_SUMMARY_LEN: usize = 40;

/// Errors from chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("No active chat session")]
    NoActiveSession,

    #[error("Unknown chat session: {0}")]
    UnknownSession(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Session list and active-session pointer of the chat screen
#[derive(Debug, Default)]
pub struct ChatView {
    /// Newest first
    sessions: Vec<ChatSession>,
    active: Option<SessionId>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&ChatSession> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Messages of the active session
    pub fn messages(&self) -> &[Message] {
        self.active().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    pub fn get(&self, id: &SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Resolve a rendered id (as shown by `SessionId`'s `Display`)
    pub fn find(&self, rendered: &str) -> Option<&SessionId> {
        self.sessions
            .iter()
            .map(|s| &s.id)
            .find(|id| id.to_string() == rendered)
    }

    fn position(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| &s.id == id)
    }

    /// Replace the list with the server's sessions and activate the newest.
    ///
    /// Unsent temporary sessions are discarded. On failure the view is left
    /// as it was.
    pub async fn load_sessions(
        &mut self,
        api: &dyn ChatApi,
        token: &AccessToken,
    ) -> Result<(), ChatError> {
        let summaries = match api.list_sessions(token).await {
            Ok(summaries) => summaries,
            Err(e) => {
                tracing::error!(error = %e, "Failed loading sessions");
                return Err(e.into());
            }
        };

        tracing::debug!(count = summaries.len(), "Loaded chat sessions");
        self.sessions = summaries.iter().map(ChatSession::persisted).collect();
        self.active = self.sessions.first().map(|s| s.id.clone());

        if let Some(id) = self.active.clone() {
            if let Err(e) = self.load_history(api, token, &id).await {
                tracing::warn!(error = %e, session = %id, "Failed loading history");
            }
        }

        Ok(())
    }

    /// Open a new client-only session at the top of the list and activate it
    pub fn new_chat(&mut self) -> SessionId {
        let session = ChatSession::temporary();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active = Some(id.clone());
        tracing::debug!(session = %id, "Created temporary session");
        id
    }

    /// Make `id` the active session, fetching its transcript on first visit
    pub async fn select(
        &mut self,
        api: &dyn ChatApi,
        token: &AccessToken,
        id: &SessionId,
    ) -> Result<(), ChatError> {
        let loaded = self
            .get(id)
            .map(|s| s.history_loaded)
            .ok_or_else(|| ChatError::UnknownSession(id.to_string()))?;

        self.active = Some(id.clone());

        if !loaded {
            self.load_history(api, token, id).await?;
        }
        Ok(())
    }

    /// Fetch the transcript of a persisted session. Temporary sessions have
    /// nothing on the server and are left alone.
    pub async fn load_history(
        &mut self,
        api: &dyn ChatApi,
        token: &AccessToken,
        id: &SessionId,
    ) -> Result<(), ChatError> {
        let server_id = match id.server_id() {
            Some(server_id) => server_id,
            None => return Ok(()),
        };

        let messages = api.history(token, server_id).await?;

        let session = self
            .position(id)
            .and_then(|i| self.sessions.get_mut(i))
            .ok_or_else(|| ChatError::UnknownSession(id.to_string()))?;
        session.messages = messages;
        session.history_loaded = true;
        Ok(())
    }

    /// Send `text` on the active session and append the assistant's reply.
    ///
    /// The user message is appended before the request goes out and stays
    /// there if the request fails. When the active session is temporary, a
    /// successful reply promotes it to the server-issued id.
    pub async fn send_message(
        &mut self,
        api: &dyn ChatApi,
        token: &AccessToken,
        text: &str,
    ) -> Result<&Message, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let active = self.active.clone().ok_or(ChatError::NoActiveSession)?;
        let session = self
            .position(&active)
            .and_then(|i| self.sessions.get_mut(i))
            .ok_or(ChatError::NoActiveSession)?;

        session.messages.push(Message::local(Sender::User, text));
        session.last_updated = Utc::now();

        let reply = match api.send(token, text, active.server_id()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, session = %active, "Send failed");
                return Err(e.into());
            }
        };

        let id = if active.is_temporary() {
            self.promote(&active, &reply)
        } else {
            active
        };

        let session = self
            .position(&id)
            .and_then(|i| self.sessions.get_mut(i))
            .ok_or(ChatError::NoActiveSession)?;

        if session.title == DEFAULT_SESSION_TITLE {
            if let Some(title) = reply.title.as_deref().filter(|t| !t.is_empty()) {
                session.title = title.to_string();
            }
        }

        session
            .messages
            .push(Message::local(Sender::Assistant, reply.reply).with_emotion(reply.emotion));
        session.last_updated = Utc::now();

        session
            .messages
            .last()
            .ok_or(ChatError::NoActiveSession)
    }

    /// Rewrite a temporary session to the server's id in one step and move
    /// the active pointer with it. Returns the new id.
    fn promote(&mut self, temporary: &SessionId, reply: &ChatReply) -> SessionId {
        let persisted = SessionId::persisted(reply.session_id.clone());

        // The server id must resolve to exactly one session
        self.sessions.retain(|s| s.id != persisted);

        if let Some(session) = self.sessions.iter_mut().find(|s| &s.id == temporary) {
            session.id = persisted.clone();
            session.title = reply
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| summarize_title(&reply.reply));
        }

        if self.active.as_ref() == Some(temporary) {
            self.active = Some(persisted.clone());
        }

        tracing::info!(from = %temporary, to = %persisted, "Session persisted");
        persisted
    }
}

/// First `TITLE_SUMMARY_LEN` characters of `text`, with `...` when cut
pub fn summarize_title(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_SUMMARY_LEN).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
