//! MindCare REST API Client
//!
//! HTTP client for the MindCare backend. Implements the per-view API traits
//! ([`AuthApi`], [`ChatApi`], [`ProfileApi`], [`AdminApi`]) so the views can be
//! driven by this client in production and by fakes in tests.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::dto::{
    into_messages, Ack, ChatReply, ChatRequest, CreatedSupportRequest, ListResponse, LoginForm,
    LoginResponse, NewSupportRequest, PasswordChange, ProfileUpdate, RegisterRequest, UserPayload,
    WireMessage, WireSession,
};
use super::error::{ApiError, ApiResult};
use crate::admin::AdminApi;
use crate::auth::AuthApi;
use crate::chat::ChatApi;
use crate::profile::ProfileApi;
use crate::types::{AdminStats, ManagedUser, Message, SessionSummary, SupportRequest, User};

/// Bearer token issued by the backend on login
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:8000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// MindCare REST API client
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str, token: Option<&AccessToken>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> ApiResult<T> {
        let response = self.request(Method::GET, path, Some(token)).send().await?;
        Self::decode(response).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&AccessToken>,
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path, token).json(body).send().await?;
        Self::decode(response).await
    }

    /// Send a body-less mutation and discard the acknowledgement
    async fn mutate(&self, method: Method, path: &str, token: &AccessToken) -> ApiResult<()> {
        let response = self.request(method, path, Some(token)).send().await?;
        let ack: Ack = Self::decode_or_default(response).await?;
        if let Some(message) = ack.message {
            tracing::debug!(path, message = %message, "Mutation acknowledged");
        }
        Ok(())
    }

    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_body(status, &body);
        tracing::debug!(status = status.as_u16(), error = %error, "Backend returned an error");
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like `decode`, but an empty success body yields `T::default()`
    async fn decode_or_default<T: DeserializeOwned + Default>(response: Response) -> ApiResult<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> ApiResult<Vec<T>> {
        let list: ListResponse<T> = self.get(path, token).await?;
        Ok(list.into_vec())
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> ApiResult<(AccessToken, User)> {
        let response = self
            .request(Method::POST, "/api/v1/user/login", None)
            .form(&LoginForm {
                username: email,
                password,
            })
            .send()
            .await?;

        let login: LoginResponse = Self::decode(response).await?;
        Ok((AccessToken::new(login.access_token), login.user.into_user()))
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        let _: Ack = self
            .send_json(
                Method::POST,
                "/api/v1/user/create_user",
                None,
                &RegisterRequest {
                    username: email,
                    password,
                    full_name: name,
                    role_name: "user",
                },
            )
            .await?;
        Ok(())
    }

    async fn current_user(&self, token: &AccessToken) -> ApiResult<User> {
        let payload: UserPayload = self.get("/api/v1/user/me", token).await?;
        Ok(payload.into_user())
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn list_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>> {
        let sessions: Vec<WireSession> = self.list("/chat/sessions", token).await?;
        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    async fn history(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>> {
        let path = format!("/chat/history/{}", segment(session_id));
        let wire: Vec<WireMessage> = self.list(&path, token).await?;
        Ok(into_messages(session_id, wire))
    }

    async fn send(
        &self,
        token: &AccessToken,
        text: &str,
        session_id: Option<&str>,
    ) -> ApiResult<ChatReply> {
        self.send_json(
            Method::POST,
            "/chat/",
            Some(token),
            &ChatRequest {
                user_message: text,
                session_id,
            },
        )
        .await
    }
}

#[async_trait]
impl ProfileApi for ApiClient {
    async fn update_profile(&self, token: &AccessToken, update: &ProfileUpdate) -> ApiResult<()> {
        let _: Ack = self
            .send_json(Method::PUT, "/api/v1/user/edit_profile", Some(token), update)
            .await?;
        Ok(())
    }

    async fn change_password(
        &self,
        token: &AccessToken,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let _: Ack = self
            .send_json(
                Method::POST,
                "/api/v1/user/change-password",
                Some(token),
                &PasswordChange {
                    old_password,
                    new_password,
                },
            )
            .await?;
        Ok(())
    }

    async fn my_tickets(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>> {
        self.list("/api/v1/user/support_requests", token).await
    }

    async fn create_ticket(
        &self,
        token: &AccessToken,
        request: &NewSupportRequest,
    ) -> ApiResult<SupportRequest> {
        let created: CreatedSupportRequest = self
            .send_json(Method::POST, "/api/v1/user/raise_query", Some(token), request)
            .await?;
        Ok(created.support_request)
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn users(&self, token: &AccessToken) -> ApiResult<Vec<ManagedUser>> {
        self.list("/api/v1/admin/users", token).await
    }

    async fn block_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        let path = format!("/api/v1/admin/{}/block_user", user_id);
        self.mutate(Method::PATCH, &path, token).await
    }

    async fn unblock_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        let path = format!("/api/v1/admin/{}/unblock_user", user_id);
        self.mutate(Method::PATCH, &path, token).await
    }

    async fn delete_user(&self, token: &AccessToken, user_id: u64) -> ApiResult<()> {
        let path = format!("/api/v1/admin/{}/delete_user", user_id);
        self.mutate(Method::DELETE, &path, token).await
    }

    async fn stats(&self, token: &AccessToken) -> ApiResult<AdminStats> {
        self.get("/api/v1/admin/stats", token).await
    }

    async fn support_requests(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>> {
        self.list("/api/v1/admin/support_requests", token).await
    }

    async fn resolve_request(&self, token: &AccessToken, request_id: u64) -> ApiResult<()> {
        let path = format!("/api/v1/admin/support_request/{}/mark_resolved", request_id);
        self.mutate(Method::PATCH, &path, token).await
    }

    async fn chat_sessions(&self, token: &AccessToken) -> ApiResult<Vec<SessionSummary>> {
        let sessions: Vec<WireSession> = self.list("/api/v1/admin/chat/sessions", token).await?;
        Ok(sessions.into_iter().map(SessionSummary::from).collect())
    }

    async fn transcript(&self, token: &AccessToken, session_id: &str) -> ApiResult<Vec<Message>> {
        let path = format!("/api/v1/admin/chat/messages/{}", segment(session_id));
        let wire: Vec<WireMessage> = self.list(&path, token).await?;
        Ok(into_messages(session_id, wire))
    }
}
