//! # MindCare
//!
//! Client for the MindCare mental-health support platform: users chat with
//! an assistant and raise support requests, admins moderate accounts and
//! tickets.
//!
//! ## Modules
//!
//! - [`api`]: typed REST client and wire formats
//! - [`auth`]: sign-in state and credential storage
//! - [`chat`]: chat sessions, including promotion of temporary sessions
//! - [`profile`]: account details and the user's own tickets
//! - [`admin`]: moderation console
//! - [`app`]: page routing by role
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mindcare::api::{ApiClient, ClientConfig};
//! use mindcare::auth::{AuthSession, MemoryCredentialStore};
//! use mindcare::chat::ChatView;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientConfig::default())?;
//!     let mut auth = AuthSession::new(Box::new(MemoryCredentialStore::new()));
//!     auth.login(&client, "emma@email.com", "secret1").await?;
//!
//!     let token = auth.token()?.clone();
//!     let mut chat = ChatView::new();
//!     chat.new_chat();
//!     let reply = chat.send_message(&client, &token, "I feel anxious today").await?;
//!     println!("{}", reply.content);
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod profile;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{AccessToken, ApiClient, ApiError, ApiResult, ClientConfig};
pub use auth::AuthSession;
pub use config::Config;
pub use types::*;
