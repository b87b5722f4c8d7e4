//! MindCare REST API
//!
//! Typed client for the MindCare backend.
//!
//! # Endpoints
//!
//! ## User
//! - `POST /api/v1/user/login` - Form login, returns a bearer token
//! - `POST /api/v1/user/create_user` - Register an account
//! - `GET /api/v1/user/me` - Current user
//! - `PUT /api/v1/user/edit_profile` - Edit profile fields
//! - `POST /api/v1/user/change-password` - Change password
//! - `GET /api/v1/user/support_requests` - Own support tickets
//! - `POST /api/v1/user/raise_query` - Open a support ticket
//!
//! ## Chat
//! - `GET /chat/sessions` - Session list
//! - `GET /chat/history/{session_id}` - Transcript
//! - `POST /chat/` - Send a message (null `session_id` opens a new session)
//!
//! ## Admin
//! - `GET /api/v1/admin/users` - Accounts
//! - `PATCH /api/v1/admin/{id}/block_user` and `unblock_user`
//! - `DELETE /api/v1/admin/{id}/delete_user`
//! - `GET /api/v1/admin/stats` - Dashboard counters
//! - `GET /api/v1/admin/support_requests` - All tickets
//! - `PATCH /api/v1/admin/support_request/{id}/mark_resolved`
//! - `GET /api/v1/admin/chat/sessions` - All chat sessions
//! - `GET /api/v1/admin/chat/messages/{session_id}` - Any transcript
//!
//! List endpoints may return either a bare array or an object wrapping it;
//! [`dto::ListResponse`] absorbs both.

pub mod client;
pub mod dto;
pub mod error;

pub use client::{AccessToken, ApiClient, ClientConfig};
pub use dto::{ChatReply, ListResponse, NewSupportRequest, ProfileUpdate};
pub use error::{ApiError, ApiResult};
