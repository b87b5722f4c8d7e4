//! Authentication
//!
//! Sign-in state for the client:
//!
//! - **AuthApi**: backend calls for login, registration and the current user
//! - **AuthSession**: owns the bearer token and the current user, and hands
//!   the token to the other views explicitly
//! - **CredentialStore**: where the token is kept between runs

mod credentials;
mod session;

pub use credentials::{
    default_token_path, CredentialError, CredentialStore, FileCredentialStore,
    MemoryCredentialStore,
};
pub use session::{AuthError, AuthSession, Registration, RegistrationError, MIN_PASSWORD_LEN};

use async_trait::async_trait;

use crate::api::{AccessToken, ApiResult};
use crate::types::User;

/// Backend calls used by the auth session
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token and the user record
    async fn login(&self, email: &str, password: &str) -> ApiResult<(AccessToken, User)>;

    /// Create a `user`-role account
    async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()>;

    /// Fetch the user the token belongs to
    async fn current_user(&self, token: &AccessToken) -> ApiResult<User>;
}
