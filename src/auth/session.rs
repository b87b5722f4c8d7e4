//! Auth Session
//!
//! Holds the bearer token and the signed-in user. Created at program start,
//! restored from the credential store, and passed to every view that makes
//! authenticated calls.

use thiserror::Error;

use super::credentials::{CredentialError, CredentialStore};
use super::AuthApi;
use crate::api::{AccessToken, ApiError, ApiResult};
use crate::types::User;

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration form
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    /// Check the form before anything is sent
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(RegistrationError::MissingField("email"));
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Local validation failures of the registration form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Please enter your {0}")]
    MissingField(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

/// Errors from sign-in flows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Message for the login screen
    pub fn login_message(&self) -> String {
        match self {
            AuthError::Registration(e) => e.to_string(),
            AuthError::Api(e) => e.login_message().to_string(),
        }
    }

    /// Message for the registration screen
    pub fn register_message(&self) -> String {
        match self {
            AuthError::Registration(e) => e.to_string(),
            AuthError::Api(ApiError::Rejected { message, .. }) => message.clone(),
            AuthError::Api(_) => "Registration failed. Please try again.".to_string(),
        }
    }
}

/// Signed-in state of the client
pub struct AuthSession {
    store: Box<dyn CredentialStore>,
    token: Option<AccessToken>,
    user: Option<User>,
}

impl AuthSession {
    /// Create a signed-out session backed by `store`
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            store,
            token: None,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Token for authenticated calls
    pub fn token(&self) -> ApiResult<&AccessToken> {
        self.token.as_ref().ok_or(ApiError::NotAuthenticated)
    }

    /// The underlying credential store
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Resume a previous sign-in from the credential store.
    ///
    /// Returns whether a user is now signed in. A stored token the backend no
    /// longer accepts is removed.
    pub async fn restore(&mut self, api: &dyn AuthApi) -> bool {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored credential");
                return false;
            }
        };

        match api.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Session restored");
                self.token = Some(token);
                self.user = Some(user);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session restore failed");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "Failed to remove stale credential");
                }
                false
            }
        }
    }

    /// Sign in and persist the token
    pub async fn login(
        &mut self,
        api: &dyn AuthApi,
        email: &str,
        password: &str,
    ) -> Result<&User, AuthError> {
        let (token, user) = match api.login(email.trim(), password).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.save(&token) {
            // Still signed in for this run
            tracing::warn!(error = %e, "Failed to persist credential");
        }

        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        self.token = Some(token);
        Ok(self.user.insert(user))
    }

    /// Create an account, then sign in with it
    pub async fn register(
        &mut self,
        api: &dyn AuthApi,
        form: &Registration,
    ) -> Result<&User, AuthError> {
        form.validate()?;

        if let Err(e) = api
            .register(form.name.trim(), form.email.trim(), &form.password)
            .await
        {
            tracing::error!(error = %e, "Registration failed");
            return Err(e.into());
        }

        tracing::info!("Account created");
        self.login(api, &form.email, &form.password).await
    }

    /// Refetch the current user. On failure the existing user is kept.
    pub async fn refresh_user(&mut self, api: &dyn AuthApi) -> ApiResult<&User> {
        let token = self.token()?.clone();
        match api.current_user(&token).await {
            Ok(user) => Ok(self.user.insert(user)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh user");
                Err(e)
            }
        }
    }

    /// Sign out: forget the user and remove the stored credential
    pub fn logout(&mut self) -> Result<(), CredentialError> {
        self.user = None;
        self.token = None;
        tracing::info!("Signed out");
        self.store.clear()
    }
}
