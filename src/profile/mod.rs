//! Profile View
//!
//! Account details, password changes and the user's own support requests.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::{AccessToken, ApiError, ApiResult, NewSupportRequest, ProfileUpdate};
use crate::auth::{AuthApi, AuthSession, MIN_PASSWORD_LEN};
use crate::types::{Priority, RequestStatus, SupportRequest, User};

/// Backend calls used by the profile view
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn update_profile(&self, token: &AccessToken, update: &ProfileUpdate) -> ApiResult<()>;

    async fn change_password(
        &self,
        token: &AccessToken,
        old_password: &str,
        new_password: &str,
    ) -> ApiResult<()>;

    /// Support requests raised by the signed-in user
    async fn my_tickets(&self, token: &AccessToken) -> ApiResult<Vec<SupportRequest>>;

    async fn create_ticket(
        &self,
        token: &AccessToken,
        request: &NewSupportRequest,
    ) -> ApiResult<SupportRequest>;
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Please enter your {0}")]
    MissingField(&'static str),

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The user's own support requests
#[derive(Debug, Default)]
pub struct ProfileView {
    tickets: Vec<SupportRequest>,
}

impl ProfileView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickets(&self) -> &[SupportRequest] {
        &self.tickets
    }

    /// Submit new account details, then refetch the user so every view
    /// sees the saved values
    pub async fn edit_profile<A>(
        &mut self,
        api: &A,
        auth: &mut AuthSession,
        update: ProfileUpdate,
    ) -> Result<(), ProfileError>
    where
        A: ProfileApi + AuthApi,
    {
        let update = ProfileUpdate {
            full_name: required(&update.full_name, "name")?,
            email: required(&update.email, "email")?,
            phone: update
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        };

        let token = auth.token()?.clone();
        if let Err(e) = api.update_profile(&token, &update).await {
            tracing::error!(error = %e, "Profile update failed");
            return Err(e.into());
        }
        tracing::info!("Profile updated");

        // Already saved; a failed refetch only leaves stale display data
        if let Err(e) = auth.refresh_user(api).await {
            tracing::warn!(error = %e, "Showing cached profile until the next refresh");
        }
        Ok(())
    }

    pub async fn change_password(
        &mut self,
        api: &dyn ProfileApi,
        token: &AccessToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ProfileError> {
        if old_password.is_empty() {
            return Err(ProfileError::MissingField("current password"));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProfileError::PasswordTooShort);
        }

        match api.change_password(token, old_password, new_password).await {
            Ok(()) => {
                tracing::info!("Password changed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Password change failed");
                Err(e.into())
            }
        }
    }

    pub async fn load_tickets(
        &mut self,
        api: &dyn ProfileApi,
        token: &AccessToken,
    ) -> Result<&[SupportRequest], ProfileError> {
        self.tickets = api.my_tickets(token).await?;
        Ok(&self.tickets)
    }

    /// Raise a support request. The created ticket is appended as `open`.
    pub async fn submit_ticket(
        &mut self,
        api: &dyn ProfileApi,
        token: &AccessToken,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> Result<&SupportRequest, ProfileError> {
        let request = NewSupportRequest {
            title: required(title, "title")?,
            description: required(description, "description")?,
            priority,
        };

        let mut ticket = match api.create_ticket(token, &request).await {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(error = %e, "Support request failed");
                return Err(e.into());
            }
        };
        tracing::info!(request_id = ticket.id, "Support request created");

        ticket.status = RequestStatus::Open;
        let index = self.tickets.len();
        self.tickets.push(ticket);
        Ok(&self.tickets[index])
    }
}

/// Counters shown on the profile page
pub fn summary(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("Name", user.display_name().to_string()),
        ("Email", user.email.clone()),
        ("Phone", user.phone.clone().unwrap_or_else(|| "-".to_string())),
        ("Role", user.role.to_string()),
        ("Sessions", user.sessions_count.to_string()),
        ("Days active", user.days_active.to_string()),
        (
            "Joined",
            user.joined_date.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ]
}

fn required(value: &str, field: &'static str) -> Result<String, ProfileError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ProfileError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}
