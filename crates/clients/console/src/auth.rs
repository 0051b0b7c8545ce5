//! Authentication API client.
//!
//! Successful login/signup responses carry a token pair; persistence happens
//! inside the session's auth-response capture stage, so these operations
//! only need to complete for the caller to be signed in.

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient};

/// Path of the login endpoint.
///
/// POST `/auth/api/v1/login`
fn login_path() -> &'static str {
    "/auth/api/v1/login"
}

/// Path of the signup endpoint.
///
/// POST `/auth/api/v1/signup`
fn signup_path() -> &'static str {
    "/auth/api/v1/signup"
}

/// Path of the onboarding endpoint.
///
/// POST `/auth/api/v1/onboard`
fn onboard_path() -> &'static str {
    "/auth/api/v1/onboard"
}

/// Client for authentication operations.
///
/// Created via [`ConsoleClient::auth`].
#[derive(Debug)]
pub struct AuthClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// On success the session has already persisted the returned token pair.
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(
                RequestDescriptor::post(login_path())
                    .with_body(serde_json::json!({"email": email, "password": password})),
            )
            .await?;
        Ok(())
    }

    /// Create an account with email and password.
    #[tracing::instrument(skip_all)]
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(
                RequestDescriptor::post(signup_path())
                    .with_body(serde_json::json!({"email": email, "password": password})),
            )
            .await?;
        Ok(())
    }

    /// Complete onboarding with the user's name.
    #[tracing::instrument(skip(self))]
    pub async fn onboard(&self, first_name: &str, last_name: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(RequestDescriptor::post(onboard_path()).with_body(
                serde_json::json!({"first_name": first_name, "last_name": last_name}),
            ))
            .await?;
        Ok(())
    }

    /// Sign out: clears all credentials and navigates to the login screen.
    pub fn logout(&self) {
        self.client.session().logout();
    }
}
