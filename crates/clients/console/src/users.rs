//! User management API client.

use serde::{Deserialize, Serialize};

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient, Page};

/// Path of the users collection.
///
/// GET/POST `/users/api/v1`
fn users_collection() -> &'static str {
    "/users/api/v1"
}

/// Path of a single user.
///
/// GET/PATCH/DELETE `/users/api/v1/{id}`
fn user_item(id: &str) -> String {
    format!("/users/api/v1/{id}")
}

/// Path of the signed-in user's record.
///
/// GET `/users/api/v1/me`
fn users_me() -> &'static str {
    "/users/api/v1/me"
}

/// A console user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "operator")]
    Operator,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
    #[serde(rename = "USER")]
    User,
}

/// A console user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    pub full_name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// Partial user payload for create and update operations. Unset fields are
/// omitted from the request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// One page of the users collection.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Client for user management operations.
///
/// Created via [`ConsoleClient::users`].
#[derive(Debug)]
pub struct UsersClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> UsersClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// List users, paginated.
    #[tracing::instrument(skip(self), fields(page_no = page.page_no, page_size = page.page_size))]
    pub async fn list(&self, page: Page) -> Result<UsersPage, ClientError> {
        let response = self
            .client
            .session()
            .request(
                RequestDescriptor::get(users_collection())
                    .with_param("page_no", page.page_no)
                    .with_param("page_size", page.page_size),
            )
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Fetch the signed-in user's record.
    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::get(users_me()))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Create a user.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, payload: &UserPayload) -> Result<User, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::post(users_collection()).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Update a user's fields.
    #[tracing::instrument(skip(self, payload))]
    pub async fn update(&self, id: &str, payload: &UserPayload) -> Result<User, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::patch(user_item(id)).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Delete a user.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(RequestDescriptor::delete(user_item(id)))
            .await?;
        Ok(())
    }
}
