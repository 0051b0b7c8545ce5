//! Profile avatar API client.
//!
//! The avatar flow mirrors product images at a smaller scale: request a
//! presigned URL, `PUT` the bytes directly to storage, then point the user
//! record at the stored path.

use serde::Deserialize;

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient, upload::put_to_storage};

/// Path of the avatar presigned-URL endpoint.
///
/// POST `/avatars/api/v1/upload_url`
fn avatar_upload_url() -> &'static str {
    "/avatars/api/v1/upload_url"
}

/// Path for assigning a user's avatar.
///
/// POST `/avatars/api/v1/{user_id}`
fn avatar_item(user_id: &str) -> String {
    format!("/avatars/api/v1/{user_id}")
}

/// A presigned avatar upload grant.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarUploadUrl {
    /// Where to `PUT` the bytes.
    pub upload_url: String,
    /// Storage path to assign to the user record.
    pub path: String,
}

/// Client for avatar operations.
///
/// Created via [`ConsoleClient::avatars`].
#[derive(Debug)]
pub struct AvatarsClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> AvatarsClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// Request a presigned upload URL for an avatar image.
    #[tracing::instrument(skip(self))]
    pub async fn upload_url(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<AvatarUploadUrl, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::post(avatar_upload_url()).with_body(
                serde_json::json!({"file_name": file_name, "content_type": content_type}),
            ))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Assign a stored avatar path to a user.
    #[tracing::instrument(skip(self))]
    pub async fn set(&self, user_id: &str, path: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(
                RequestDescriptor::post(avatar_item(user_id))
                    .with_body(serde_json::json!({"avatar": path})),
            )
            .await?;
        Ok(())
    }

    /// Full avatar change: presigned URL, direct storage upload, assignment.
    #[tracing::instrument(skip(self, bytes))]
    pub async fn change(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        let grant = self.upload_url(file_name, content_type).await?;
        put_to_storage(
            self.client.storage_http(),
            &grant.upload_url,
            content_type,
            bytes,
        )
        .await?;
        self.set(user_id, &grant.path).await
    }
}
