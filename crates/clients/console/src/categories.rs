//! Category management API client.

use serde::{Deserialize, Serialize};

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient, Page};

/// Path of the categories collection.
///
/// GET/POST `/categories/api/v1`
fn categories_collection() -> &'static str {
    "/categories/api/v1"
}

/// Path of a single category.
///
/// PATCH/DELETE `/categories/api/v1/{id}`
fn category_item(id: i64) -> String {
    format!("/categories/api/v1/{id}")
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Category payload for create and update operations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One page of the categories collection.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesPage {
    pub categories: Vec<Category>,
    pub total: u64,
}

/// Client for category management operations.
///
/// Created via [`ConsoleClient::categories`].
#[derive(Debug)]
pub struct CategoriesClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> CategoriesClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// List categories, paginated.
    #[tracing::instrument(skip(self), fields(page_no = page.page_no, page_size = page.page_size))]
    pub async fn list(&self, page: Page) -> Result<CategoriesPage, ClientError> {
        let response = self
            .client
            .session()
            .request(
                RequestDescriptor::get(categories_collection())
                    .with_param("page_no", page.page_no)
                    .with_param("page_size", page.page_size),
            )
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Create a category.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, payload: &CategoryPayload) -> Result<Category, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::post(categories_collection()).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Update a category.
    #[tracing::instrument(skip(self, payload))]
    pub async fn update(&self, id: i64, payload: &CategoryPayload) -> Result<Category, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::patch(category_item(id)).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Delete a category.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.client
            .session()
            .request(RequestDescriptor::delete(category_item(id)))
            .await?;
        Ok(())
    }
}
