//! Product management API client.

use serde::{Deserialize, Serialize};

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient, Page};

/// Path of the products collection.
///
/// GET/POST `/products/api/v1`
pub(crate) fn products_collection() -> &'static str {
    "/products/api/v1"
}

/// Path of a single product.
///
/// GET/PATCH/DELETE `/products/api/v1/{id}`
fn product_item(id: &str) -> String {
    format!("/products/api/v1/{id}")
}

/// A product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: i64,
    /// Resolved category name, present on read paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub price: f64,
    pub stock: i64,
}

/// Product payload for create and update operations.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub price: f64,
    pub stock: i64,
}

/// One page of the products collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub total: u64,
}

/// Client for product management operations.
///
/// Created via [`ConsoleClient::products`].
#[derive(Debug)]
pub struct ProductsClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> ProductsClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// List products, paginated.
    #[tracing::instrument(skip(self), fields(page_no = page.page_no, page_size = page.page_size))]
    pub async fn list(&self, page: Page) -> Result<ProductsPage, ClientError> {
        let response = self
            .client
            .session()
            .request(
                RequestDescriptor::get(products_collection())
                    .with_param("page_no", page.page_no)
                    .with_param("page_size", page.page_size),
            )
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Fetch a single product.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Product, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::get(product_item(id)))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Create a product.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, payload: &ProductPayload) -> Result<Product, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::post(products_collection()).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Update a product.
    #[tracing::instrument(skip(self, payload))]
    pub async fn update(&self, id: &str, payload: &ProductPayload) -> Result<Product, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::patch(product_item(id)).with_json(payload))
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Delete a product.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client
            .session()
            .request(RequestDescriptor::delete(product_item(id)))
            .await?;
        Ok(())
    }
}
