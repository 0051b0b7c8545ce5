//! Product image API client.
//!
//! Images live in object storage; the API hands out presigned upload URLs
//! and stores metadata (slot order, primary flag, public URL) per product.
//! Slots are 0-based on the caller side; the stored `display_order` is
//! 1-based and slot 0 is the primary image.

use serde::{Deserialize, Serialize};

use console_session::RequestDescriptor;

use crate::{ClientError, ConsoleClient, products::products_collection, upload::put_to_storage};

/// Storage key prefix for product images.
const PRODUCT_KEY: &str = "product";

/// Path of the presigned-URL endpoint for product images.
///
/// POST `/products/api/v1/images/upload_url`
fn upload_url_path() -> String {
    format!("{}/images/upload_url", products_collection())
}

/// Path of a product's image metadata.
///
/// GET/POST `/products/api/v1/{product_id}/images`
fn product_images(product_id: &str) -> String {
    format!("{}/{product_id}/images", products_collection())
}

/// Request body for the presigned-URL endpoint.
#[derive(Debug, Serialize)]
struct UploadSignedUrlRequest<'a> {
    key: &'a str,
    file_name: &'a str,
    content_type: &'a str,
}

/// A presigned upload grant.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSignedUrl {
    /// Where to `PUT` the bytes.
    pub upload_url: String,
    /// Storage path of the object.
    pub path: String,
    /// Public URL the object will be served from.
    pub public_url: String,
}

/// Image metadata sent when saving a product's image list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub is_primary: bool,
    pub image_url: String,
    /// 1-based display position.
    pub display_order: u32,
}

/// A stored image record as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub is_primary: bool,
    pub image_url: String,
    pub display_order: u32,
}

#[derive(Debug, Serialize)]
struct SaveImagesRequest {
    images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Vec<ImageRecord>,
}

/// A file queued for upload, with the slot it was picked for.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// 0-based slot; slot 0 becomes the primary image. Files without a slot
    /// take their position in the batch.
    pub slot: Option<u32>,
}

/// Result of a completed upload batch.
#[derive(Debug)]
pub struct UploadOutcome {
    /// The product's stored image list after the save.
    pub images: Vec<ImageRecord>,
    /// Per-file failure messages for files that did not make it.
    pub failures: Vec<String>,
}

/// Client for product image operations.
///
/// Created via [`ConsoleClient::images`].
#[derive(Debug)]
pub struct ImagesClient<'a> {
    client: &'a ConsoleClient,
}

impl<'a> ImagesClient<'a> {
    pub(crate) fn new(client: &'a ConsoleClient) -> Self {
        Self { client }
    }

    /// Request a presigned upload URL.
    #[tracing::instrument(skip(self))]
    pub async fn upload_url(
        &self,
        key: &str,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadSignedUrl, ClientError> {
        let response = self
            .client
            .session()
            .request(
                RequestDescriptor::post(upload_url_path()).with_json(&UploadSignedUrlRequest {
                    key,
                    file_name,
                    content_type,
                }),
            )
            .await?;
        response.json().map_err(ClientError::Decode)
    }

    /// Fetch a product's stored images.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, product_id: &str) -> Result<Vec<ImageRecord>, ClientError> {
        let response = self
            .client
            .session()
            .request(RequestDescriptor::get(product_images(product_id)))
            .await?;
        let body: ImagesResponse = response.json().map_err(ClientError::Decode)?;
        Ok(body.images)
    }

    /// Save a product's complete image list.
    #[tracing::instrument(skip(self, images))]
    pub async fn save_metadata(
        &self,
        product_id: &str,
        images: Vec<ImageEntry>,
    ) -> Result<Vec<ImageRecord>, ClientError> {
        let response = self
            .client
            .session()
            .request(
                RequestDescriptor::post(product_images(product_id))
                    .with_json(&SaveImagesRequest { images }),
            )
            .await?;
        let body: ImagesResponse = response.json().map_err(ClientError::Decode)?;
        Ok(body.images)
    }

    /// Upload a batch of files to storage.
    ///
    /// Each file gets its own presigned URL and `PUT`; failures are
    /// collected per file rather than aborting the batch, so a single bad
    /// file does not lose the rest.
    #[tracing::instrument(skip_all, fields(files = files.len()))]
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
    ) -> (Vec<ImageEntry>, Vec<String>) {
        let mut uploaded = Vec::new();
        let mut failures = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            let slot = file.slot.unwrap_or(index as u32);

            let grant = match self
                .upload_url(PRODUCT_KEY, &file.name, &file.content_type)
                .await
            {
                Ok(grant) => grant,
                Err(error) => {
                    tracing::warn!(file = %file.name, %error, "presigned URL request failed");
                    failures.push(format!("Failed to upload {}", file.name));
                    continue;
                }
            };

            if let Err(error) = put_to_storage(
                self.client.storage_http(),
                &grant.upload_url,
                &file.content_type,
                file.bytes,
            )
            .await
            {
                tracing::warn!(file = %file.name, %error, "storage upload failed");
                failures.push(format!("Failed to upload {}", file.name));
                continue;
            }

            uploaded.push(ImageEntry {
                is_primary: slot == 0,
                image_url: grant.public_url,
                display_order: slot + 1,
            });
        }

        (uploaded, failures)
    }

    /// Upload a batch and save it as the product's image list.
    #[tracing::instrument(skip_all, fields(product_id = %product_id))]
    pub async fn complete(
        &self,
        product_id: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadOutcome, ClientError> {
        let (uploaded, failures) = self.upload_files(files).await;
        if uploaded.is_empty() {
            return Err(ClientError::NothingUploaded { failures });
        }

        let images = self.save_metadata(product_id, uploaded).await?;
        Ok(UploadOutcome { images, failures })
    }

    /// Upload a batch, merge it with the product's existing images by slot,
    /// and save the combined list.
    ///
    /// New images replace existing ones occupying the same slot; the
    /// combined list always carries exactly one primary image.
    #[tracing::instrument(skip_all, fields(product_id = %product_id, existing = existing.len()))]
    pub async fn complete_with_merge(
        &self,
        product_id: &str,
        files: Vec<UploadFile>,
        existing: &[ImageRecord],
    ) -> Result<UploadOutcome, ClientError> {
        let (uploaded, failures) = self.upload_files(files).await;
        if uploaded.is_empty() {
            return Err(ClientError::NothingUploaded { failures });
        }

        let merged = merge_images(existing, uploaded);
        let images = self.save_metadata(product_id, merged).await?;
        Ok(UploadOutcome { images, failures })
    }
}

/// Merge newly uploaded entries into the existing list by display order.
///
/// New entries win their slot; the result is sorted by display order and
/// normalized to carry exactly one primary image (the first entry becomes
/// primary when none is flagged).
fn merge_images(existing: &[ImageRecord], uploaded: Vec<ImageEntry>) -> Vec<ImageEntry> {
    let mut by_order = std::collections::BTreeMap::new();

    for record in existing {
        by_order.insert(
            record.display_order,
            ImageEntry {
                is_primary: record.is_primary,
                image_url: record.image_url.clone(),
                display_order: record.display_order,
            },
        );
    }
    for entry in uploaded {
        by_order.insert(entry.display_order, entry);
    }

    let mut merged: Vec<ImageEntry> = by_order.into_values().collect();

    if !merged.iter().any(|entry| entry.is_primary)
        && let Some(first) = merged.first_mut()
    {
        first.is_primary = true;
    }

    merged
}
