//! Direct uploads to presigned storage URLs.

use reqwest::header::{CONTENT_TYPE, HeaderValue};

use crate::ClientError;

/// `PUT` raw bytes to a presigned storage URL.
///
/// These uploads deliberately bypass the session: the URL is already signed
/// and the storage host must never receive console credentials.
pub(crate) async fn put_to_storage(
    http: &reqwest::Client,
    url: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<(), ClientError> {
    tracing::debug!(url, content_type, size = bytes.len(), "uploading to storage");

    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let response = http
        .put(url)
        .header(CONTENT_TYPE, content_type)
        .body(bytes)
        .send()
        .await
        .map_err(ClientError::UploadTransport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::UploadStatus {
            status: status.as_u16(),
        });
    }

    Ok(())
}
