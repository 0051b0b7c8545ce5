//! Common error types for the typed clients.

/// Errors from typed client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session-level request failed
    #[error(transparent)]
    Session(#[from] console_session::SessionError),

    /// The response arrived but its body did not match the expected shape
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),

    /// A presigned storage upload returned a non-success status
    #[error("storage upload failed with HTTP {status}")]
    UploadStatus {
        /// The storage host's response status
        status: u16,
    },

    /// A presigned storage upload failed at the transport level
    #[error("network error during storage upload")]
    UploadTransport(#[source] reqwest::Error),

    /// An upload batch produced nothing to save
    ///
    /// This occurs when every file in the batch failed to upload; the
    /// per-file failure messages are carried for display.
    #[error("no files were uploaded")]
    NothingUploaded {
        /// One message per failed file
        failures: Vec<String>,
    },
}
