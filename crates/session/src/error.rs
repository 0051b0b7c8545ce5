//! Error types for the session gateway.

use serde_json::Value;

/// Top-level error type for session requests.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Request URL could not be resolved
    ///
    /// This occurs when a caller-supplied URL is neither a valid absolute
    /// URL nor a path that joins onto the session's base URL.
    #[error("invalid request URL {url}")]
    InvalidUrl {
        /// The URL as supplied by the caller
        url: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure, no response received
    ///
    /// This occurs when the underlying HTTP transport fails before a status
    /// line is available, typically due to:
    /// - Connection failures
    /// - DNS resolution failures
    /// - TLS handshake failures
    #[error("network error requesting {url}")]
    Transport {
        /// The URL that was being requested
        url: String,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Response received with a non-2xx status
    ///
    /// This is surfaced after the recovery stage has run: a 401 only reaches
    /// the caller once the single refresh-and-retry cycle has been consumed
    /// (or the retried request failed with some other status).
    #[error("HTTP {status} from {url}")]
    Status {
        /// The response status code
        status: u16,
        /// The URL that produced the response
        url: String,
        /// The response body, parsed as JSON when possible
        body: Value,
    },

    /// The refresh cycle itself failed
    ///
    /// This is terminal: by the time it is surfaced the credential store has
    /// been cleared and navigation to the login screen has been requested.
    /// The original request's failure is not separately reported.
    #[error("token refresh failed")]
    RefreshExhausted(#[source] RefreshError),
}

impl SessionError {
    /// The HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RefreshExhausted(RefreshError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// The response body carried by this error, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::RefreshExhausted(RefreshError::Status { body, .. }) => Some(body),
            _ => None,
        }
    }
}

/// Errors that can occur when building a [`Session`](crate::Session).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Failed to construct the underlying HTTP client
    #[error("failed to construct HTTP client")]
    HttpClientConstruction(#[source] reqwest::Error),

    /// The refresh path could not be joined onto the base URL
    #[error("invalid refresh path {path}")]
    InvalidRefreshPath {
        /// The refresh path as configured
        path: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },
}

/// Errors from the dedicated token-refresh call.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Refresh request failed at the transport level or returned an
    /// undecodable success body
    #[error("network error during token refresh")]
    Network(#[source] reqwest::Error),

    /// Refresh endpoint returned a non-200 status
    ///
    /// This occurs when the refresh token has itself expired or been
    /// revoked; the user has to authenticate again.
    #[error("refresh endpoint returned HTTP {status}")]
    Status {
        /// The refresh response status code
        status: u16,
        /// The refresh response body, parsed as JSON when possible
        body: Value,
    },
}
