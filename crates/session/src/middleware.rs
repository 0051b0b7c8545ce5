//! Request/response middleware pipeline.
//!
//! The session composes an ordered list of middleware at construction time;
//! each outbound request is passed through every [`RequestMiddleware`] in
//! order, and every successful response through every [`ResponseMiddleware`]
//! before the caller sees it. The 401 recovery stage is not a middleware: it
//! needs to re-enter the transport and lives in the session core.

use std::sync::Arc;

use console_auth::{CredentialStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
use reqwest::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use url::Url;

use crate::session::SessionResponse;

/// The session's mutable view of a request about to be sent.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Fully resolved request URL.
    pub url: Url,
    /// Request method.
    pub method: Method,
    /// Headers accumulated from the descriptor and the request stage.
    pub headers: HeaderMap,
    /// Query parameters.
    pub params: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

/// Request-stage middleware: `(request) -> request`.
pub trait RequestMiddleware: Send + Sync {
    /// Adjust the outbound request in place.
    fn on_request(&self, request: &mut OutboundRequest);
}

/// Response-stage middleware: observes successful responses before they are
/// returned to the caller.
pub trait ResponseMiddleware: Send + Sync {
    /// Inspect a successful response.
    fn on_response(&self, response: &SessionResponse);
}

/// A validated bearer token ready to become an `Authorization` header.
///
/// The token is stored without the `Bearer ` prefix; the prefix is added
/// when converting to a header value. Construction validates that the value
/// only contains visible ASCII, which guarantees the header conversion
/// cannot fail. `Debug` redacts the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to an `Authorization` header value, marked sensitive so it is
    /// redacted in debug output.
    pub fn as_header_value(&self) -> HeaderValue {
        // Validated at construction to only contain visible ASCII.
        let mut value: HeaderValue = format!("Bearer {}", self.0)
            .parse()
            .expect("validated token converts to a header value");
        value.set_sensitive(true);
        value
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

impl TryFrom<&str> for BearerToken {
    type Error = InvalidBearerToken;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(InvalidBearerToken);
        }
        if !value.chars().all(|ch| (' '..='~').contains(&ch)) {
            return Err(InvalidBearerToken);
        }
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for BearerToken {
    type Error = InvalidBearerToken;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Token is empty or contains characters that cannot appear in an HTTP
/// header value.
#[derive(Debug, thiserror::Error)]
#[error("bearer token is empty or contains non-header characters")]
pub struct InvalidBearerToken;

/// Attaches `Authorization: Bearer <token>` from the credential store.
///
/// Skipped when the URL matches one of the configured exclusion patterns
/// (third-party hosts that must not see our credentials), when the caller
/// already set an `Authorization` header, or when no token is stored —
/// absence of a token is not an error, the request proceeds
/// unauthenticated.
pub struct BearerAuth {
    store: Arc<CredentialStore>,
    exclude: Vec<String>,
}

impl BearerAuth {
    /// Create the middleware with URL substring patterns to exclude.
    pub fn new(store: Arc<CredentialStore>, exclude: Vec<String>) -> Self {
        Self { store, exclude }
    }

    fn is_excluded(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.exclude.iter().any(|pattern| url.contains(pattern.as_str()))
    }
}

impl RequestMiddleware for BearerAuth {
    fn on_request(&self, request: &mut OutboundRequest) {
        if self.is_excluded(&request.url) {
            return;
        }
        if request.headers.contains_key(AUTHORIZATION) {
            return;
        }

        let Some(token) = self.store.access_token() else {
            return;
        };

        match BearerToken::try_from(token) {
            Ok(token) => {
                request.headers.insert(AUTHORIZATION, token.as_header_value());
            }
            Err(error) => {
                tracing::warn!(%error, "stored access token unusable as a header; sending unauthenticated");
            }
        }
    }
}

/// Applies the default `Content-Type: application/json` unless the caller
/// set one.
#[derive(Debug, Default)]
pub struct DefaultHeaders;

impl RequestMiddleware for DefaultHeaders {
    fn on_request(&self, request: &mut OutboundRequest) {
        if !request.headers.contains_key(CONTENT_TYPE) {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
    }
}

/// Persists `token`/`refresh_token` from authentication-endpoint responses.
///
/// Any successful response whose request URL contains the configured auth
/// path pattern has its token pair captured into the credential store as a
/// side effect, before the response is returned to the caller. Responses
/// that match the pattern but lack the string fields persist nothing.
pub struct AuthResponseCapture {
    store: Arc<CredentialStore>,
    pattern: String,
}

impl AuthResponseCapture {
    /// Create the middleware with the URL substring identifying auth
    /// endpoints.
    pub fn new(store: Arc<CredentialStore>, pattern: String) -> Self {
        Self { store, pattern }
    }
}

impl ResponseMiddleware for AuthResponseCapture {
    fn on_response(&self, response: &SessionResponse) {
        if !response.url().as_str().contains(self.pattern.as_str()) {
            return;
        }

        let token = response.body().get("token").and_then(|v| v.as_str());
        let refresh_token = response.body().get("refresh_token").and_then(|v| v.as_str());

        if let (Some(token), Some(refresh_token)) = (token, refresh_token) {
            self.store.set(TOKEN_KEY, token);
            self.store.set(REFRESH_TOKEN_KEY, refresh_token);
            tracing::debug!(url = %response.url(), "captured token pair from auth response");
        } else {
            tracing::debug!(url = %response.url(), "auth response carried no token pair");
        }
    }
}
