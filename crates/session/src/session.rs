//! The shared session gateway.

use std::sync::Arc;

use console_auth::{CredentialStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, HeaderMap},
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    descriptor::RequestDescriptor,
    error::{BuildError, RefreshError, SessionError},
    middleware::{
        AuthResponseCapture, BearerAuth, BearerToken, DefaultHeaders, OutboundRequest,
        RequestMiddleware, ResponseMiddleware,
    },
    navigation::{Navigator, NoopNavigator},
};

/// URL substring identifying authentication endpoints whose responses carry
/// a token pair.
const AUTH_PATH_PATTERN: &str = "/auth/api/v1";

/// Path of the token-refresh endpoint.
const REFRESH_PATH: &str = "/auth/api/v1/token/refresh";

/// Path of the login screen.
const LOGIN_PATH: &str = "/console/auth/login";

/// Third-party asset hosts that must never receive our credentials.
const DEFAULT_EXCLUDED_URLS: &[&str] = &["tenor.googleapis.com"];

/// A completed response as seen by session callers.
#[derive(Debug, Clone)]
pub struct SessionResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl SessionResponse {
    /// The URL the response was received from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body, parsed as JSON when possible. Non-JSON bodies are
    /// carried as a JSON string; empty bodies as `null`.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Deserialize the response body.
    ///
    /// # Errors
    ///
    /// Returns the underlying deserialization error when the body does not
    /// match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

/// Per-request flag recording that this request's single refresh-retry
/// cycle has been consumed. Scoped to one logical request, never shared
/// across requests, never persisted.
#[derive(Debug, Default)]
struct RetryMarker(bool);

impl RetryMarker {
    fn mark(&mut self) {
        self.0 = true;
    }

    fn is_marked(&self) -> bool {
        self.0
    }
}

/// Token pair returned by the refresh endpoint (and by login/signup).
#[derive(Debug, Deserialize)]
struct TokenPair {
    token: String,
    refresh_token: String,
}

/// The shared gateway for all outbound calls.
///
/// Construct one per application with [`Session::builder`] and share it by
/// `Arc`. See the crate docs for the pipeline stages.
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    refresh_url: Url,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    request_middleware: Vec<Box<dyn RequestMiddleware>>,
    response_middleware: Vec<Box<dyn ResponseMiddleware>>,
    login_path: String,
}

impl Session {
    /// Create a builder for a session rooted at the given base URL.
    pub fn builder(base_url: Url, store: Arc<CredentialStore>) -> SessionBuilder {
        SessionBuilder::new(base_url, store)
    }

    /// The credential store this session reads and writes.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform a request described by `descriptor`.
    ///
    /// The request stage runs first (default headers, bearer injection),
    /// then the transport. A 401 response consumes the request's single
    /// refresh-and-retry cycle; any other failure status is returned as
    /// [`SessionError::Status`]. Successful responses pass through the
    /// response stage (auth-response capture) before being returned.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Transport`] when no response was received.
    /// - [`SessionError::Status`] for non-2xx responses, after recovery.
    /// - [`SessionError::RefreshExhausted`] when a refresh cycle failed; the
    ///   credential store has been cleared and login navigation requested.
    pub async fn request(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<SessionResponse, SessionError> {
        let mut outbound = self.prepare(descriptor)?;
        let mut marker = RetryMarker::default();

        let mut response = self.transport(&outbound).await?;
        while response.status == StatusCode::UNAUTHORIZED && !marker.is_marked() {
            marker.mark();
            response = self.refresh_and_retry(&mut outbound).await?;
        }

        if response.status.is_success() {
            for middleware in &self.response_middleware {
                middleware.on_response(&response);
            }
            Ok(response)
        } else {
            Err(SessionError::Status {
                status: response.status.as_u16(),
                url: response.url.to_string(),
                body: response.body,
            })
        }
    }

    /// Clear all credentials and navigate to the login screen.
    pub fn logout(&self) {
        tracing::debug!("logging out; clearing credentials");
        self.store.clear();
        self.navigator.navigate(&self.login_path);
    }

    /// Resolve the descriptor against the base URL and run the request
    /// stage.
    fn prepare(&self, descriptor: RequestDescriptor) -> Result<OutboundRequest, SessionError> {
        let (method, url, headers, params, body) = descriptor.into_parts();
        let url = self.resolve_url(&url)?;

        let mut outbound = OutboundRequest {
            url,
            method,
            headers,
            params,
            body,
        };
        for middleware in &self.request_middleware {
            middleware.on_request(&mut outbound);
        }
        Ok(outbound)
    }

    fn resolve_url(&self, raw: &str) -> Result<Url, SessionError> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url
                    .join(raw)
                    .map_err(|source| SessionError::InvalidUrl {
                        url: raw.to_owned(),
                        source,
                    })
            }
            Err(source) => Err(SessionError::InvalidUrl {
                url: raw.to_owned(),
                source,
            }),
        }
    }

    /// Send the outbound request and read the full response body.
    async fn transport(&self, outbound: &OutboundRequest) -> Result<SessionResponse, SessionError> {
        tracing::debug!(method = %outbound.method, url = %outbound.url, "sending request");

        let mut request = self
            .http
            .request(outbound.method.clone(), outbound.url.clone())
            .headers(outbound.headers.clone());
        if !outbound.params.is_empty() {
            request = request.query(&outbound.params);
        }
        if let Some(body) = &outbound.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| SessionError::Transport {
                url: outbound.url.to_string(),
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| SessionError::Transport {
                url: outbound.url.to_string(),
                source,
            })?;

        tracing::debug!(status = %status, "received response");

        Ok(SessionResponse {
            url: outbound.url.clone(),
            status,
            headers,
            body: parse_body(&bytes),
        })
    }

    /// Run one refresh cycle and re-issue the original request.
    ///
    /// The refresh call is issued directly against the transport, bypassing
    /// the middleware pipeline, so a refresh endpoint that itself rejects
    /// credentials cannot start another cycle.
    async fn refresh_and_retry(
        &self,
        outbound: &mut OutboundRequest,
    ) -> Result<SessionResponse, SessionError> {
        tracing::debug!(url = %outbound.url, "access token rejected; attempting refresh");

        let request_body = serde_json::json!({
            "refresh_token": self.store.refresh_token(),
            "token": self.store.access_token(),
        });

        let response = match self
            .http
            .post(self.refresh_url.clone())
            .json(&request_body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(source) => return Err(self.abandon(RefreshError::Network(source))),
        };

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(self.abandon(RefreshError::Status {
                status,
                body: parse_body(&bytes),
            }));
        }

        let pair: TokenPair = match response.json().await {
            Ok(pair) => pair,
            Err(source) => return Err(self.abandon(RefreshError::Network(source))),
        };

        self.store.set(TOKEN_KEY, &pair.token);
        self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token);

        match BearerToken::try_from(pair.token.as_str()) {
            Ok(token) => {
                outbound.headers.insert(AUTHORIZATION, token.as_header_value());
            }
            Err(error) => {
                tracing::warn!(%error, "refreshed token unusable as a header; retrying unauthenticated");
                outbound.headers.remove(AUTHORIZATION);
            }
        }

        tracing::debug!("token pair refreshed; retrying original request");
        self.transport(outbound).await
    }

    /// Terminal refresh failure: wipe credentials and send the user back to
    /// the login screen.
    fn abandon(&self, error: RefreshError) -> SessionError {
        tracing::warn!(%error, "token refresh failed; clearing credentials");
        self.store.clear();
        if self.navigator.current_path() != self.login_path {
            self.navigator.navigate(&self.login_path);
        }
        SessionError::RefreshExhausted(error)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// Parse a response body: JSON when possible, a JSON string for non-JSON
/// payloads, `null` when empty.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Builder for constructing a [`Session`].
///
/// Created via [`Session::builder`].
pub struct SessionBuilder {
    base_url: Url,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    http_client: Option<reqwest::Client>,
    excluded_urls: Vec<String>,
    auth_path_pattern: String,
    refresh_path: String,
    login_path: String,
    request_middleware: Vec<Box<dyn RequestMiddleware>>,
    response_middleware: Vec<Box<dyn ResponseMiddleware>>,
}

impl SessionBuilder {
    fn new(mut base_url: Url, store: Arc<CredentialStore>) -> Self {
        // Ensure that no path segments are dropped when joining on this URL.
        if !base_url.path().ends_with('/') {
            base_url = format!("{base_url}/").parse().expect("valid URL");
        }

        Self {
            base_url,
            store,
            navigator: Arc::new(NoopNavigator),
            http_client: None,
            excluded_urls: DEFAULT_EXCLUDED_URLS.iter().map(|s| (*s).to_owned()).collect(),
            auth_path_pattern: AUTH_PATH_PATTERN.to_owned(),
            refresh_path: REFRESH_PATH.to_owned(),
            login_path: LOGIN_PATH.to_owned(),
            request_middleware: Vec::new(),
            response_middleware: Vec::new(),
        }
    }

    /// Install the navigation capability used for forced logout redirects.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Use a custom reqwest client (timeouts, pools, proxies).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Add a URL substring pattern whose matches never receive the bearer
    /// header.
    pub fn with_excluded_url(mut self, pattern: impl Into<String>) -> Self {
        self.excluded_urls.push(pattern.into());
        self
    }

    /// Override the URL substring identifying authentication endpoints.
    pub fn with_auth_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.auth_path_pattern = pattern.into();
        self
    }

    /// Override the token-refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Override the login screen path used for forced redirects.
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Append a request-stage middleware after the built-in ones.
    pub fn with_request_middleware(mut self, middleware: Box<dyn RequestMiddleware>) -> Self {
        self.request_middleware.push(middleware);
        self
    }

    /// Append a response-stage middleware after the built-in ones.
    pub fn with_response_middleware(mut self, middleware: Box<dyn ResponseMiddleware>) -> Self {
        self.response_middleware.push(middleware);
        self
    }

    /// Build the session, composing the middleware pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the HTTP client cannot be constructed or
    /// the refresh path does not resolve against the base URL.
    pub fn build(self) -> Result<Session, BuildError> {
        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(BuildError::HttpClientConstruction)?,
        };

        let refresh_url = self
            .base_url
            .join(&self.refresh_path)
            .map_err(|source| BuildError::InvalidRefreshPath {
                path: self.refresh_path.clone(),
                source,
            })?;

        let mut request_middleware: Vec<Box<dyn RequestMiddleware>> = vec![
            Box::new(DefaultHeaders),
            Box::new(BearerAuth::new(Arc::clone(&self.store), self.excluded_urls)),
        ];
        request_middleware.extend(self.request_middleware);

        let mut response_middleware: Vec<Box<dyn ResponseMiddleware>> =
            vec![Box::new(AuthResponseCapture::new(
                Arc::clone(&self.store),
                self.auth_path_pattern,
            ))];
        response_middleware.extend(self.response_middleware);

        Ok(Session {
            http,
            base_url: self.base_url,
            refresh_url,
            store: self.store,
            navigator: self.navigator,
            request_middleware,
            response_middleware,
            login_path: self.login_path,
        })
    }
}
