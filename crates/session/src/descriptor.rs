//! Request descriptions handed to the session by callers.

use reqwest::{
    Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};

/// A single request as described by the caller: method, URL, headers, query
/// parameters and an optional JSON body.
///
/// Descriptors are immutable once handed to
/// [`Session::request`](crate::Session::request); the session copies them
/// into its own outbound representation before the middleware pipeline runs.
///
/// The URL may be an absolute `http(s)` URL (third-party hosts) or a path,
/// which is resolved against the session's base URL.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    /// Create a descriptor with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            params: Vec::new(),
            body: None,
        }
    }

    /// `GET` the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// `POST` to the given URL.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// `PATCH` the given URL.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// `PUT` to the given URL.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// `DELETE` the given URL.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Append a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Set a JSON body from a pre-built value.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a JSON body by serializing the given value.
    pub fn with_json<T: serde::Serialize>(self, body: &T) -> Self {
        let value = serde_json::to_value(body).expect("request body serializes to JSON");
        self.with_body(value)
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request URL or path.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Caller-provided headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameters.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Method,
        String,
        HeaderMap,
        Vec<(String, String)>,
        Option<serde_json::Value>,
    ) {
        (self.method, self.url, self.headers, self.params, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::CONTENT_TYPE;

    #[test]
    fn builder_collects_all_parts() {
        //* When
        let descriptor = RequestDescriptor::post("/users/api/v1")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_param("page_no", 1)
            .with_body(serde_json::json!({"username": "ada"}));

        //* Then
        assert_eq!(descriptor.method(), &Method::POST);
        assert_eq!(descriptor.url(), "/users/api/v1");
        assert_eq!(descriptor.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()), Some(b"text/plain".as_slice()));
        assert_eq!(descriptor.params(), &[("page_no".to_owned(), "1".to_owned())]);
        assert_eq!(
            descriptor.body(),
            Some(&serde_json::json!({"username": "ada"}))
        );
    }
}
