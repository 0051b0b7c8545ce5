//! Typed HTTP clients for the console admin API.
//!
//! This crate provides a typed layer over the shared
//! [`Session`](console_session::Session), organized by resource with a
//! submodule per endpoint group. Every call goes through the session, so
//! bearer injection, auth-response capture and refresh-and-retry recovery
//! apply uniformly; the one exception is presigned storage uploads, which
//! go directly to the storage host.

pub mod auth;
pub mod avatars;
pub mod categories;
pub mod error;
pub mod images;
pub mod products;
pub mod users;

mod upload;

use std::sync::Arc;

use console_session::Session;

pub use self::error::ClientError;

/// Pagination parameters shared by the collection endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// 1-based page number.
    pub page_no: u32,
    /// Number of rows per page.
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page_no: 1,
            page_size: 5,
        }
    }
}

/// Typed client for the console admin API.
///
/// Wraps the shared session and provides per-resource accessors.
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    session: Arc<Session>,
    /// Plain client for presigned storage uploads; these bypass the session
    /// so the storage host never sees console credentials.
    storage_http: reqwest::Client,
}

impl ConsoleClient {
    /// Create a client over the shared session.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            storage_http: reqwest::Client::new(),
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Authentication operations (login, signup, onboarding, logout).
    pub fn auth(&self) -> auth::AuthClient<'_> {
        auth::AuthClient::new(self)
    }

    /// User management operations.
    pub fn users(&self) -> users::UsersClient<'_> {
        users::UsersClient::new(self)
    }

    /// Category management operations.
    pub fn categories(&self) -> categories::CategoriesClient<'_> {
        categories::CategoriesClient::new(self)
    }

    /// Product management operations.
    pub fn products(&self) -> products::ProductsClient<'_> {
        products::ProductsClient::new(self)
    }

    /// Product image operations.
    pub fn images(&self) -> images::ImagesClient<'_> {
        images::ImagesClient::new(self)
    }

    /// Profile avatar operations.
    pub fn avatars(&self) -> avatars::AvatarsClient<'_> {
        avatars::AvatarsClient::new(self)
    }

    pub(crate) fn storage_http(&self) -> &reqwest::Client {
        &self.storage_http
    }
}
