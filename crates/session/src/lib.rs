//! Shared HTTP session gateway for the console client.
//!
//! Every outbound call from the console goes through one [`Session`], which
//! layers three cross-cutting behaviors as an ordered middleware pipeline
//! around the transport:
//!
//! 1. **Request stage** — a default `Content-Type: application/json` header
//!    and an `Authorization: Bearer <token>` header read from the
//!    [`CredentialStore`](console_auth::CredentialStore) (skipped for
//!    excluded third-party URLs).
//! 2. **Response stage** — responses from authentication endpoints have
//!    their `token`/`refresh_token` fields persisted into the store before
//!    the caller sees them.
//! 3. **Failure recovery** — a 401 triggers at most one dedicated
//!    refresh-and-retry cycle per original request; an irrecoverable
//!    refresh failure clears the store and requests navigation to the
//!    login screen through the injected [`Navigator`].
//!
//! The session is constructed explicitly via [`Session::builder`] and shared
//! by `Arc`; there is no ambient global instance.

mod descriptor;
mod error;
mod middleware;
mod navigation;
mod session;

pub use descriptor::RequestDescriptor;
pub use error::{BuildError, RefreshError, SessionError};
pub use middleware::{
    AuthResponseCapture, BearerAuth, BearerToken, DefaultHeaders, OutboundRequest,
    RequestMiddleware, ResponseMiddleware,
};
pub use navigation::{Navigator, NoopNavigator};
pub use session::{Session, SessionBuilder, SessionResponse};

// Re-exported for callers building descriptors and inspecting responses.
pub use reqwest::{Method, StatusCode, header};
