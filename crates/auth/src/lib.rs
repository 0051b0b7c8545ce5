//! Credential storage and access-token claims decoding.
//!
//! This crate owns the two leaf pieces of the console's session layer:
//!
//! - [`CredentialStore`]: durable key-value persistence for the access and
//!   refresh tokens. The session gateway writes it; everything else reads.
//! - [`parse_identity`]: a display-only decode of the access token's claims
//!   segment. It performs **no signature verification** and must never be
//!   used to make authorization decisions.

mod claims;
mod store;

pub use claims::{Identity, MalformedTokenError, parse_identity};
pub use store::{CredentialStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
