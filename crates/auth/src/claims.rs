//! Display-only decoding of the access token's claims segment.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::store::CredentialStore;

/// Identity claims extracted from the access token for client-side display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The `email` claim, when present.
    pub email: Option<String>,
    /// The `sub` claim, when present.
    pub id: Option<String>,
}

/// Raw claims of interest in the token payload.
#[derive(Debug, Deserialize)]
struct Claims {
    email: Option<String>,
    sub: Option<String>,
}

/// Errors that can occur while decoding the access token's claims segment.
#[derive(Debug, thiserror::Error)]
pub enum MalformedTokenError {
    /// Token does not have the three dot-separated segments of a JWT
    ///
    /// This occurs when the stored value is not a compact JWS at all, for
    /// example an opaque session id or a truncated token.
    #[error("token does not have three dot-separated segments")]
    WrongSegmentCount,

    /// Claims segment is not valid base64url
    #[error("claims segment is not valid base64url: {0}")]
    InvalidBase64(#[source] base64::DecodeError),

    /// Decoded claims segment is not valid UTF-8
    #[error("claims segment is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    /// Decoded claims segment is not a JSON object of claims
    #[error("claims segment is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// Decode the stored access token's claims segment into display identity.
///
/// Returns `Ok(None)` when no access token is stored. The decode is purely
/// structural: the middle segment of the token is base64url-decoded and
/// parsed as JSON, mapping the `email` claim to [`Identity::email`] and the
/// `sub` claim to [`Identity::id`].
///
/// **This performs no signature verification.** The result is suitable for
/// rendering the signed-in user's name in a header, and for nothing else;
/// trusting it for authorization decisions is unsafe since any party can
/// forge an unverified payload.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] when a token is present but its claims
/// segment cannot be decoded. Callers should treat this as "no identity
/// available" rather than a fatal condition.
pub fn parse_identity(store: &CredentialStore) -> Result<Option<Identity>, MalformedTokenError> {
    let Some(token) = store.access_token() else {
        return Ok(None);
    };

    let segments: Vec<&str> = token.split('.').collect();
    let [_, claims_segment, _] = segments.as_slice() else {
        return Err(MalformedTokenError::WrongSegmentCount);
    };

    // Compact JWS payloads are unpadded; tolerate padded input anyway.
    let claims_segment = claims_segment.trim_end_matches('=');

    let decoded = URL_SAFE_NO_PAD
        .decode(claims_segment)
        .map_err(MalformedTokenError::InvalidBase64)?;
    let payload = String::from_utf8(decoded).map_err(MalformedTokenError::InvalidUtf8)?;
    let claims: Claims =
        serde_json::from_str(&payload).map_err(MalformedTokenError::InvalidJson)?;

    Ok(Some(Identity {
        email: claims.email,
        id: claims.sub,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TOKEN_KEY;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{claims}.signature")
    }

    fn store_with_token(token: &str) -> CredentialStore {
        let store = CredentialStore::in_memory();
        store.set(TOKEN_KEY, token);
        store
    }

    #[test]
    fn no_token_yields_no_identity() {
        //* Given
        let store = CredentialStore::in_memory();

        //* When
        let identity = parse_identity(&store).expect("decode should succeed");

        //* Then
        assert_eq!(identity, None);
    }

    #[test]
    fn round_trips_email_and_subject() {
        //* Given
        let store = store_with_token(&token_with_payload(r#"{"email":"a@b.com","sub":"123"}"#));

        //* When
        let identity = parse_identity(&store)
            .expect("decode should succeed")
            .expect("identity should be present");

        //* Then
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
        assert_eq!(identity.id.as_deref(), Some("123"));
    }

    #[test]
    fn repeated_decode_is_idempotent() {
        //* Given
        let store = store_with_token(&token_with_payload(r#"{"email":"a@b.com","sub":"123"}"#));

        //* When
        let first = parse_identity(&store).expect("decode should succeed");
        let second = parse_identity(&store).expect("decode should succeed");

        //* Then
        assert_eq!(first, second);
    }

    #[test]
    fn missing_claims_are_none() {
        //* Given
        let store = store_with_token(&token_with_payload(r#"{"iat":1700000000}"#));

        //* When
        let identity = parse_identity(&store)
            .expect("decode should succeed")
            .expect("identity should be present");

        //* Then
        assert_eq!(identity.email, None);
        assert_eq!(identity.id, None);
    }

    #[test]
    fn wrong_segment_count_fails() {
        //* Given
        let store = store_with_token("only-one-segment");

        //* When
        let result = parse_identity(&store);

        //* Then
        assert!(matches!(result, Err(MalformedTokenError::WrongSegmentCount)));
    }

    #[test]
    fn invalid_base64_fails() {
        //* Given
        let store = store_with_token("header.!!!not-base64!!!.signature");

        //* When
        let result = parse_identity(&store);

        //* Then
        assert!(matches!(result, Err(MalformedTokenError::InvalidBase64(_))));
    }

    #[test]
    fn invalid_json_payload_fails() {
        //* Given
        let claims = URL_SAFE_NO_PAD.encode("not json");
        let store = store_with_token(&format!("header.{claims}.signature"));

        //* When
        let result = parse_identity(&store);

        //* Then
        assert!(matches!(result, Err(MalformedTokenError::InvalidJson(_))));
    }

    #[test]
    fn padded_claims_segment_is_tolerated() {
        //* Given
        let claims = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"u-1"}"#);
        let store = store_with_token(&format!("header.{claims}.signature"));

        //* When
        let identity = parse_identity(&store)
            .expect("decode should succeed")
            .expect("identity should be present");

        //* Then
        assert_eq!(identity.id.as_deref(), Some("u-1"));
    }
}
