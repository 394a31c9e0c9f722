//! HTTP Basic authentication against a single configured credential pair.
//!
//! Credentials are compared with plain `==`, which is not constant-time. This is a
//! local test double; do not reuse the checker where timing leaks matter.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::Engine;

/// Why a request was not authenticated.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("Authorization header is not valid ASCII")]
    InvalidHeader,
    #[error("Authorization scheme is not Basic")]
    NotBasic,
    #[error("Basic credentials are not valid base64")]
    InvalidBase64,
    #[error("Basic credentials are not valid UTF-8")]
    InvalidUtf8,
    #[error("Basic credentials have no ':' separator")]
    MissingSeparator,
    #[error("invalid username or password")]
    Rejected,
}

/// Username and password decoded from an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Parse a raw header value. The scheme is matched case-insensitively and the
    /// payload is split on the first ':' so passwords may contain colons.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        const PREFIX: &str = "Basic ";
        let encoded = match value.get(..PREFIX.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(PREFIX) => &value[PREFIX.len()..],
            _ => return Err(AuthError::NotBasic),
        };
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|_| AuthError::InvalidBase64)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidUtf8)?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MissingSeparator)?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Extract from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidHeader)?;
        Self::parse(value)
    }
}

/// The configured username/password pair. Set once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True iff both values equal the configured pair exactly.
    pub fn check(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }

    /// Reject unless Basic credentials can be extracted AND they match.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let provided = BasicCredentials::from_headers(headers)?;
        if self.check(&provided.username, &provided.password) {
            Ok(())
        } else {
            Err(AuthError::Rejected)
        }
    }
}
