//! Credentials carried by the transport.

use base64::Engine;
use salvo::http::HeaderMap;
use salvo::http::header::AUTHORIZATION;
use serde::Serialize;
use turnstile_core::config::WindowsAuthConfig;

use crate::error::{ServiceError, ServiceResult};

const BASIC_PREFIX: &str = "Basic ";

/// The raw credential found on a request, before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCredential {
    /// Base64 payload of an `Authorization: Basic` header.
    Basic(String),
    /// Identity negotiated by the trusted upstream.
    Negotiated(NegotiatedIdentity),
    None,
}

impl TransportCredential {
    /// ## Summary
    /// Extracts the credential from request headers.
    ///
    /// A Basic header wins over upstream identity headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, windows: &WindowsAuthConfig) -> Self {
        if let Some(payload) = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BASIC_PREFIX))
        {
            return Self::Basic(payload.to_string());
        }

        let header_value = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        match header_value(&windows.user_header) {
            Some(name) => Self::Negotiated(NegotiatedIdentity {
                name,
                auth_type: header_value(&windows.auth_type_header).unwrap_or_default(),
            }),
            None => Self::None,
        }
    }
}

/// A platform identity established outside the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiatedIdentity {
    pub name: String,
    pub auth_type: String,
}

impl NegotiatedIdentity {
    /// Returns `true` when the upstream actually negotiated a user.
    ///
    /// An empty name or a `basic` authentication type counts as anonymous.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.name.is_empty() && !self.auth_type.eq_ignore_ascii_case("basic")
    }
}

/// Decoded `username:password` pair.
pub struct BasicCredential {
    pub username: String,
    pub password: String,
}

impl BasicCredential {
    /// ## Summary
    /// Decodes the payload of a Basic header.
    ///
    /// ## Errors
    /// Returns `CredentialDecode` if the payload is not base64, not UTF-8, or
    /// does not split into exactly two `:`-separated parts.
    pub fn decode(payload: &str) -> ServiceResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ServiceError::CredentialDecode(format!("invalid base64: {e}")))?;

        let decoded = String::from_utf8(bytes)
            .map_err(|e| ServiceError::CredentialDecode(format!("invalid UTF-8: {e}")))?;

        let parts: Vec<&str> = decoded.split(':').collect();
        let [username, password] = parts.as_slice() else {
            return Err(ServiceError::CredentialDecode(format!(
                "expected 2 parts, found {}",
                parts.len()
            )));
        };

        Ok(Self {
            username: (*username).to_string(),
            password: (*password).to_string(),
        })
    }
}

impl std::fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
