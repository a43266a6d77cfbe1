use thiserror::Error;
use turnstile_core::types::AuthScheme;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    CoreError(#[from] turnstile_core::error::CoreError),

    #[error("Not authenticated")]
    NotAuthenticated,

    /// No authentication mode could be determined for the request.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "Authentication mode '{scheme}' is not supported on {}",
        .site.as_deref().unwrap_or("the default site")
    )]
    UnsupportedScheme {
        scheme: AuthScheme,
        site: Option<String>,
    },

    /// An action permission asserted under integrated authentication did not hold.
    #[error("Permission assertion failed: {0}")]
    PermissionAssertion(String),

    #[error("Credential decode error: {0}")]
    CredentialDecode(String),

    #[error("Lookup failure: {0}")]
    LookupFailure(String),
}

impl ServiceError {
    /// Returns `true` for errors that abort the request instead of degrading it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::UnsupportedScheme { .. }
        )
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
