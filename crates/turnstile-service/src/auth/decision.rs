//! Outcomes of the pipeline and the states each phase moves through.

use turnstile_core::types::AuthScheme;

/// Kind of 401 challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Challenge {
    /// Ask the client for Basic credentials.
    Basic,
    /// Plain 401 without a credential prompt.
    AccessDenied,
}

/// What the surrounding server should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Leave the response to the protocol handler downstream.
    Deferred,
    Redirect(String),
    /// Write the status with an empty body and end the request.
    Status(u16),
    Challenge(Challenge),
    /// Structured 403 for API clients.
    Forbidden,
}

impl Decision {
    /// Returns `true` if the request continues to the downstream handler.
    #[must_use]
    pub const fn continues(&self) -> bool {
        matches!(self, Self::Allow | Self::Deferred)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticateState {
    Start,
    SchemeSelected(AuthScheme),
    IdentityResolved,
    Bound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizeState {
    Start,
    AppChecked,
    ResourceChecked,
    Decided,
    Executed,
}
