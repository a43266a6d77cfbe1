pub mod auth;
pub mod context;

/// Depot keys set by the authentication hoops.
pub mod depot_keys {
    /// [`turnstile_service::auth::BoundIdentity`] of the request.
    pub const BOUND_IDENTITY: &str = "turnstile.identity";
    /// [`turnstile_core::types::AuthScheme`] that produced the identity; absent for crawlers.
    pub const AUTH_SCHEME: &str = "turnstile.scheme";
    /// Set when authorization left the response to the downstream handler.
    pub const DEFERRED: &str = "turnstile.deferred";
}
