//! Application identities and the read-only binding attached to a request.

use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::credential::NegotiatedIdentity;

/// Domain of the identities shipped with every repository.
pub const BUILTIN_DOMAIN: &str = "BuiltIn";

pub const ANONYMOUS_IDENTITY_ID: Uuid = Uuid::from_u128(0x0000_0006_0000_4000_8000_0000_0000_0006);
pub const STARTUP_IDENTITY_ID: Uuid = Uuid::from_u128(0x0000_0007_0000_4000_8000_0000_0000_0007);
pub const ADMINISTRATOR_IDENTITY_ID: Uuid = Uuid::from_u128(0x0000_0001_0000_4000_8000_0000_0000_0001);
/// Placeholder record stamped with directory data for virtual-user domains.
pub const VIRTUAL_USER_IDENTITY_ID: Uuid = Uuid::from_u128(0x0000_0009_0000_4000_8000_0000_0000_0009);

/// An application identity.
///
/// Identities are built by the resolver and the extension hook, then frozen
/// behind a [`BoundIdentity`] for the rest of the request.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    id: Uuid,
    domain: String,
    username: String,
    enabled: bool,
    #[serde(skip)]
    native_credential: Option<NegotiatedIdentity>,
    memberships: Vec<String>,
}

impl Identity {
    #[must_use]
    pub fn new(id: Uuid, domain: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            username: username.into(),
            enabled: true,
            native_credential: None,
            memberships: Vec::new(),
        }
    }

    /// The public visitor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_IDENTITY_ID, BUILTIN_DOMAIN, "Visitor")
    }

    /// The bootstrap identity; never authorized for repository content.
    #[must_use]
    pub fn startup() -> Self {
        Self::new(STARTUP_IDENTITY_ID, BUILTIN_DOMAIN, "Startup")
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = domain.into();
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    /// The platform credential this identity was reconciled from, if any.
    #[must_use]
    pub const fn native_credential(&self) -> Option<&NegotiatedIdentity> {
        self.native_credential.as_ref()
    }

    pub fn set_native_credential(&mut self, credential: NegotiatedIdentity) {
        self.native_credential = Some(credential);
    }

    /// Group memberships added by the identity extension hook.
    #[must_use]
    pub fn memberships(&self) -> &[String] {
        &self.memberships
    }

    pub fn add_membership(&mut self, membership: impl Into<String>) {
        let membership = membership.into();
        if !self.memberships.contains(&membership) {
            self.memberships.push(membership);
        }
    }

    /// `domain\username`, or just the username when the domain is empty.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.domain.is_empty() {
            self.username.clone()
        } else {
            format!("{}\\{}", self.domain, self.username)
        }
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.id == ANONYMOUS_IDENTITY_ID
    }

    #[must_use]
    pub fn is_startup(&self) -> bool {
        self.id == STARTUP_IDENTITY_ID
    }

    /// Returns `true` for enabled identities other than the visitor and startup sentinels.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.enabled && !self.is_anonymous() && !self.is_startup()
    }
}

/// An identity bound to a request.
///
/// Only shared access is exposed, so every check made after binding sees
/// the same value.
#[derive(Debug, Clone)]
pub struct BoundIdentity(Arc<Identity>);

impl BoundIdentity {
    #[must_use]
    pub fn bind(identity: Identity) -> Self {
        Self(Arc::new(identity))
    }

    #[must_use]
    pub fn shared(&self) -> Arc<Identity> {
        Arc::clone(&self.0)
    }
}

impl Deref for BoundIdentity {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// ## Summary
/// Splits `domain\username` on the first backslash.
///
/// A name without a separator has an empty domain.
#[must_use]
pub fn split_full_name(full_name: &str) -> (&str, &str) {
    full_name.split_once('\\').unwrap_or(("", full_name))
}
