//! Collaborators the pipeline depends on.
//!
//! Lookups that must bypass the requester's own permissions take a
//! [`SystemAccount`]. Reference implementations live in
//! [`super::memory`].

use salvo::async_trait;
use uuid::Uuid;

use crate::error::ServiceResult;

use super::elevation::SystemAccount;
use super::identity::Identity;
use super::permission::{PermissionKind, PermissionValue};
use super::request::RequestContext;
use super::resource::ResourceRef;

/// Hints passed through to identity lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadHints {
    /// Read from the primary store, bypassing any search index.
    pub force_relational: bool,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `username` may carry a `domain\` prefix.
    async fn validate_credential(
        &self,
        scope: &SystemAccount<'_>,
        username: &str,
        password: &str,
    ) -> ServiceResult<bool>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load_identity(
        &self,
        scope: &SystemAccount<'_>,
        domain: &str,
        username: &str,
        hints: LoadHints,
    ) -> ServiceResult<Option<Identity>>;

    async fn load_identity_by_id(
        &self,
        scope: &SystemAccount<'_>,
        id: Uuid,
    ) -> ServiceResult<Option<Identity>>;

    /// Creates an enabled identity for `domain\username`.
    async fn register_identity(
        &self,
        scope: &SystemAccount<'_>,
        full_name: &str,
    ) -> ServiceResult<Identity>;

    async fn count_administrators(&self, scope: &SystemAccount<'_>) -> ServiceResult<usize>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn load_head(&self, path: &str) -> ServiceResult<Option<ResourceRef>>;
}

/// External directory that backs virtual-user domains.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    fn is_virtual_user_domain(&self, domain: &str) -> bool;

    /// Copies the directory's data for `domain\username` onto the placeholder identity.
    async fn sync_virtual_user(
        &self,
        domain: &str,
        username: &str,
        identity: &mut Identity,
    ) -> ServiceResult<()>;
}

/// Forms authentication ticket lifecycle.
#[async_trait]
pub trait FormsTicket: Send + Sync {
    /// Issues a ticket for `domain\username`; returns the value the client presents.
    async fn issue(&self, full_name: &str) -> ServiceResult<String>;

    /// Returns the `domain\username` carried by the request's ticket.
    async fn on_enter(&self, ctx: &RequestContext) -> ServiceResult<Option<String>>;

    async fn on_leave(&self, ctx: &RequestContext, status: u16) -> ServiceResult<()>;
}

/// Hook run on every resolved identity before it is bound.
pub trait IdentityExtender: Send + Sync {
    fn extend(&self, identity: &mut Identity);
}

/// Extender that leaves identities untouched.
#[derive(Debug, Default)]
pub struct NoExtension;

impl IdentityExtender for NoExtension {
    fn extend(&self, _identity: &mut Identity) {}
}

/// Application-level permission for the requested action.
pub trait ActionPermission: Send + Sync {
    /// `action` is the `?action=` query value; `None` means browsing.
    fn check(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
        action: Option<&str>,
    ) -> ServiceResult<bool>;
}

pub trait PermissionEvaluator: Send + Sync {
    fn get_permission(
        &self,
        identity: &Identity,
        path: &str,
        kind: PermissionKind,
    ) -> ServiceResult<PermissionValue>;
}

pub trait PreviewProvider: Send + Sync {
    fn is_preview_image(&self, resource: &ResourceRef) -> bool;

    /// Whether the document version a preview image belongs to is readable.
    fn is_preview_accessible(&self, identity: &Identity, resource: &ResourceRef)
    -> ServiceResult<bool>;

    fn has_preview_permission(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
    ) -> ServiceResult<bool>;
}
