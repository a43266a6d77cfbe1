//! Authorization decisions.
//!
//! The engine layers three checks: the application-level permission for the
//! requested action, the `Open` permission on the content, and the
//! preview and root exceptions that adjust the content permission. A denial
//! becomes a protocol-appropriate [`Decision`], never an error.

use std::sync::Arc;

use turnstile_core::constants::ORIGINAL_URL_QUERY_PARAM;
use turnstile_core::types::AuthScheme;

use crate::error::{ServiceError, ServiceResult};
use crate::url::form_urlencode;

use super::decision::{Challenge, Decision};
use super::identity::Identity;
use super::permission::{PermissionKind, PermissionValue};
use super::protocol::ProtocolFlags;
use super::request::RequestContext;
use super::resource::ResourceRef;
use super::store::{ActionPermission, PermissionEvaluator, PreviewProvider};

pub struct DecisionEngine {
    permissions: Arc<dyn PermissionEvaluator>,
    previews: Arc<dyn PreviewProvider>,
    actions: Arc<dyn ActionPermission>,
    login_page: Option<String>,
}

impl DecisionEngine {
    /// `login_page` is the global fallback for forms sites without their own.
    #[must_use]
    pub fn new(
        permissions: Arc<dyn PermissionEvaluator>,
        previews: Arc<dyn PreviewProvider>,
        actions: Arc<dyn ActionPermission>,
        login_page: Option<String>,
    ) -> Self {
        Self {
            permissions,
            previews,
            actions,
            login_page,
        }
    }

    /// ## Summary
    /// Asks visitors on a file protocol for Basic credentials when they
    /// cannot see the content. Missing content is challenged as well.
    ///
    /// ## Errors
    /// Returns an error if the permission evaluation fails.
    pub fn guard_file_protocol_visitor(
        &self,
        identity: &Identity,
        resource: Option<&ResourceRef>,
        flags: &ProtocolFlags,
    ) -> ServiceResult<Option<Decision>> {
        if !identity.is_anonymous() || !flags.file_access {
            return Ok(None);
        }

        let visible = match resource {
            Some(resource) => self
                .permissions
                .get_permission(identity, &resource.path, PermissionKind::See)?
                .is_allowed(),
            None => false,
        };

        if visible {
            Ok(None)
        } else {
            tracing::debug!("Visitor on a file protocol cannot see the content, asking for credentials");
            Ok(Some(Decision::Challenge(Challenge::Basic)))
        }
    }

    /// ## Summary
    /// Application-level permission for the requested action.
    ///
    /// Forms sites check it; Windows sites assert it.
    ///
    /// ## Errors
    /// Returns `PermissionAssertion` when the assertion fails under Windows
    /// authentication, and `UnsupportedScheme` for any other scheme.
    pub fn application_permission(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
        ctx: &RequestContext,
        scheme: AuthScheme,
    ) -> ServiceResult<bool> {
        let action = ctx.action();
        match scheme {
            AuthScheme::Forms => self.actions.check(identity, resource, action.as_deref()),
            AuthScheme::Windows => {
                if self.actions.check(identity, resource, action.as_deref())? {
                    Ok(true)
                } else {
                    Err(ServiceError::PermissionAssertion(format!(
                        "'{}' is not permitted to '{}' {}",
                        identity.full_name(),
                        action.as_deref().unwrap_or("browse"),
                        resource.path
                    )))
                }
            }
            AuthScheme::Basic | AuthScheme::None => Err(ServiceError::UnsupportedScheme {
                scheme,
                site: ctx.site_name().map(str::to_string),
            }),
        }
    }

    /// ## Summary
    /// Evaluates the content permission with its exceptions.
    ///
    /// `Open` decides, except that preview images of versions the identity
    /// cannot read are denied, previewable content is allowed when the
    /// application permission passed, and the root is allowed for OData
    /// member requests.
    ///
    /// ## Errors
    /// Returns an error if a permission or preview lookup fails.
    pub fn evaluate(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
        flags: &ProtocolFlags,
        app_permitted: bool,
    ) -> ServiceResult<bool> {
        let mut value = self
            .permissions
            .get_permission(identity, &resource.path, PermissionKind::Open)?;

        if value == PermissionValue::Allowed && self.previews.is_preview_image(resource) {
            if !self.previews.is_preview_accessible(identity, resource)? {
                tracing::debug!(path = %resource.path, "Preview belongs to an inaccessible version");
                value = PermissionValue::Denied;
            }
        } else if value != PermissionValue::Allowed
            && app_permitted
            && self.previews.has_preview_permission(identity, resource)?
        {
            tracing::debug!(path = %resource.path, "Open denied, allowed through preview permission");
            value = PermissionValue::Allowed;
        }

        if value != PermissionValue::Allowed && resource.is_root() && flags.member_request {
            value = PermissionValue::Allowed;
        }

        Ok(value.is_allowed() && app_permitted)
    }

    /// ## Summary
    /// Turns a denial into the outcome the client's protocol expects.
    #[must_use]
    pub fn deny(&self, identity: &Identity, ctx: &RequestContext, scheme: AuthScheme) -> Decision {
        if ctx.flags().api_query {
            return Decision::Forbidden;
        }

        match scheme {
            AuthScheme::Forms if identity.is_authenticated() => Decision::Status(403),
            AuthScheme::Forms if ctx.flags().file_access => Decision::Deferred,
            AuthScheme::Forms => self.login_redirect(ctx),
            AuthScheme::Windows | AuthScheme::Basic | AuthScheme::None => {
                Decision::Challenge(Challenge::AccessDenied)
            }
        }
    }

    /// ## Summary
    /// Redirects to the login page, carrying the requested URL.
    ///
    /// Requests for the login page itself are deferred so the page can render.
    #[must_use]
    pub fn login_redirect(&self, ctx: &RequestContext) -> Decision {
        let Some(mut login_url) = ctx.login_page_url(self.login_page.as_deref()) else {
            tracing::warn!(site = ?ctx.site_name(), "Forms authentication without a login page");
            return Decision::Challenge(Challenge::AccessDenied);
        };
        if !login_url.ends_with('/') {
            login_url.push('/');
        }

        let mut current = ctx.url().without_query_unescaped();
        if !current.ends_with('/') {
            current.push('/');
        }

        if current == login_url {
            tracing::debug!(%login_url, "Already on the login page, not redirecting");
            return Decision::Deferred;
        }

        Decision::Redirect(format!(
            "{login_url}?{ORIGINAL_URL_QUERY_PARAM}={}",
            form_urlencode(&ctx.url().to_string())
        ))
    }
}
