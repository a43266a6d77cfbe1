//! The per-request pipeline: authenticate, authorize, end request.

use std::sync::Arc;

use turnstile_core::config::{AuthConfig, WindowsAuthConfig};
use turnstile_core::types::AuthScheme;

use crate::error::ServiceResult;

use super::authorize::DecisionEngine;
use super::credential::TransportCredential;
use super::decision::{AuthenticateState, AuthorizeState, Challenge, Decision};
use super::identity::{BoundIdentity, Identity};
use super::request::RequestContext;
use super::resource::ResourceRef;
use super::resolve::IdentityResolver;
use super::scheme::select_scheme;
use super::store::{
    ActionPermission, ContentStore, CredentialStore, DirectoryProvider, FormsTicket,
    IdentityExtender, IdentityStore, PermissionEvaluator, PreviewProvider,
};

/// Collaborators wired into a pipeline.
#[derive(Clone)]
pub struct AuthServices {
    pub credentials: Arc<dyn CredentialStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub content: Arc<dyn ContentStore>,
    pub permissions: Arc<dyn PermissionEvaluator>,
    pub previews: Arc<dyn PreviewProvider>,
    pub actions: Arc<dyn ActionPermission>,
    pub tickets: Arc<dyn FormsTicket>,
    pub directory: Option<Arc<dyn DirectoryProvider>>,
    pub extender: Arc<dyn IdentityExtender>,
}

/// Result of the authenticate phase.
#[derive(Debug, Clone)]
pub struct Authentication {
    pub identity: BoundIdentity,
    /// Scheme that produced the identity; `None` for crawler requests.
    pub scheme: Option<AuthScheme>,
    /// Set when the request must end here.
    pub decision: Option<Decision>,
}

pub struct AuthPipeline {
    default_mode: Option<AuthScheme>,
    windows: WindowsAuthConfig,
    resolver: IdentityResolver,
    engine: DecisionEngine,
    content: Arc<dyn ContentStore>,
    tickets: Arc<dyn FormsTicket>,
}

impl AuthPipeline {
    #[must_use]
    pub fn new(auth: &AuthConfig, services: AuthServices) -> Self {
        Self {
            default_mode: auth.default_mode,
            windows: auth.windows.clone(),
            resolver: IdentityResolver::new(
                services.credentials,
                services.identities,
                Arc::clone(&services.tickets),
                services.directory,
                services.extender,
            ),
            engine: DecisionEngine::new(
                services.permissions,
                services.previews,
                services.actions,
                auth.login_page.clone(),
            ),
            content: services.content,
            tickets: services.tickets,
        }
    }

    /// ## Summary
    /// Establishes the identity for a request.
    ///
    /// Basic credentials and crawler requests bypass scheme selection.
    /// Under Windows authentication a request that resolves to the visitor
    /// or the startup identity ends with a 401 unless it is a local
    /// diagnostic request.
    ///
    /// ## Errors
    /// Returns an error when no scheme can be selected or the selected
    /// scheme is not supported.
    #[tracing::instrument(skip_all, fields(url = %ctx.url()))]
    pub async fn authenticate(&self, ctx: &RequestContext) -> ServiceResult<Authentication> {
        let mut state = AuthenticateState::Start;
        tracing::trace!(?state);

        let credential = TransportCredential::from_headers(ctx.headers(), &self.windows);

        if let TransportCredential::Basic(payload) = &credential {
            let identity = self.resolver.resolve_basic(ctx, payload).await;
            state = AuthenticateState::Bound;
            tracing::trace!(?state, "Basic credential short-circuit");
            return Ok(Authentication {
                identity: BoundIdentity::bind(identity),
                scheme: Some(AuthScheme::Basic),
                decision: None,
            });
        }

        if ctx.flags().crawler {
            state = AuthenticateState::Bound;
            tracing::trace!(?state, "Crawler request served as visitor");
            return Ok(Authentication {
                identity: BoundIdentity::bind(Identity::anonymous()),
                scheme: None,
                decision: None,
            });
        }

        let scheme = select_scheme(ctx, self.default_mode)?;
        state = AuthenticateState::SchemeSelected(scheme);
        tracing::trace!(?state);

        let identity = self.resolver.resolve(&credential, scheme, ctx).await?;
        state = AuthenticateState::IdentityResolved;
        tracing::trace!(?state, id = %identity.id());

        // A failed or absent negotiation resolves to the visitor, so it is denied here too.
        let decision = (scheme == AuthScheme::Windows
            && (identity.is_anonymous() || identity.is_startup())
            && !ctx.is_local_diagnostic_request())
        .then_some(Decision::Challenge(Challenge::AccessDenied));

        state = AuthenticateState::Bound;
        tracing::trace!(?state, denied = decision.is_some());

        Ok(Authentication {
            identity: BoundIdentity::bind(identity),
            scheme: Some(scheme),
            decision,
        })
    }

    /// ## Summary
    /// Decides whether the bound identity may proceed.
    ///
    /// Content missing from the repository passes through so the downstream
    /// handler can answer 404.
    ///
    /// ## Errors
    /// Returns an error for configuration problems, a failed Windows
    /// permission assertion, or a failing store.
    #[tracing::instrument(skip_all, fields(url = %ctx.url(), identity = %identity.full_name()))]
    pub async fn authorize(&self, ctx: &RequestContext, identity: &Identity) -> ServiceResult<Decision> {
        let mut state = AuthorizeState::Start;
        tracing::trace!(?state);

        let resource = self.load_resource(ctx).await?;

        if let Some(decision) =
            self.engine
                .guard_file_protocol_visitor(identity, resource.as_ref(), ctx.flags())?
        {
            return Ok(decision);
        }

        let Some(resource) = resource else {
            tracing::debug!(path = %ctx.repository_path(), "Content not in repository, passing through");
            return Ok(Decision::Allow);
        };

        let scheme = select_scheme(ctx, self.default_mode)?;
        let app_permitted = self
            .engine
            .application_permission(identity, &resource, ctx, scheme)?;
        state = AuthorizeState::AppChecked;
        tracing::trace!(?state, app_permitted);

        let allowed = self
            .engine
            .evaluate(identity, &resource, ctx.flags(), app_permitted)?;
        state = AuthorizeState::ResourceChecked;
        tracing::trace!(?state, id = %resource.id, content_type = %resource.content_type, allowed);

        let decision = if allowed {
            Decision::Allow
        } else {
            self.engine.deny(identity, ctx, scheme)
        };
        state = AuthorizeState::Decided;
        tracing::debug!(?state, ?decision, "Authorization decided");

        Ok(decision)
    }

    /// ## Summary
    /// Loads the content head the request addresses.
    ///
    /// ## Errors
    /// Returns an error if the content store fails.
    pub async fn load_resource(&self, ctx: &RequestContext) -> ServiceResult<Option<ResourceRef>> {
        self.content.load_head(&ctx.repository_path()).await
    }

    /// ## Summary
    /// Signs a user in through the forms sign-in page.
    ///
    /// Returns the forms ticket to hand to the client, or `None` when the
    /// credential is rejected.
    ///
    /// ## Errors
    /// Returns an error if a store or the ticket issuer fails.
    pub async fn sign_in(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<String>> {
        self.resolver.sign_in(ctx, username, password).await
    }

    /// ## Summary
    /// Runs after the response status is known.
    ///
    /// ## Errors
    /// Returns an error if the forms ticket cannot be refreshed.
    pub async fn end_request(
        &self,
        ctx: &RequestContext,
        scheme: Option<AuthScheme>,
        status: u16,
    ) -> ServiceResult<()> {
        if scheme == Some(AuthScheme::Forms) {
            self.tickets.on_leave(ctx, status).await?;
        }

        tracing::trace!(url = %ctx.url(), status, "Request ended");
        Ok(())
    }
}
