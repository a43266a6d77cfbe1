//! Identity resolution.
//!
//! Every branch ends in [`IdentityResolver::finish`]: missing or disabled
//! records become the visitor, and the extension hook runs on whatever is
//! about to be bound. Store failures are logged and degrade to the visitor;
//! only configuration problems surface as errors.

use std::sync::Arc;

use turnstile_core::types::AuthScheme;

use crate::error::{ServiceError, ServiceResult};

use super::credential::{BasicCredential, NegotiatedIdentity, TransportCredential};
use super::identity::{Identity, VIRTUAL_USER_IDENTITY_ID, split_full_name};
use super::request::RequestContext;
use super::store::{
    CredentialStore, DirectoryProvider, FormsTicket, IdentityExtender, IdentityStore, LoadHints,
};

fn recover(result: ServiceResult<Option<Identity>>) -> Option<Identity> {
    result.unwrap_or_else(|err| {
        tracing::error!(error = %err, "Identity lookup failed, using visitor");
        None
    })
}

/// Only the built-in administrator exists: the repository is being set up.
const BOOTSTRAP_ADMINISTRATOR_COUNT: usize = 1;

pub struct IdentityResolver {
    credentials: Arc<dyn CredentialStore>,
    identities: Arc<dyn IdentityStore>,
    tickets: Arc<dyn FormsTicket>,
    directory: Option<Arc<dyn DirectoryProvider>>,
    extender: Arc<dyn IdentityExtender>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        identities: Arc<dyn IdentityStore>,
        tickets: Arc<dyn FormsTicket>,
        directory: Option<Arc<dyn DirectoryProvider>>,
        extender: Arc<dyn IdentityExtender>,
    ) -> Self {
        Self {
            credentials,
            identities,
            tickets,
            directory,
            extender,
        }
    }

    /// ## Summary
    /// Resolves a Basic `Authorization` payload.
    ///
    /// Never fails: malformed payloads, bad passwords and store errors all
    /// yield the visitor.
    #[tracing::instrument(skip(self, ctx, payload))]
    pub async fn resolve_basic(&self, ctx: &RequestContext, payload: &str) -> Identity {
        let credential = match BasicCredential::decode(payload) {
            Ok(credential) => credential,
            Err(err) => {
                tracing::debug!(error = %err, "Malformed Basic credential, using visitor");
                return self.finish(None);
            }
        };

        match self.lookup_basic(ctx, &credential).await {
            Ok(identity) => self.finish(identity),
            Err(err) => {
                tracing::error!(error = %err, username = %credential.username, "Basic authentication failed");
                self.finish(None)
            }
        }
    }

    async fn lookup_basic(
        &self,
        ctx: &RequestContext,
        credential: &BasicCredential,
    ) -> ServiceResult<Option<Identity>> {
        let valid = {
            let scope = ctx.security().elevate();
            self.credentials
                .validate_credential(&scope, &credential.username, &credential.password)
                .await?
        };

        if !valid {
            tracing::debug!(username = %credential.username, "Invalid Basic credential");
            return Ok(None);
        }

        let (domain, username) = split_full_name(&credential.username);
        let scope = ctx.security().elevate();
        self.identities
            .load_identity(&scope, domain, username, LoadHints::default())
            .await
    }

    /// ## Summary
    /// Checks a sign-in form and issues a forms ticket for the identity.
    ///
    /// Returns `None` when the credential is wrong or the identity is not
    /// an enabled, authenticated user.
    ///
    /// ## Errors
    /// Returns an error if a store or the ticket issuer fails.
    #[tracing::instrument(skip(self, ctx, password))]
    pub async fn sign_in(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<String>> {
        let credential = BasicCredential {
            username: username.to_string(),
            password: password.to_string(),
        };
        let identity = self.finish(self.lookup_basic(ctx, &credential).await?);
        if !identity.is_authenticated() {
            tracing::debug!("Sign-in rejected");
            return Ok(None);
        }

        let token = self.tickets.issue(&identity.full_name()).await?;
        tracing::info!(name = %identity.full_name(), "Signed in");
        Ok(Some(token))
    }

    /// ## Summary
    /// Resolves the identity for the selected scheme.
    ///
    /// ## Errors
    /// Returns `UnsupportedScheme` when `Basic` is selected as a site mode.
    #[tracing::instrument(skip(self, credential, ctx), fields(url = %ctx.url()))]
    pub async fn resolve(
        &self,
        credential: &TransportCredential,
        scheme: AuthScheme,
        ctx: &RequestContext,
    ) -> ServiceResult<Identity> {
        let identity = match scheme {
            AuthScheme::None => None,
            AuthScheme::Windows => {
                let negotiated = match credential {
                    TransportCredential::Negotiated(negotiated) if negotiated.is_authenticated() => {
                        negotiated
                    }
                    _ => return Ok(self.finish(None)),
                };
                recover(self.lookup_windows(ctx, negotiated).await)
            }
            AuthScheme::Forms => match self.tickets.on_enter(ctx).await {
                Ok(Some(full_name)) => recover(self.lookup_forms(ctx, &full_name).await),
                Ok(None) => None,
                Err(err) => {
                    tracing::error!(error = %err, "Forms ticket could not be read");
                    None
                }
            },
            AuthScheme::Basic => {
                return Err(ServiceError::UnsupportedScheme {
                    scheme,
                    site: ctx.site_name().map(str::to_string),
                });
            }
        };

        Ok(self.finish(identity))
    }

    async fn lookup_windows(
        &self,
        ctx: &RequestContext,
        negotiated: &NegotiatedIdentity,
    ) -> ServiceResult<Option<Identity>> {
        let (domain, username) = split_full_name(&negotiated.name);
        let scope = ctx.security().elevate();

        let hints = LoadHints {
            force_relational: true,
        };
        let mut identity = self
            .identities
            .load_identity(&scope, domain, username, hints)
            .await?;

        if identity.is_none()
            && !domain.is_empty()
            && !username.is_empty()
            && ctx.site().is_some()
            && self.identities.count_administrators(&scope).await? == BOOTSTRAP_ADMINISTRATOR_COUNT
        {
            tracing::info!(name = %negotiated.name, "Registering first user of a new repository");
            identity = Some(
                self.identities
                    .register_identity(&scope, &negotiated.name)
                    .await?,
            );
        }

        Ok(identity.map(|mut identity| {
            identity.set_native_credential(negotiated.clone());
            identity
        }))
    }

    async fn lookup_forms(
        &self,
        ctx: &RequestContext,
        full_name: &str,
    ) -> ServiceResult<Option<Identity>> {
        let (domain, username) = split_full_name(full_name);

        if let Some(directory) = self
            .directory
            .as_ref()
            .filter(|directory| directory.is_virtual_user_domain(domain))
        {
            let placeholder = {
                let scope = ctx.security().elevate();
                self.identities
                    .load_identity_by_id(&scope, VIRTUAL_USER_IDENTITY_ID)
                    .await?
            };

            let Some(mut identity) = placeholder else {
                tracing::warn!(%domain, "Virtual user placeholder is missing");
                return Ok(None);
            };
            identity.set_domain(domain);
            identity.set_enabled(true);
            directory
                .sync_virtual_user(domain, username, &mut identity)
                .await?;
            return Ok(Some(identity));
        }

        let scope = ctx.security().elevate();
        self.identities
            .load_identity(&scope, domain, username, LoadHints::default())
            .await
    }

    /// ## Summary
    /// Replaces missing or disabled identities with the visitor and runs the
    /// extension hook.
    #[must_use]
    pub fn finish(&self, identity: Option<Identity>) -> Identity {
        let mut identity = match identity {
            Some(identity) if identity.enabled() => identity,
            Some(identity) => {
                tracing::debug!(name = %identity.full_name(), "Identity is disabled, using visitor");
                Identity::anonymous()
            }
            None => Identity::anonymous(),
        };

        self.extender.extend(&mut identity);
        tracing::debug!(id = %identity.id(), name = %identity.full_name(), "Identity resolved");
        identity
    }
}
