//! Builds the in-memory collaborators from the `seed` configuration.

use std::sync::Arc;

use turnstile_core::config::Settings;
use turnstile_service::auth::casbin::{CasbinPermissionEvaluator, init_casbin};
use turnstile_service::auth::identity::Identity;
use turnstile_service::auth::memory::{
    DomainGroupExtender, MemoryContentStore, MemoryCredentialStore, MemoryFormsTickets,
    MemoryIdentityStore, PermissionActionGuard, StaticDirectory,
};
use turnstile_service::auth::pipeline::AuthServices;
use turnstile_service::auth::preview::VersionedPreviewProvider;
use turnstile_service::auth::store::{DirectoryProvider, PermissionEvaluator};
use turnstile_service::error::ServiceResult;
use uuid::Uuid;

/// ## Summary
/// Creates the Casbin enforcer from the configured policy file, or an empty
/// in-memory one.
///
/// ## Errors
/// Returns an error if the policy file cannot be loaded.
pub async fn build_enforcer(settings: &Settings) -> ServiceResult<casbin::Enforcer> {
    match &settings.seed.policy_file {
        Some(path) => {
            tracing::info!(%path, "Loading access policies");
            init_casbin(casbin::FileAdapter::new(path.clone())).await
        }
        None => {
            tracing::warn!("No policy file configured, all content is denied");
            init_casbin(casbin::MemoryAdapter::default()).await
        }
    }
}

/// ## Summary
/// Wires the collaborators for a pipeline around `enforcer` and fills the
/// stores from the seed configuration.
pub async fn seed_services(settings: &Settings, enforcer: casbin::Enforcer) -> AuthServices {
    let permissions: Arc<dyn PermissionEvaluator> =
        Arc::new(CasbinPermissionEvaluator::new(Arc::new(enforcer)));

    let identities = Arc::new(MemoryIdentityStore::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    for user in &settings.seed.users {
        let mut identity = Identity::new(
            seed_identity_id(&user.domain, &user.username),
            user.domain.clone(),
            user.username.clone(),
        );
        identity.set_enabled(user.enabled);
        let full_name = identity.full_name();

        if let Some(hash) = &user.password_hash {
            credentials.set_password_hash(&full_name, hash.clone()).await;
        }
        identities.insert(identity, user.administrator).await;
    }

    let content = Arc::new(MemoryContentStore::new());
    for path in &settings.seed.content {
        content.insert(path).await;
    }

    let directory = (!settings.auth.virtual_user_domains.is_empty()).then(|| {
        Arc::new(StaticDirectory::new(settings.auth.virtual_user_domains.clone()))
            as Arc<dyn DirectoryProvider>
    });

    tracing::info!(
        users = settings.seed.users.len(),
        content = settings.seed.content.len(),
        virtual_domains = settings.auth.virtual_user_domains.len(),
        "Stores seeded"
    );

    AuthServices {
        credentials,
        identities,
        content,
        permissions: Arc::clone(&permissions),
        previews: Arc::new(VersionedPreviewProvider::new(Arc::clone(&permissions))),
        actions: Arc::new(PermissionActionGuard::new(permissions)),
        tickets: Arc::new(MemoryFormsTickets::new(
            settings.auth.forms.cookie_name.clone(),
            settings.auth.forms.ticket_ttl(),
        )),
        directory,
        extender: Arc::new(DomainGroupExtender),
    }
}

/// Seeded identities keep their id across restarts.
fn seed_identity_id(domain: &str, username: &str) -> Uuid {
    let name = format!("{domain}\\{username}").to_lowercase();
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}
