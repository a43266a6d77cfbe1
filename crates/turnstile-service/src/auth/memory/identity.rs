use std::collections::{HashMap, HashSet};

use salvo::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::elevation::SystemAccount;
use crate::auth::identity::{
    ADMINISTRATOR_IDENTITY_ID, BUILTIN_DOMAIN, Identity, VIRTUAL_USER_IDENTITY_ID, split_full_name,
};
use crate::auth::store::{IdentityStore, LoadHints};
use crate::error::{ServiceError, ServiceResult};

use super::identity_key;

#[derive(Default)]
struct IdentityTable {
    by_id: HashMap<Uuid, Identity>,
    by_name: HashMap<String, Uuid>,
    administrators: HashSet<Uuid>,
}

impl IdentityTable {
    fn insert(&mut self, identity: Identity, administrator: bool) {
        let key = identity_key(identity.domain(), identity.username());
        if administrator {
            self.administrators.insert(identity.id());
        }
        self.by_name.insert(key, identity.id());
        self.by_id.insert(identity.id(), identity);
    }
}

/// Identity store seeded with the built-in administrator and the
/// disabled virtual-user placeholder.
pub struct MemoryIdentityStore {
    table: RwLock<IdentityTable>,
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        let mut table = IdentityTable::default();
        table.insert(
            Identity::new(ADMINISTRATOR_IDENTITY_ID, BUILTIN_DOMAIN, "Admin"),
            true,
        );

        let mut placeholder = Identity::new(VIRTUAL_USER_IDENTITY_ID, BUILTIN_DOMAIN, "VirtualADUser");
        placeholder.set_enabled(false);
        table.insert(placeholder, false);

        Self {
            table: RwLock::new(table),
        }
    }

    /// Adds or replaces an identity; an empty domain is stored as the built-in one.
    pub async fn insert(&self, mut identity: Identity, administrator: bool) {
        if identity.domain().is_empty() {
            identity.set_domain(BUILTIN_DOMAIN);
        }
        tracing::debug!(id = %identity.id(), name = %identity.full_name(), administrator, "Adding identity");
        self.table.write().await.insert(identity, administrator);
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn load_identity(
        &self,
        _scope: &SystemAccount<'_>,
        domain: &str,
        username: &str,
        hints: LoadHints,
    ) -> ServiceResult<Option<Identity>> {
        tracing::trace!(%domain, %username, ?hints, "Loading identity");
        let table = self.table.read().await;
        Ok(table
            .by_name
            .get(&identity_key(domain, username))
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn load_identity_by_id(
        &self,
        _scope: &SystemAccount<'_>,
        id: Uuid,
    ) -> ServiceResult<Option<Identity>> {
        Ok(self.table.read().await.by_id.get(&id).cloned())
    }

    async fn register_identity(
        &self,
        _scope: &SystemAccount<'_>,
        full_name: &str,
    ) -> ServiceResult<Identity> {
        let (domain, username) = split_full_name(full_name);
        if username.is_empty() {
            return Err(ServiceError::LookupFailure(format!(
                "Cannot register '{full_name}' without a username"
            )));
        }

        let mut table = self.table.write().await;
        if table.by_name.contains_key(&identity_key(domain, username)) {
            return Err(ServiceError::LookupFailure(format!(
                "Identity '{full_name}' already exists"
            )));
        }

        let domain = if domain.is_empty() { BUILTIN_DOMAIN } else { domain };
        let identity = Identity::new(Uuid::new_v4(), domain, username);
        table.insert(identity.clone(), false);

        tracing::info!(id = %identity.id(), name = %identity.full_name(), "Identity registered");
        Ok(identity)
    }

    async fn count_administrators(&self, _scope: &SystemAccount<'_>) -> ServiceResult<usize> {
        Ok(self.table.read().await.administrators.len())
    }
}
