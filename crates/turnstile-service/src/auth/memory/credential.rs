use std::collections::HashMap;

use salvo::async_trait;
use tokio::sync::RwLock;

use crate::auth::elevation::SystemAccount;
use crate::auth::identity::split_full_name;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::store::CredentialStore;
use crate::error::{ServiceError, ServiceResult};

use super::identity_key;

/// Argon2 password hashes keyed by `domain\username`.
#[derive(Default)]
pub struct MemoryCredentialStore {
    hashes: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an existing PHC hash string.
    pub async fn set_password_hash(&self, full_name: &str, password_hash: impl Into<String>) {
        let (domain, username) = split_full_name(full_name);
        self.hashes
            .write()
            .await
            .insert(identity_key(domain, username), password_hash.into());
    }

    /// ## Summary
    /// Hashes and stores a plaintext password.
    ///
    /// ## Errors
    /// Returns an error if hashing fails.
    pub async fn set_password(&self, full_name: &str, password: &str) -> ServiceResult<()> {
        self.set_password_hash(full_name, hash_password(password)?)
            .await;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn validate_credential(
        &self,
        _scope: &SystemAccount<'_>,
        username: &str,
        password: &str,
    ) -> ServiceResult<bool> {
        let (domain, username) = split_full_name(username);
        let hashes = self.hashes.read().await;
        let Some(hash) = hashes.get(&identity_key(domain, username)) else {
            tracing::debug!(%domain, %username, "No credential stored");
            return Ok(false);
        };

        match verify_password(password, hash) {
            Ok(()) => Ok(true),
            Err(ServiceError::NotAuthenticated) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
