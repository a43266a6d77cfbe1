use salvo::async_trait;

use crate::auth::identity::Identity;
use crate::auth::store::{DirectoryProvider, IdentityExtender};
use crate::error::ServiceResult;

/// Directory whose virtual-user domains come from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    domains: Vec<String>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DirectoryProvider for StaticDirectory {
    fn is_virtual_user_domain(&self, domain: &str) -> bool {
        !domain.is_empty() && self.domains.iter().any(|d| d.eq_ignore_ascii_case(domain))
    }

    async fn sync_virtual_user(
        &self,
        domain: &str,
        username: &str,
        identity: &mut Identity,
    ) -> ServiceResult<()> {
        identity.set_username(username);
        tracing::debug!(%domain, %username, "Virtual user synchronized");
        Ok(())
    }
}

/// Adds the identity's domain, lowercased, as a group membership.
#[derive(Debug, Default)]
pub struct DomainGroupExtender;

impl IdentityExtender for DomainGroupExtender {
    fn extend(&self, identity: &mut Identity) {
        if identity.is_anonymous() || identity.is_startup() || identity.domain().is_empty() {
            return;
        }
        let group = identity.domain().to_lowercase();
        identity.add_membership(group);
    }
}
