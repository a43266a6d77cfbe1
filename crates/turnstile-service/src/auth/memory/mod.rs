//! In-memory collaborators.
//!
//! Each store is `Send + Sync` and guards its state with a
//! `tokio::sync::RwLock`, so one instance serves every request.

mod action;
mod content;
mod credential;
mod directory;
mod identity;
mod tickets;

pub use action::{PermissionActionGuard, required_permission};
pub use content::MemoryContentStore;
pub use credential::MemoryCredentialStore;
pub use directory::{DomainGroupExtender, StaticDirectory};
pub use identity::MemoryIdentityStore;
pub use tickets::MemoryFormsTickets;

use super::identity::BUILTIN_DOMAIN;

/// Case-insensitive `(domain, username)` key; an empty domain means the built-in one.
fn identity_key(domain: &str, username: &str) -> String {
    let domain = if domain.is_empty() {
        BUILTIN_DOMAIN
    } else {
        domain
    };
    format!("{domain}\\{username}").to_lowercase()
}
