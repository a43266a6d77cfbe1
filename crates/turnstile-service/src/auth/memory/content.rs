use std::collections::HashMap;

use salvo::async_trait;
use tokio::sync::RwLock;
use turnstile_core::constants::REPOSITORY_ROOT_PATH;
use uuid::Uuid;

use crate::auth::resource::{ResourceRef, normalize_repository_path};
use crate::auth::store::ContentStore;
use crate::error::ServiceResult;

/// Content heads keyed by case-insensitive path.
///
/// Ids are UUID v5 of the lowercased path, so they are stable across restarts.
pub struct MemoryContentStore {
    items: RwLock<HashMap<String, ResourceRef>>,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    /// A store holding only the repository root.
    #[must_use]
    pub fn new() -> Self {
        let root = head_for(REPOSITORY_ROOT_PATH);
        Self {
            items: RwLock::new(HashMap::from([(root.path.to_lowercase(), root)])),
        }
    }

    /// Adds a content item; returns its head.
    pub async fn insert(&self, path: &str) -> ResourceRef {
        let head = head_for(&normalize_repository_path(path));
        tracing::debug!(path = %head.path, content_type = %head.content_type, "Adding content");
        self.items
            .write()
            .await
            .insert(head.path.to_lowercase(), head.clone());
        head
    }
}

fn head_for(path: &str) -> ResourceRef {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, path.to_lowercase().as_bytes());
    ResourceRef::new(id, path, content_type_for(path))
}

fn content_type_for(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    let name = lower.rsplit('/').next().unwrap_or_default();

    if lower == REPOSITORY_ROOT_PATH.to_lowercase() {
        "PortalRoot"
    } else if lower.contains("/previews/") && name.ends_with(".png") {
        "PreviewImage"
    } else if name.contains('.') {
        "File"
    } else {
        "Folder"
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn load_head(&self, path: &str) -> ServiceResult<Option<ResourceRef>> {
        let key = normalize_repository_path(path).to_lowercase();
        Ok(self.items.read().await.get(&key).cloned())
    }
}
