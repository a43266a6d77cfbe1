//! Repository content addressed by a request.

use serde::Serialize;
use turnstile_core::constants::REPOSITORY_ROOT_PATH;
use uuid::Uuid;

/// Head of a content item: enough to evaluate permissions without loading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub id: Uuid,
    pub path: String,
    pub content_type: String,
}

impl ResourceRef {
    #[must_use]
    pub fn new(id: Uuid, path: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    /// Returns `true` for the repository root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.eq_ignore_ascii_case(REPOSITORY_ROOT_PATH)
    }
}

/// ## Summary
/// Normalizes a repository path: single leading slash, no trailing slash,
/// no empty segments.
#[must_use]
pub fn normalize_repository_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}
