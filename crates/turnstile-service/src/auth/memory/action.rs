use std::sync::Arc;

use crate::auth::identity::Identity;
use crate::auth::permission::PermissionKind;
use crate::auth::resource::ResourceRef;
use crate::auth::store::{ActionPermission, PermissionEvaluator};
use crate::error::ServiceResult;

/// ## Summary
/// Content permission an application action requires.
///
/// Returns `None` for unknown actions.
#[must_use]
pub fn required_permission(action: Option<&str>) -> Option<PermissionKind> {
    match action.map(str::to_ascii_lowercase).as_deref() {
        None | Some("browse") => Some(PermissionKind::See),
        Some("edit") => Some(PermissionKind::Save),
        Some("delete") => Some(PermissionKind::Delete),
        Some(_) => None,
    }
}

/// Action permission derived from the content permission each action requires.
pub struct PermissionActionGuard {
    permissions: Arc<dyn PermissionEvaluator>,
}

impl PermissionActionGuard {
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionEvaluator>) -> Self {
        Self { permissions }
    }
}

impl ActionPermission for PermissionActionGuard {
    fn check(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
        action: Option<&str>,
    ) -> ServiceResult<bool> {
        let Some(kind) = required_permission(action) else {
            tracing::debug!(?action, "Unknown action");
            return Ok(false);
        };

        Ok(self
            .permissions
            .get_permission(identity, &resource.path, kind)?
            .is_allowed())
    }
}
