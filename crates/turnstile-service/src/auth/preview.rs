//! Preview images generated for document versions.
//!
//! Images live under their document:
//! `<document>/Previews/V<major>.<minor>.<status>/(preview|thumbnail)<n>.png`.

use std::sync::Arc;

use crate::error::ServiceResult;

use super::identity::Identity;
use super::permission::{PermissionKind, PermissionValue};
use super::resource::ResourceRef;
use super::store::{PermissionEvaluator, PreviewProvider};

const PREVIEWS_FOLDER: &str = "Previews";
const APPROVED_STATUS: &str = "A";

/// Location of a preview image, parsed from its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLocation<'a> {
    pub document_path: &'a str,
    pub major: u32,
    pub minor: u32,
    pub status: &'a str,
    pub page: u32,
}

impl<'a> PreviewLocation<'a> {
    /// Returns `None` for paths that are not preview images.
    #[must_use]
    pub fn parse(path: &'a str) -> Option<Self> {
        let (rest, file_name) = path.rsplit_once('/')?;
        let (rest, version) = rest.rsplit_once('/')?;
        let (document_path, folder) = rest.rsplit_once('/')?;

        if !folder.eq_ignore_ascii_case(PREVIEWS_FOLDER) || document_path.is_empty() {
            return None;
        }

        let mut version_parts = version.strip_prefix(['V', 'v'])?.splitn(3, '.');
        let major = version_parts.next()?.parse().ok()?;
        let minor = version_parts.next()?.parse().ok()?;
        let status = version_parts.next()?;

        let stem = file_name
            .strip_suffix(".png")
            .or_else(|| file_name.strip_suffix(".PNG"))?;
        let page = stem
            .strip_prefix("preview")
            .or_else(|| stem.strip_prefix("thumbnail"))?
            .parse()
            .ok()?;

        Some(Self {
            document_path,
            major,
            minor,
            status,
            page,
        })
    }

    /// Major approved versions are readable by anyone who can open the document.
    #[must_use]
    pub fn is_major_approved(&self) -> bool {
        self.minor == 0 && self.status.eq_ignore_ascii_case(APPROVED_STATUS)
    }
}

/// Preview provider that derives version visibility from the image path.
pub struct VersionedPreviewProvider {
    permissions: Arc<dyn PermissionEvaluator>,
}

impl VersionedPreviewProvider {
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionEvaluator>) -> Self {
        Self { permissions }
    }
}

impl PreviewProvider for VersionedPreviewProvider {
    fn is_preview_image(&self, resource: &ResourceRef) -> bool {
        PreviewLocation::parse(&resource.path).is_some()
    }

    fn is_preview_accessible(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
    ) -> ServiceResult<bool> {
        let Some(location) = PreviewLocation::parse(&resource.path) else {
            return Ok(true);
        };

        if location.is_major_approved() {
            return Ok(true);
        }

        let value = self.permissions.get_permission(
            identity,
            location.document_path,
            PermissionKind::OpenMinor,
        )?;
        tracing::trace!(
            document = %location.document_path,
            major = location.major,
            minor = location.minor,
            status = %location.status,
            ?value,
            "Minor version preview check"
        );
        Ok(value == PermissionValue::Allowed)
    }

    fn has_preview_permission(
        &self,
        identity: &Identity,
        resource: &ResourceRef,
    ) -> ServiceResult<bool> {
        let document_path = PreviewLocation::parse(&resource.path)
            .map_or(resource.path.as_str(), |location| location.document_path);

        Ok(self
            .permissions
            .get_permission(identity, document_path, PermissionKind::Preview)?
            .is_allowed())
    }
}
