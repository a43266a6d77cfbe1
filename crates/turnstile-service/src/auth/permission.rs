//! Permission kinds evaluated against repository content.

/// Content permissions checked by the pipeline and the action guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    /// Know that the content exists.
    See,
    /// View generated preview images of a document.
    Preview,
    /// Read the content's major versions.
    Open,
    /// Read minor and unapproved versions.
    OpenMinor,
    Save,
    Delete,
}

impl PermissionKind {
    /// Returns the Casbin action string for this permission.
    #[must_use]
    pub const fn as_casbin_action(self) -> &'static str {
        match self {
            Self::See => "see",
            Self::Preview => "preview",
            Self::Open => "open",
            Self::OpenMinor => "open_minor",
            Self::Save => "save",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_casbin_action())
    }
}

/// Outcome of a single permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionValue {
    Allowed,
    Denied,
}

impl PermissionValue {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl From<bool> for PermissionValue {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }
}
