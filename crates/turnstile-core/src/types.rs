use serde::{Deserialize, Serialize};

/// Authentication scheme applied to a request.
///
/// Sites choose between `Windows`, `Forms` and `None`. `Basic` is never a
/// site mode; it is detected from the `Authorization` header before the
/// site mode is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    Windows,
    Forms,
    Basic,
    None,
}

impl AuthScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Forms => "forms",
            Self::Basic => "basic",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
