use std::time::Duration;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::REPOSITORY_ROOT_PATH;
use crate::error::{CoreError, CoreResult};
use crate::types::AuthScheme;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Mode used when the request's site does not configure one.
    pub default_mode: Option<AuthScheme>,
    /// Login page used by forms sites without their own.
    pub login_page: Option<String>,
    /// Realm announced in Basic challenges.
    pub realm: String,
    pub windows: WindowsAuthConfig,
    pub forms: FormsAuthConfig,
    /// Domains whose users are materialized from the directory instead of the identity store.
    #[serde(default)]
    pub virtual_user_domains: Vec<String>,
}

/// Headers set by the trusted upstream that performed integrated authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowsAuthConfig {
    pub user_header: String,
    pub auth_type_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormsAuthConfig {
    pub cookie_name: String,
    /// Idle seconds after which a ticket lapses.
    pub ticket_ttl_secs: u64,
}

impl FormsAuthConfig {
    #[must_use]
    pub const fn ticket_ttl(&self) -> Duration {
        Duration::from_secs(self.ticket_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    pub auth_mode: Option<AuthScheme>,
    pub login_page: Option<String>,
    #[serde(default = "default_repository_path")]
    pub repository_path: String,
}

impl SiteConfig {
    /// ## Summary
    /// Returns `true` if `authority` (`host` or `host:port`) is bound to this site.
    #[must_use]
    pub fn serves_host(&self, authority: &str) -> bool {
        let host_only = authority
            .rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map_or(authority, |(host, _)| host);

        self.hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(authority) || h.eq_ignore_ascii_case(host_only))
    }
}

fn default_repository_path() -> String {
    REPOSITORY_ROOT_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
}

impl ServerConfig {
    /// `host:port` the listener binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// Public origin of the server: `serve_origin` when set, otherwise
    /// derived from the bind address.
    #[must_use]
    pub fn origin(&self) -> String {
        self.serve_origin
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind_address()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Initial content of the in-memory stores.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    /// Casbin policy CSV; policies are kept in memory when absent.
    pub policy_file: Option<String>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub content: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    #[serde(default)]
    pub domain: String,
    pub username: String,
    /// Argon2 PHC string, as printed by the `hash_password` binary.
    pub password_hash: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub administrator: bool,
}

const fn enabled_by_default() -> bool {
    true
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                // TOML file
                .add_source(config::File::with_name("config.toml").required(false))
                // Environment overrides the file
                .add_source(
                    config::Environment::with_prefix("TURNSTILE")
                        .prefix_separator("_")
                        .separator("__")
                        .ignore_empty(true)
                        .try_parsing(true),
                ),
        )
    }

    /// ## Summary
    /// Applies defaults on top of the given sources, then deserializes and validates.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be set, deserialization fails, or
    /// validation rejects the result.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("logging.level", "debug")?
            .set_default("auth.realm", "turnstile")?
            .set_default("auth.windows.user_header", "x-remote-user")?
            .set_default("auth.windows.auth_type_header", "x-remote-auth-type")?
            .set_default("auth.forms.cookie_name", "turnstile_auth")?
            .set_default("auth.forms.ticket_ttl_secs", 1800)?
            .build()?
            .try_deserialize::<Self>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// ## Errors
    /// Returns `ConfigError` for sites without a name, repository paths outside
    /// the repository root, or hosts bound to more than one site.
    pub fn validate(&self) -> CoreResult<()> {
        let mut seen_hosts: Vec<String> = Vec::new();

        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(CoreError::ConfigError("Site name must not be empty".to_string()));
            }

            if !site
                .repository_path
                .to_ascii_lowercase()
                .starts_with(&REPOSITORY_ROOT_PATH.to_ascii_lowercase())
            {
                return Err(CoreError::ConfigError(format!(
                    "Site '{}' has repository path '{}' outside {REPOSITORY_ROOT_PATH}",
                    site.name, site.repository_path
                )));
            }

            for host in &site.hosts {
                let host = host.to_ascii_lowercase();
                if seen_hosts.contains(&host) {
                    return Err(CoreError::ConfigError(format!(
                        "Host '{host}' is bound to more than one site"
                    )));
                }
                seen_hosts.push(host);
            }
        }

        Ok(())
    }

    /// ## Summary
    /// Finds the site bound to the request authority.
    #[must_use]
    pub fn site_for_host(&self, authority: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.serves_host(authority))
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
