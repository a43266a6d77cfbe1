#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building the test configuration and seeded stores
//! - Creating a test Salvo service
//! - Making HTTP requests and asserting on responses

use std::sync::{Arc, OnceLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use salvo::http::header::HeaderName;
use salvo::http::{Method, ReqBody, StatusCode};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt, TestClient};
use string_adapter::StringAdapter;

use turnstile_test::app::pipeline_handler::PipelineHandler;
use turnstile_test::app::seed::seed_services;
use turnstile_test::component::auth::AuthPipeline;
use turnstile_test::component::auth::casbin::init_casbin;
use turnstile_test::component::auth::password::hash_password;
use turnstile_test::component::config::*;
use turnstile_test::component::types::AuthScheme;

pub use tracing;

pub const PORTAL: &str = "portal.local";
pub const INTRANET: &str = "intranet.local";
pub const OPEN: &str = "open.local";

pub const PASSWORD: &str = "secret";

/// Access policies: `p, subject, path glob, role` and `g2, role, permission`.
pub const POLICIES: &str = r"
p, all, /Root/Sites/Portal/public/**, reader
p, all, /Root/Sites/Portal/catalog/**, viewer
p, authenticated, /Root/Sites/Portal/members/**, reader
p, group:corp, /Root/Sites/Intranet/**, reader

g2, viewer, see
g2, reader, see
g2, reader, preview
g2, reader, open
";

pub const CONTENT: [&str; 6] = [
    "/Root/Sites/Portal/public/welcome.txt",
    "/Root/Sites/Portal/catalog/item.txt",
    "/Root/Sites/Portal/members/news.txt",
    "/Root/Sites/Portal/private.txt",
    "/Root/Sites/Intranet/home.html",
    "/Root/Sites/Open/index.html",
];

fn site(name: &str, host: &str, auth_mode: AuthScheme, repository_path: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        hosts: vec![host.to_string()],
        auth_mode: Some(auth_mode),
        login_page: None,
        repository_path: repository_path.to_string(),
    }
}

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("Failed to hash test password"))
        .clone()
}

/// Test configuration - static struct instead of loading from file.
#[must_use]
pub fn test_config() -> Settings {
    let user = |username: &str, enabled: bool| SeedUser {
        domain: "CORP".to_string(),
        username: username.to_string(),
        password_hash: Some(password_hash()),
        enabled,
        administrator: false,
    };

    Settings {
        auth: AuthConfig {
            default_mode: Some(AuthScheme::Forms),
            login_page: Some("/app/login".to_string()),
            realm: "turnstile".to_string(),
            windows: WindowsAuthConfig {
                user_header: "x-remote-user".to_string(),
                auth_type_header: "x-remote-auth-type".to_string(),
            },
            forms: FormsAuthConfig {
                cookie_name: "turnstile_auth".to_string(),
                ticket_ttl_secs: 1800,
            },
            virtual_user_domains: Vec::new(),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5800,
            serve_origin: None,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        sites: vec![
            site("portal", PORTAL, AuthScheme::Forms, "/Root/Sites/Portal"),
            site("intranet", INTRANET, AuthScheme::Windows, "/Root/Sites/Intranet"),
            site("open", OPEN, AuthScheme::None, "/Root/Sites/Open"),
        ],
        seed: SeedConfig {
            policy_file: None,
            users: vec![user("alice", true), user("mallory", false)],
            content: CONTENT.iter().map(ToString::to_string).collect(),
        },
    }
}

/// ## Summary
/// Creates a test service with seeded stores and the full router.
///
/// The service is created fresh each time so issued tickets do not leak
/// between tests.
///
/// ## Panics
/// Panics if the enforcer cannot be created.
pub async fn create_test_service() -> Service {
    let config = test_config();

    let enforcer = init_casbin(StringAdapter::new(POLICIES))
        .await
        .expect("Failed to initialize Casbin enforcer for tests");
    let services = seed_services(&config, enforcer).await;
    let pipeline = Arc::new(AuthPipeline::new(&config.auth, services));

    // Matches the main.rs setup
    let router = Router::new()
        .hoop(ConfigHandler {
            settings: Arc::new(config),
        })
        .hoop(PipelineHandler { pipeline })
        .push(turnstile_test::app::api::routes());

    Service::new(router)
}

/// `Authorization` value for a Basic credential.
#[must_use]
pub fn basic(user_pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(user_pass))
}

/// Test request builder for constructing HTTP requests.
pub struct TestRequest {
    method: Method,
    host: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    /// Creates a new test request for `path` on the site served at `host`.
    #[must_use]
    pub fn new(method: Method, host: &str, path: &str) -> Self {
        Self {
            method,
            host: host.to_string(),
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(host: &str, path: &str) -> Self {
        Self::new(Method::GET, host, path)
    }

    #[must_use]
    pub fn post(host: &str, path: &str) -> Self {
        Self::new(Method::POST, host, path)
    }

    #[must_use]
    pub fn propfind(host: &str, path: &str) -> Self {
        Self::new(
            Method::from_bytes(b"PROPFIND").expect("Valid method"),
            host,
            path,
        )
    }

    /// Adds a header to the request.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets a Basic `Authorization` header.
    #[must_use]
    pub fn basic_auth(self, user_pass: &str) -> Self {
        let value = basic(user_pass);
        self.header("Authorization", &value)
    }

    /// Sets the headers of a negotiated Windows identity.
    #[must_use]
    pub fn negotiated(self, full_name: &str) -> Self {
        self.header("x-remote-user", full_name)
            .header("x-remote-auth-type", "Negotiate")
    }

    /// Presents a forms ticket.
    #[must_use]
    pub fn ticket(self, ticket: &str) -> Self {
        let cookie = format!("turnstile_auth={ticket}");
        self.header("Cookie", &cookie)
    }

    /// Sets an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form_body(mut self, form: &str) -> Self {
        self = self.header("Content-Type", "application/x-www-form-urlencoded");
        self.body = Some(form.as_bytes().to_vec());
        self
    }

    /// Sends the request to the test service and returns the response.
    ///
    /// ## Panics
    /// Panics if the request cannot be sent or the response cannot be read.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://{}{}", self.host, self.path);

        let mut client = match self.method.as_str() {
            "GET" => TestClient::get(&url),
            "POST" => TestClient::post(&url),
            _ => RequestBuilder::new(&url, self.method.clone()),
        };

        for (name, value) in self.headers {
            if let Ok(header_name) = HeaderName::try_from(name.as_str()) {
                client = client.add_header(header_name, value, true);
            }
        }

        if let Some(body_bytes) = self.body {
            client = client.body(ReqBody::Once(body_bytes.into()));
        }

        let mut response = client.send(service).await;

        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body: Vec<u8> = response.take_bytes(None).await.unwrap_or_default().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Asserts that the response status matches the expected code.
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {expected} but got {}: {}",
            self.status,
            self.body_string()
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    #[must_use]
    pub fn assert_header(self, name: &str, expected: &str) -> Self {
        let value = self
            .get_header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found in response"));
        assert_eq!(
            value, expected,
            "Header '{name}' expected '{expected}' but got '{value}'"
        );
        self
    }

    /// Asserts that a header is absent.
    #[must_use]
    pub fn assert_header_missing(self, name: &str) -> Self {
        assert!(
            self.get_header(name).is_none(),
            "Header '{name}' unexpectedly present in response"
        );
        self
    }

    /// Asserts that a header contains the expected substring.
    #[must_use]
    pub fn assert_header_contains(self, name: &str, expected: &str) -> Self {
        let value = self
            .get_header(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found in response"));
        assert!(
            value.contains(expected),
            "Header '{name}' expected to contain '{expected}' but got '{value}'"
        );
        self
    }

    /// Asserts that the response body contains the expected substring.
    #[must_use]
    pub fn assert_body_contains(self, expected: &str) -> Self {
        let body = self.body_string();
        assert!(
            body.contains(expected),
            "Expected body to contain '{expected}' but got:\n{body}"
        );
        self
    }

    /// Returns the body as a UTF-8 string.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    ///
    /// ## Panics
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body should be JSON")
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of the forms ticket cookie set by the response.
    #[must_use]
    pub fn ticket_cookie(&self) -> Option<String> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .filter_map(|(_, v)| v.split(';').next()?.strip_prefix("turnstile_auth="))
            .map(str::to_string)
            .next()
    }
}
