//! Protocol classification of inbound requests.

use salvo::http::header::USER_AGENT;
use salvo::http::{HeaderMap, Method};
use turnstile_core::constants::{
    CRAWLER_HEADER, ODATA_ROUTE_PREFIX, OFFICE_PROTOCOL_PREFIX, REPOSITORY_ROOT_PATH,
};

const WEBDAV_METHODS: [&str; 7] = [
    "PROPFIND",
    "PROPPATCH",
    "MKCOL",
    "COPY",
    "MOVE",
    "LOCK",
    "UNLOCK",
];

/// Sent by WebDAV clients asking for the untranslated source of a resource.
const TRANSLATE_HEADER: &str = "translate";

const FILE_CLIENT_AGENTS: [&str; 3] = ["webdav", "microsoft office", "ms-office"];

/// Per-request protocol flags, derived once from request metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolFlags {
    /// OData API request.
    pub api_query: bool,
    /// WebDAV or office-protocol client; never redirected to an HTML login page.
    pub file_access: bool,
    /// OData request addressing a member of an entity.
    pub member_request: bool,
    /// Flagged file crawler; always served as the visitor.
    pub crawler: bool,
}

impl ProtocolFlags {
    #[must_use]
    pub fn detect(method: &Method, path: &str, headers: &HeaderMap) -> Self {
        let odata = ODataRequest::parse(path);
        let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

        let webdav_method = WEBDAV_METHODS.contains(&method.as_str());
        let translate = header(TRANSLATE_HEADER).is_some_and(|value| value.eq_ignore_ascii_case("f"));
        let file_client = header(USER_AGENT.as_str()).is_some_and(|agent| {
            let agent = agent.to_ascii_lowercase();
            FILE_CLIENT_AGENTS.iter().any(|known| agent.contains(known))
        });
        let office_protocol = path
            .get(..OFFICE_PROTOCOL_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(OFFICE_PROTOCOL_PREFIX));

        Self {
            api_query: odata.is_some(),
            file_access: webdav_method || translate || file_client || office_protocol,
            member_request: odata.is_some_and(|request| request.member.is_some()),
            crawler: header(CRAWLER_HEADER).is_some_and(|value| value.eq_ignore_ascii_case("true")),
        }
    }
}

/// An OData request path: `/odata.svc/<container>('<name>')[/<member>]`.
///
/// A bare container (`/odata.svc/Root/Docs`) addresses a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ODataRequest {
    pub container: String,
    pub name: Option<String>,
    pub member: Option<String>,
}

impl ODataRequest {
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let rest = strip_prefix_ignore_case(path, ODATA_ROUTE_PREFIX)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        let rest = rest.trim_end_matches('/');

        let Some(open) = rest.find("('") else {
            return Some(Self {
                container: rest.to_string(),
                name: None,
                member: None,
            });
        };

        let name_start = open + 2;
        let close = name_start + rest[name_start..].find("')")?;
        let container = rest[..open].to_string();
        let name = rest[name_start..close].replace("''", "'");
        let member = rest[close + 2..]
            .strip_prefix('/')
            .filter(|member| !member.is_empty())
            .map(str::to_string);

        Some(Self {
            container,
            name: Some(name),
            member,
        })
    }

    /// Repository path of the addressed entity or collection.
    #[must_use]
    pub fn repository_path(&self) -> String {
        let container = self.container.trim_end_matches('/');
        match &self.name {
            Some(name) => format!("{container}/{name}"),
            None if container.is_empty() => REPOSITORY_ROOT_PATH.to_string(),
            None => container.to_string(),
        }
    }
}

pub(crate) fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &s[prefix.len()..])
}
