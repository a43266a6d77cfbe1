//! Per-request context shared by both pipeline phases.

use salvo::http::{HeaderMap, Method};
use turnstile_core::config::SiteConfig;
use turnstile_core::constants::{ACTION_QUERY_PARAM, LOCAL_DIAGNOSTIC_PATHS, REPOSITORY_ROOT_PATH};

use crate::url::percent_decode;

use super::elevation::SecurityContext;
use super::protocol::{ODataRequest, ProtocolFlags, strip_prefix_ignore_case};
use super::resource::normalize_repository_path;

/// The requested URL, split into the parts the pipeline compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    scheme: String,
    authority: String,
    path: String,
    query: Option<String>,
}

impl RequestUrl {
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
        query: Option<String>,
    ) -> Self {
        let path = path.into();
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path: if path.is_empty() { "/".to_string() } else { path },
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// `scheme://authority`
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path as sent, still escaped.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path with escapes decoded.
    #[must_use]
    pub fn local_path(&self) -> String {
        percent_decode(&self.path)
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Origin and decoded path, without the query string.
    #[must_use]
    pub fn without_query_unescaped(&self) -> String {
        format!("{}{}", self.origin(), self.local_path())
    }

    /// First value of a query parameter, decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .as_deref()?
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key == name).then(|| percent_decode(&value.replace('+', " ")))
            })
            .next()
    }
}

impl std::fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Everything the pipeline knows about a request.
///
/// Built once by the HTTP layer and passed explicitly to every phase.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    url: RequestUrl,
    headers: HeaderMap,
    site: Option<SiteConfig>,
    flags: ProtocolFlags,
    odata: Option<ODataRequest>,
    is_local: bool,
    security: SecurityContext,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, url: RequestUrl, headers: HeaderMap) -> Self {
        let local_path = url.local_path();
        let flags = ProtocolFlags::detect(&method, &local_path, &headers);
        let odata = ODataRequest::parse(&local_path);
        Self {
            method,
            url,
            headers,
            site: None,
            flags,
            odata,
            is_local: false,
            security: SecurityContext::new(),
        }
    }

    #[must_use]
    pub fn with_site(mut self, site: Option<SiteConfig>) -> Self {
        self.site = site;
        self
    }

    /// Marks the request as coming from the local host.
    #[must_use]
    pub fn with_local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub const fn url(&self) -> &RequestUrl {
        &self.url
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn site(&self) -> Option<&SiteConfig> {
        self.site.as_ref()
    }

    #[must_use]
    pub fn site_name(&self) -> Option<&str> {
        self.site.as_ref().map(|site| site.name.as_str())
    }

    #[must_use]
    pub const fn flags(&self) -> &ProtocolFlags {
        &self.flags
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.is_local
    }

    #[must_use]
    pub const fn security(&self) -> &SecurityContext {
        &self.security
    }

    /// The `?action=` query value.
    #[must_use]
    pub fn action(&self) -> Option<String> {
        self.url
            .query_param(ACTION_QUERY_PARAM)
            .filter(|action| !action.is_empty())
    }

    /// ## Summary
    /// Maps the request to a repository path.
    ///
    /// `/Root...` paths are used verbatim, OData paths address their entity,
    /// and anything else lives under the site's repository path.
    #[must_use]
    pub fn repository_path(&self) -> String {
        if let Some(odata) = &self.odata {
            return normalize_repository_path(&odata.repository_path());
        }

        let local_path = self.url.local_path();
        let under_root = strip_prefix_ignore_case(&local_path, REPOSITORY_ROOT_PATH)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if under_root {
            return normalize_repository_path(&local_path);
        }

        let base = self
            .site
            .as_ref()
            .map_or(REPOSITORY_ROOT_PATH, |site| site.repository_path.as_str());
        normalize_repository_path(&format!("{base}/{local_path}"))
    }

    /// ## Summary
    /// Absolute login page URL: the site's page, else the global one.
    ///
    /// Relative pages are resolved against the request origin.
    #[must_use]
    pub fn login_page_url(&self, global: Option<&str>) -> Option<String> {
        let page = self
            .site
            .as_ref()
            .and_then(|site| site.login_page.as_deref())
            .or(global)
            .filter(|page| !page.trim().is_empty())?;

        if page.starts_with("http://") || page.starts_with("https://") {
            return Some(page.to_string());
        }

        let separator = if page.starts_with('/') { "" } else { "/" };
        Some(format!("{}{separator}{page}", self.url.origin()))
    }

    /// Local requests for a diagnostic endpoint are served without a negotiated identity.
    #[must_use]
    pub fn is_local_diagnostic_request(&self) -> bool {
        if !self.is_local {
            return false;
        }
        let path = self.url.local_path();
        LOCAL_DIAGNOSTIC_PATHS
            .iter()
            .any(|diagnostic| path.eq_ignore_ascii_case(diagnostic))
    }
}
