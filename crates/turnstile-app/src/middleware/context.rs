//! Request context construction and depot accessors.

use std::sync::Arc;

use salvo::http::header::HOST;
use salvo::{Depot, Request};
use turnstile_core::config::Settings;
use turnstile_core::error::CoreError;
use turnstile_service::auth::{AuthPipeline, BoundIdentity, RequestContext, RequestUrl};

use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::pipeline_handler::get_pipeline_from_depot;

use super::depot_keys;

/// ## Summary
/// Builds the pipeline context for a request.
///
/// The authority comes from the `Host` header, then the request URI, then
/// the configured origin. The site is looked up by that authority.
#[must_use]
pub fn request_context(req: &Request, settings: &Settings) -> RequestContext {
    let origin = settings.server.origin();
    let (default_scheme, default_authority) =
        origin.split_once("://").unwrap_or(("http", origin.as_str()));

    let authority = req
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(ToString::to_string))
        .unwrap_or_else(|| default_authority.to_string());
    let scheme = req.uri().scheme_str().unwrap_or(default_scheme);

    let url = RequestUrl::new(
        scheme,
        authority.as_str(),
        req.uri().path(),
        req.uri().query().map(str::to_string),
    );
    let site = settings.site_for_host(&authority).cloned();
    tracing::trace!(%url, site = ?site.as_ref().map(|site| &site.name), "Request context built");

    RequestContext::new(req.method().clone(), url, req.headers().clone())
        .with_site(site)
        .with_local(is_loopback(req))
}

fn is_loopback(req: &Request) -> bool {
    let addr = req.remote_addr();
    addr.as_ipv4().is_some_and(|v4| v4.ip().is_loopback())
        || addr.as_ipv6().is_some_and(|v6| v6.ip().is_loopback())
}

/// ## Summary
/// Retrieves the request context stored by the end-request hoop.
///
/// ## Errors
/// Returns an error if no context is stored.
pub fn get_request_context(depot: &Depot) -> AppResult<Arc<RequestContext>> {
    depot
        .obtain::<Arc<RequestContext>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Request context not found in depot").into())
}

/// ## Summary
/// Retrieves the identity bound by the authenticate hoop.
///
/// ## Errors
/// Returns an error if no identity is bound.
pub fn get_bound_identity(depot: &Depot) -> AppResult<BoundIdentity> {
    depot
        .get::<BoundIdentity>(depot_keys::BOUND_IDENTITY)
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Bound identity not found in depot").into())
}

/// Everything a hoop or handler needs from the depot.
pub struct PipelineParts {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<AuthPipeline>,
    pub ctx: Arc<RequestContext>,
}

/// ## Summary
/// Retrieves the configuration, pipeline and request context together.
///
/// ## Errors
/// Returns an error if any of them is missing from the depot.
pub fn get_pipeline_parts(depot: &Depot) -> AppResult<PipelineParts> {
    Ok(PipelineParts {
        settings: get_config_from_depot(depot)?,
        pipeline: get_pipeline_from_depot(depot)?,
        ctx: get_request_context(depot)?,
    })
}
