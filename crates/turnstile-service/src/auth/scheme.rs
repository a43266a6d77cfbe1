use turnstile_core::types::AuthScheme;

use crate::error::{ServiceError, ServiceResult};

use super::request::RequestContext;

/// ## Summary
/// Selects the authentication scheme for a request.
///
/// The site's mode wins over the process-wide default.
///
/// ## Errors
/// Returns `InvalidConfiguration` when neither the site nor the process
/// configures a mode.
pub fn select_scheme(ctx: &RequestContext, default: Option<AuthScheme>) -> ServiceResult<AuthScheme> {
    let scheme = ctx
        .site()
        .and_then(|site| site.auth_mode)
        .or(default)
        .ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!(
                "Could not determine the authentication mode for {}: the request does not belong to a site with a mode and no default mode is configured",
                ctx.url().without_query_unescaped()
            ))
        })?;

    tracing::trace!(%scheme, site = ?ctx.site_name(), "Authentication scheme selected");
    Ok(scheme)
}
