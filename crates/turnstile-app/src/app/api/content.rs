//! Repository content addressed by the request path.

use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Response, Router, handler};
use serde_json::json;
use turnstile_service::auth::{Challenge, Decision};

use crate::middleware::auth::{execute, render_error};
use crate::middleware::context::{get_bound_identity, get_pipeline_parts};
use crate::middleware::depot_keys;

/// ## Summary
/// Describes the content item at the request path.
///
/// A request authorization deferred to this handler is answered here: file
/// clients without an authenticated identity get a Basic challenge.
#[handler]
async fn content(depot: &Depot, res: &mut Response) {
    let (parts, identity) = match get_pipeline_parts(depot)
        .and_then(|parts| Ok((parts, get_bound_identity(depot)?)))
    {
        Ok(found) => found,
        Err(err) => return render_error(res, &err),
    };
    let deferred = depot.get::<bool>(depot_keys::DEFERRED).is_ok_and(|flag| *flag);

    if deferred && parts.ctx.flags().file_access && !identity.is_authenticated() {
        tracing::debug!(url = %parts.ctx.url(), "Challenging deferred file client");
        execute(
            &Decision::Challenge(Challenge::Basic),
            &parts.settings.auth.realm,
            res,
        );
        return;
    }

    match parts.pipeline.load_resource(&parts.ctx).await {
        Ok(Some(resource)) => res.render(Json(json!({
            "resource": resource,
            "identity": identity.full_name(),
            "deferred": deferred,
        }))),
        Ok(None) => {
            res.status_code(StatusCode::NOT_FOUND);
        }
        Err(err) => render_error(res, &err.into()),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("{**path}").goal(content)
}
