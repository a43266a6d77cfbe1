use salvo::prelude::Json;
use salvo::{Depot, Response, Router, handler};
use serde_json::json;
use turnstile_core::constants::STATUS_ROUTE_COMPONENT;

use crate::config::get_config_from_depot;
use crate::middleware::auth::render_error;

/// ## Summary
/// Reports the configured authentication modes.
#[handler]
async fn status(depot: &Depot, res: &mut Response) {
    let settings = match get_config_from_depot(depot) {
        Ok(settings) => settings,
        Err(err) => return render_error(res, &err),
    };

    let sites: Vec<_> = settings
        .sites
        .iter()
        .map(|site| json!({ "name": site.name, "auth_mode": site.auth_mode }))
        .collect();

    res.render(Json(json!({
        "status": "ok",
        "default_mode": settings.auth.default_mode,
        "sites": sites,
    })));
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(STATUS_ROUTE_COMPONENT).get(status)
}
