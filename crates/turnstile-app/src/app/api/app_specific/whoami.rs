use salvo::prelude::Json;
use salvo::{Depot, Router, handler};
use serde_json::json;

use turnstile_core::constants::WHOAMI_ROUTE_COMPONENT;
use turnstile_core::types::AuthScheme;

use crate::middleware::context::get_bound_identity;
use crate::middleware::depot_keys;

/// ## Summary
/// Returns the request's bound identity as JSON.
/// The identity is retrieved from the depot set by the `AuthenticateHoop`.
#[handler]
async fn whoami(depot: &Depot) -> Json<serde_json::Value> {
    let scheme = depot.get::<AuthScheme>(depot_keys::AUTH_SCHEME).ok().copied();
    match get_bound_identity(depot) {
        Ok(identity) => Json(json!({
            "identity": serde_json::to_value(&*identity).unwrap_or(json!(null)),
            "full_name": identity.full_name(),
            "authenticated": identity.is_authenticated(),
            "scheme": scheme,
        })),
        Err(_) => Json(json!({"error":"Identity not found in depot"})),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(WHOAMI_ROUTE_COMPONENT).get(whoami)
}
