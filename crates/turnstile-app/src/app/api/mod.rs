mod app_specific;
mod content;

use salvo::Router;

use crate::middleware::auth::{AuthenticateHoop, AuthorizeHoop, EndRequestHoop};

pub use turnstile_core::constants::{APP_ROUTE_COMPONENT, APP_ROUTE_PREFIX};

/// ## Summary
/// Constructs the router: application endpoints under `/app`, repository
/// content everywhere else, all behind the authentication hoops.
///
/// Expects [`crate::config::ConfigHandler`] and
/// [`crate::pipeline_handler::PipelineHandler`] to be hooped above it.
#[must_use]
pub fn routes() -> Router {
    Router::new()
        .hoop(EndRequestHoop)
        .hoop(AuthenticateHoop)
        .hoop(AuthorizeHoop)
        .push(app_specific::routes())
        .push(content::routes())
}
