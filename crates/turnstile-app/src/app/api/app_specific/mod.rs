use salvo::Router;
use turnstile_core::constants::APP_ROUTE_COMPONENT;

mod healthcheck;
mod login;
mod status;
mod whoami;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(APP_ROUTE_COMPONENT)
        .push(healthcheck::routes())
        .push(status::routes())
        .push(whoami::routes())
        .push(login::routes())
}
