//! Authentication hoops.
//!
//! Register them in this order so the end-request hoop wraps the others:
//! [`EndRequestHoop`], [`AuthenticateHoop`], [`AuthorizeHoop`].

use std::sync::Arc;

use salvo::http::StatusCode;
use salvo::http::header::{LOCATION, WWW_AUTHENTICATE};
use salvo::prelude::Json;
use salvo::{Depot, FlowCtrl, Request, Response};
use serde_json::json;
use tracing::error;
use turnstile_core::types::AuthScheme;
use turnstile_service::auth::{AuthorizeState, Challenge, Decision};

use crate::config::get_config_from_depot;
use crate::error::AppError;
use crate::pipeline_handler::get_pipeline_from_depot;

use super::context::{get_bound_identity, get_pipeline_parts, request_context};
use super::depot_keys;

/// ## Summary
/// Writes an error that ends the request.
///
/// Failed permission assertions answer 403 with the reason; anything else
/// is a 500 without details.
pub fn render_error(res: &mut Response, err: &AppError) {
    let status = err.status_code();
    if status == StatusCode::FORBIDDEN {
        tracing::warn!(error = %err, "Request rejected");
        res.status_code(status);
        res.render(Json(json!({ "error": "forbidden", "message": err.to_string() })));
    } else {
        error!(error = ?err, "Authentication pipeline failed");
        res.status_code(status);
        res.render("Internal Server Error");
    }
}

/// ## Summary
/// Writes a terminal decision to the response.
///
/// `Allow` and `Deferred` leave the response untouched.
pub fn execute(decision: &Decision, realm: &str, res: &mut Response) {
    match decision {
        Decision::Allow | Decision::Deferred => return,
        Decision::Redirect(location) => {
            res.status_code(StatusCode::FOUND);
            if let Err(err) = res.add_header(LOCATION, location.as_str(), true) {
                error!(error = ?err, %location, "Invalid redirect location");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        Decision::Status(code) => {
            res.status_code(StatusCode::from_u16(*code).unwrap_or(StatusCode::FORBIDDEN));
        }
        Decision::Forbidden => {
            res.status_code(StatusCode::FORBIDDEN);
            res.render(Json(json!({
                "error": "forbidden",
                "message": "Access to the requested content is denied",
            })));
        }
        Decision::Challenge(Challenge::Basic) => {
            res.status_code(StatusCode::UNAUTHORIZED);
            if res
                .add_header(WWW_AUTHENTICATE, format!("Basic realm=\"{realm}\""), true)
                .is_err()
            {
                tracing::warn!(%realm, "Realm is not a valid header value, challenging without it");
            }
        }
        Decision::Challenge(Challenge::AccessDenied) => {
            res.status_code(StatusCode::UNAUTHORIZED);
            res.render("Access denied");
        }
    }

    tracing::debug!(state = ?AuthorizeState::Executed, ?decision, "Decision executed");
}

/// ## Summary
/// Builds the request context, runs the rest of the chain, then closes the
/// request with the final status.
pub struct EndRequestHoop;

#[salvo::async_trait]
impl salvo::Handler for EndRequestHoop {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let (settings, pipeline) = match (get_config_from_depot(depot), get_pipeline_from_depot(depot))
        {
            (Ok(settings), Ok(pipeline)) => (settings, pipeline),
            (Err(err), _) | (_, Err(err)) => {
                render_error(res, &err);
                ctrl.skip_rest();
                return;
            }
        };

        let ctx = Arc::new(request_context(req, &settings));
        depot.inject(Arc::clone(&ctx));

        ctrl.call_next(req, depot, res).await;

        let status = res.status_code.unwrap_or(StatusCode::OK).as_u16();
        let scheme = depot
            .get::<AuthScheme>(depot_keys::AUTH_SCHEME)
            .ok()
            .copied();
        if let Err(err) = pipeline.end_request(&ctx, scheme, status).await {
            tracing::warn!(error = %err, "End of request handling failed");
        }
    }
}

/// ## Summary
/// Binds the request's identity.
///
/// ## Side Effects
/// Stores the identity under [`depot_keys::BOUND_IDENTITY`] and the scheme
/// under [`depot_keys::AUTH_SCHEME`]. Ends the request when authentication
/// decided to deny it.
pub struct AuthenticateHoop;

#[salvo::async_trait]
impl salvo::Handler for AuthenticateHoop {
    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        _req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let parts = match get_pipeline_parts(depot) {
            Ok(parts) => parts,
            Err(err) => {
                render_error(res, &err);
                ctrl.skip_rest();
                return;
            }
        };

        match parts.pipeline.authenticate(&parts.ctx).await {
            Ok(auth) => {
                tracing::debug!(identity = %auth.identity.full_name(), scheme = ?auth.scheme, "Identity bound");
                if let Some(scheme) = auth.scheme {
                    depot.insert(depot_keys::AUTH_SCHEME, scheme);
                }
                depot.insert(depot_keys::BOUND_IDENTITY, auth.identity);

                if let Some(decision) = auth.decision {
                    execute(&decision, &parts.settings.auth.realm, res);
                    ctrl.skip_rest();
                }
            }
            Err(err) => {
                render_error(res, &err.into());
                ctrl.skip_rest();
            }
        }
    }
}

/// ## Summary
/// Authorizes the bound identity for the requested content.
///
/// ## Side Effects
/// Sets [`depot_keys::DEFERRED`] when the response is left to the
/// downstream handler; ends the request for any other denial.
pub struct AuthorizeHoop;

#[salvo::async_trait]
impl salvo::Handler for AuthorizeHoop {
    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        _req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let (parts, identity) = match get_pipeline_parts(depot)
            .and_then(|parts| Ok((parts, get_bound_identity(depot)?)))
        {
            Ok(found) => found,
            Err(err) => {
                render_error(res, &err);
                ctrl.skip_rest();
                return;
            }
        };

        match parts.pipeline.authorize(&parts.ctx, &identity).await {
            Ok(Decision::Allow) => {}
            Ok(Decision::Deferred) => {
                depot.insert(depot_keys::DEFERRED, true);
            }
            Ok(decision) => {
                execute(&decision, &parts.settings.auth.realm, res);
                ctrl.skip_rest();
            }
            Err(err) => {
                render_error(res, &err.into());
                ctrl.skip_rest();
            }
        }
    }
}
