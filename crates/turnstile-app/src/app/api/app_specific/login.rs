//! Forms sign-in page.

use salvo::http::StatusCode;
use salvo::http::cookie::Cookie;
use salvo::http::header::LOCATION;
use salvo::{Depot, Request, Response, Router, handler};
use turnstile_core::constants::{LOGIN_ROUTE_COMPONENT, ORIGINAL_URL_QUERY_PARAM};

use crate::middleware::auth::render_error;
use crate::middleware::context::get_pipeline_parts;

const LOGIN_PROMPT: &str = "POST username and password as a form to sign in.";

#[handler]
async fn login_prompt() -> &'static str {
    LOGIN_PROMPT
}

/// ## Summary
/// POST /app/login - Signs a user in with a form-encoded username and password
///
/// ## Side Effects
/// Issues a forms ticket and sets it as an HTTP-only cookie.
///
/// ## Errors
/// Returns HTTP 400 when a field is missing and 401 when the credential is
/// rejected.
#[handler]
async fn login(req: &mut Request, depot: &Depot, res: &mut Response) {
    let parts = match get_pipeline_parts(depot) {
        Ok(parts) => parts,
        Err(err) => return render_error(res, &err),
    };

    let username = req.form::<String>("username").await;
    let password = req.form::<String>("password").await;
    let (Some(username), Some(password)) = (username, password) else {
        res.status_code(StatusCode::BAD_REQUEST);
        res.render("username and password are required");
        return;
    };

    let ticket = match parts.pipeline.sign_in(&parts.ctx, &username, &password).await {
        Ok(Some(ticket)) => ticket,
        Ok(None) => {
            tracing::info!(%username, "Sign-in rejected");
            res.status_code(StatusCode::UNAUTHORIZED);
            res.render("Invalid username or password");
            return;
        }
        Err(err) => return render_error(res, &err.into()),
    };

    let requested = req
        .form::<String>(ORIGINAL_URL_QUERY_PARAM)
        .await
        .or_else(|| parts.ctx.url().query_param(ORIGINAL_URL_QUERY_PARAM));
    let target = safe_return_url(requested.as_deref(), &parts.ctx.url().origin());

    tracing::info!(%username, %target, "Signed in");
    res.add_cookie(
        Cookie::build((parts.settings.auth.forms.cookie_name.clone(), ticket))
            .path("/")
            .http_only(true)
            .build(),
    );
    res.status_code(StatusCode::FOUND);
    if let Err(err) = res.add_header(LOCATION, target.as_str(), true) {
        tracing::warn!(error = ?err, %target, "Return url is not a valid header value");
        res.status_code(StatusCode::OK);
    }
}

/// Keeps sign-in redirects on this origin; anything else returns to `/`.
fn safe_return_url(requested: Option<&str>, origin: &str) -> String {
    let Some(target) = requested.filter(|target| !target.is_empty()) else {
        return "/".to_string();
    };

    let same_origin = target
        .strip_prefix(origin)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    let relative = target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\");

    if same_origin || relative {
        target.to_string()
    } else {
        "/".to_string()
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(LOGIN_ROUTE_COMPONENT)
        .get(login_prompt)
        .post(login)
}
