//! Forms sites: login redirects, the sign-in page and forms tickets.

use salvo::http::StatusCode;

use super::helpers::*;

/// ## Summary
/// An anonymous browser asking for protected content is sent to the login
/// page with the requested URL attached.
#[test_log::test(tokio::test)]
async fn anonymous_browser_is_redirected_to_login() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/private.txt?a=b")
        .send(&service)
        .await
        .assert_status(StatusCode::FOUND)
        .assert_header_contains("location", "http://portal.local/app/login/?OriginalUrl=")
        .assert_header_contains("location", "private.txt");
}

#[test_log::test(tokio::test)]
async fn public_content_is_served_to_visitors() {
    let service = create_test_service().await;

    let response = TestRequest::get(PORTAL, "/public/welcome.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);

    let body = response.json();
    assert_eq!(body["resource"]["path"], "/Root/Sites/Portal/public/welcome.txt");
    assert_eq!(body["identity"], "BuiltIn\\Visitor");
}

#[test_log::test(tokio::test)]
async fn login_page_renders_a_prompt() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/app/login")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body_contains("username and password");
}

#[test_log::test(tokio::test)]
async fn rejected_sign_in_is_unauthorized() {
    let service = create_test_service().await;

    let response = TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Calice&password=wrong")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert!(response.ticket_cookie().is_none());

    TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Cmallory&password=secret")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Calice")
        .send(&service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// ## Summary
/// Signing in issues a ticket cookie and returns to the original URL; the
/// ticket then authenticates later requests.
#[test_log::test(tokio::test)]
async fn sign_in_ticket_opens_member_content() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/members/news.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::FOUND);

    let response = TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Calice&password=secret&OriginalUrl=%2Fmembers%2Fnews.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::FOUND)
        .assert_header("location", "/members/news.txt")
        .assert_header_contains("set-cookie", "HttpOnly");
    let ticket = response
        .ticket_cookie()
        .expect("Sign-in should set the ticket cookie");

    let body = TestRequest::get(PORTAL, "/members/news.txt")
        .ticket(&ticket)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["identity"], "CORP\\alice");

    let whoami = TestRequest::get(PORTAL, "/app/whoami")
        .ticket(&ticket)
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["full_name"], "CORP\\alice");
    assert_eq!(whoami["scheme"], "forms");
    assert_eq!(whoami["authenticated"], true);
}

#[test_log::test(tokio::test)]
async fn sign_in_never_redirects_off_site() {
    let service = create_test_service().await;

    TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Calice&password=secret&OriginalUrl=http%3A%2F%2Fevil.example%2F")
        .send(&service)
        .await
        .assert_status(StatusCode::FOUND)
        .assert_header("location", "/");
}

/// ## Summary
/// A signed-in user without access gets a plain 403 instead of another
/// trip to the login page.
#[test_log::test(tokio::test)]
async fn signed_in_user_without_access_is_forbidden() {
    let service = create_test_service().await;

    let ticket = TestRequest::post(PORTAL, "/app/login")
        .form_body("username=CORP%5Calice&password=secret")
        .send(&service)
        .await
        .ticket_cookie()
        .expect("Sign-in should set the ticket cookie");

    TestRequest::get(PORTAL, "/private.txt")
        .ticket(&ticket)
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_header_missing("location");
}

#[test_log::test(tokio::test)]
async fn forged_ticket_is_a_visitor() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/members/news.txt")
        .ticket("forged")
        .send(&service)
        .await
        .assert_status(StatusCode::FOUND);
}
