//! Client protocols: Basic credentials, OData, file clients and crawlers.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn basic_credential_binds_the_user_on_a_forms_site() {
    let service = create_test_service().await;

    let body = TestRequest::get(PORTAL, "/members/news.txt")
        .basic_auth("CORP\\alice:secret")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["identity"], "CORP\\alice");

    let whoami = TestRequest::get(PORTAL, "/app/whoami")
        .basic_auth("CORP\\alice:secret")
        .send(&service)
        .await
        .json();
    assert_eq!(whoami["scheme"], "basic");
}

/// ## Summary
/// A bad Basic credential falls back to the visitor instead of failing the
/// request.
#[test_log::test(tokio::test)]
async fn bad_basic_credential_is_the_visitor() {
    let service = create_test_service().await;

    let whoami = TestRequest::get(PORTAL, "/app/whoami")
        .basic_auth("CORP\\alice:wrong")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["full_name"], "BuiltIn\\Visitor");
    assert_eq!(whoami["authenticated"], false);
}

#[test_log::test(tokio::test)]
async fn odata_denial_is_a_json_forbidden() {
    let service = create_test_service().await;

    let response = TestRequest::get(PORTAL, "/odata.svc/Root/Sites/Portal('private.txt')")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_header_missing("location");
    assert_eq!(response.json()["error"], "forbidden");
}

/// ## Summary
/// File clients are never sent to the HTML login page: content a visitor
/// cannot see is challenged for Basic credentials.
#[test_log::test(tokio::test)]
async fn file_client_visitor_is_challenged_for_hidden_content() {
    let service = create_test_service().await;

    TestRequest::propfind(PORTAL, "/private.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_header("www-authenticate", "Basic realm=\"turnstile\"");

    TestRequest::get(PORTAL, "/private.txt")
        .header("Translate", "f")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_header_missing("location");
}

/// ## Summary
/// Visible content the visitor cannot open is deferred to the content
/// handler, which asks for credentials.
#[test_log::test(tokio::test)]
async fn deferred_file_client_is_challenged_by_the_handler() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/catalog/item.txt")
        .header("User-Agent", "Microsoft Office Word 2016")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_header("www-authenticate", "Basic realm=\"turnstile\"");
}

#[test_log::test(tokio::test)]
async fn file_client_reads_public_content() {
    let service = create_test_service().await;

    TestRequest::propfind(PORTAL, "/public/welcome.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn crawler_ignores_presented_credentials() {
    let service = create_test_service().await;

    let whoami = TestRequest::get(INTRANET, "/app/whoami")
        .header("x-crawler", "true")
        .negotiated("CORP\\alice")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["full_name"], "BuiltIn\\Visitor");
    assert!(whoami["scheme"].is_null());
}

/// ## Summary
/// Sites without authentication serve everyone as the visitor, and their
/// repository content cannot be authorized.
#[test_log::test(tokio::test)]
async fn none_mode_site_is_anonymous() {
    let service = create_test_service().await;

    let whoami = TestRequest::get(OPEN, "/app/whoami")
        .basic_auth("CORP\\alice:wrong")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["authenticated"], false);

    let whoami = TestRequest::get(OPEN, "/app/whoami")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["scheme"], "none");

    TestRequest::get(OPEN, "/index.html")
        .send(&service)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}
