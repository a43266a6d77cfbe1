//! Application endpoints and content lookup.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn healthcheck_is_open_on_forms_sites() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/app/healthcheck")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .assert_body_contains("OK");
}

#[test_log::test(tokio::test)]
async fn status_lists_modes() {
    let service = create_test_service().await;

    let body = TestRequest::get(PORTAL, "/app/status")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["default_mode"], "forms");
    assert_eq!(body["sites"][1]["name"], "intranet");
    assert_eq!(body["sites"][1]["auth_mode"], "windows");
}

#[test_log::test(tokio::test)]
async fn missing_content_is_not_found() {
    let service = create_test_service().await;

    TestRequest::get(PORTAL, "/nothing-here.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

/// ## Summary
/// `/Root` paths address the repository directly, whatever the site.
#[test_log::test(tokio::test)]
async fn root_paths_bypass_the_site_mapping() {
    let service = create_test_service().await;

    let body = TestRequest::get(PORTAL, "/Root/Sites/Portal/public/welcome.txt")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["resource"]["path"], "/Root/Sites/Portal/public/welcome.txt");
    assert_eq!(body["deferred"], false);
}
