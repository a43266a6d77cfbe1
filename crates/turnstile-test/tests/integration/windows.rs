//! Windows sites: identities negotiated by the trusted upstream.

use salvo::http::StatusCode;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn negotiated_identity_reads_site_content() {
    let service = create_test_service().await;

    let body = TestRequest::get(INTRANET, "/home.html")
        .negotiated("CORP\\alice")
        .send(&service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["identity"], "CORP\\alice");
    assert_eq!(body["resource"]["path"], "/Root/Sites/Intranet/home.html");
}

#[test_log::test(tokio::test)]
async fn missing_identity_is_denied() {
    let service = create_test_service().await;

    TestRequest::get(INTRANET, "/home.html")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_body_contains("Access denied");

    // Diagnostics are only open to local callers
    TestRequest::get(INTRANET, "/app/healthcheck")
        .send(&service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

/// ## Summary
/// A failed permission assertion on a Windows site ends the request with
/// the reason.
#[test_log::test(tokio::test)]
async fn failed_assertion_is_forbidden() {
    let service = create_test_service().await;

    let response = TestRequest::get(INTRANET, "/Root/Sites/Portal/private.txt")
        .negotiated("CORP\\alice")
        .send(&service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert!(
        response.json()["message"]
            .as_str()
            .is_some_and(|message| message.contains("not permitted"))
    );
}
