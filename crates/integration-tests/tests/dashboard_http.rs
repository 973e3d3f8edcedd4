//! HTTP tests against a running dashboard.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (fb-cli migrate)
//! - The dashboard running (cargo run -p finboard-dashboard)
//! - A super admin account in `FB_TEST_EMAIL` / `FB_TEST_PASSWORD`

use finboard_integration_tests::{base_url, client, location, login};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running dashboard server"]
async fn test_health_endpoints() {
    let client = client();
    let resp = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("health request failed: {e}"));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("readiness request failed: {e}"));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running dashboard server"]
async fn test_signed_out_requests_are_turned_away() {
    let client = client();

    for path in ["/admin", "/data", "/reports", "/units"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{path} request failed: {e}"));
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/", "{path}");
    }

    let resp = client
        .get(format!("{}/api/reports/chart", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("chart request failed: {e}"));
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running dashboard server"]
async fn test_security_headers_present() {
    let resp = client()
        .get(format!("{}/", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("login page request failed: {e}"));

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(
        headers["content-security-policy"]
            .to_str()
            .unwrap_or_default()
            .contains("script-src 'self'")
    );
}

#[tokio::test]
#[ignore = "Requires running dashboard server and test account"]
async fn test_bad_password_returns_to_login() {
    let resp = client()
        .post(format!("{}/auth/login", base_url()))
        .form(&[("email", "nobody@example.com"), ("password", "wrong-password")])
        .send()
        .await
        .unwrap_or_else(|e| panic!("login request failed: {e}"));

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
#[ignore = "Requires running dashboard server and test account"]
async fn test_super_admin_session() {
    let client = client();
    assert_eq!(login(&client).await, "/admin");

    for path in ["/admin", "/units", "/users", "/master-codes", "/library-codes", "/data", "/reports"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap_or_else(|e| panic!("{path} request failed: {e}"));
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }

    // Another role's home sends the user back to their own.
    let resp = client
        .get(format!("{}/manager", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("manager request failed: {e}"));
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");

    let chart: serde_json::Value = client
        .get(format!("{}/api/reports/chart", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("chart request failed: {e}"))
        .json()
        .await
        .unwrap_or_else(|e| panic!("chart body is not JSON: {e}"));
    assert!(chart.get("pie").is_some() && chart.get("bar").is_some() && chart.get("line").is_some());

    let resp = client
        .get(format!("{}/reports/export.pdf", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("pdf export failed: {e}"));
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");

    let resp = client
        .post(format!("{}/auth/logout", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("logout failed: {e}"));
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .get(format!("{}/admin", base_url()))
        .send()
        .await
        .unwrap_or_else(|e| panic!("admin request failed: {e}"));
    assert_eq!(location(&resp), "/");
}
