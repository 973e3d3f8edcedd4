//! Integration tests for Finboard.
//!
//! # Running Tests
//!
//! ```bash
//! # Spreadsheet pipeline tests (no services needed)
//! cargo test -p finboard-integration-tests
//!
//! # Repository tests against a scratch database (migrated on first use)
//! FB_TEST_DATABASE_URL=postgres://localhost/finboard_test \
//!     cargo test -p finboard-integration-tests --test repositories -- --ignored
//!
//! # HTTP tests against a running dashboard with a migrated database
//! fb-cli migrate
//! fb-cli user create -e admin@example.com -n Admin -r super_admin -p '...'
//! FB_TEST_EMAIL=admin@example.com FB_TEST_PASSWORD='...' \
//!     cargo test -p finboard-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_BASE_URL` - Dashboard under test (default: `http://localhost:3002`)
//! - `FB_TEST_EMAIL` / `FB_TEST_PASSWORD` - A super admin account
//! - `FB_TEST_DATABASE_URL` - Scratch `PostgreSQL` database for repository tests

use std::path::Path;

use reqwest::{Client, StatusCode, redirect::Policy};
use sqlx::PgPool;
use sqlx::migrate::Migrator;

/// Base URL of the dashboard under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("DASHBOARD_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3002".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// A client with a cookie jar that does not follow redirects, so tests can
/// assert on `Location` headers.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap_or_else(|e| panic!("Failed to create HTTP client: {e}"))
}

/// Sign in with the test account and return the `Location` of the redirect.
///
/// # Panics
///
/// Panics if the credentials are missing or the login is rejected.
pub async fn login(client: &Client) -> String {
    let email = std::env::var("FB_TEST_EMAIL").unwrap_or_else(|_| panic!("FB_TEST_EMAIL not set"));
    let password =
        std::env::var("FB_TEST_PASSWORD").unwrap_or_else(|_| panic!("FB_TEST_PASSWORD not set"));

    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .unwrap_or_else(|e| panic!("Login request failed: {e}"));

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let home = location(&resp);
    assert_ne!(home, "/", "login was rejected");
    home
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Connect to the scratch database and apply the dashboard migrations.
///
/// # Panics
///
/// Panics if `FB_TEST_DATABASE_URL` is unset, the database is unreachable,
/// or a migration fails.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("FB_TEST_DATABASE_URL")
        .unwrap_or_else(|_| panic!("FB_TEST_DATABASE_URL not set"));
    let pool = PgPool::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to test database: {e}"));

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../dashboard/migrations");
    Migrator::new(dir.as_path())
        .await
        .unwrap_or_else(|e| panic!("Failed to load migrations: {e}"))
        .run(&pool)
        .await
        .unwrap_or_else(|e| panic!("Failed to run migrations: {e}"));

    pool
}

/// A suffix that keeps names from concurrent tests apart.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
