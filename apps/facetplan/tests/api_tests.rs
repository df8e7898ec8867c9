//! Integration tests for the facetplan HTTP API.
//!
//! Uses axum-test to exercise the router without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - tests are serialized to avoid
// env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use facetplan::api::{
    API_KEY_ENV, AppState, ErrorResponse, FacetPlanResponse, GranularityResponse, HealthResponse,
    ModeResponse, WidgetPlanResponse, create_router,
};
use facetplan_core::{FacetControl, FacetMode, Granularity, Preferences};
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize tests since some modify env vars.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and clears the API key on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }
}

fn lock_env() -> TestGuard {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var(API_KEY_ENV) };
    TestGuard { _guard: guard }
}

fn server_with(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).unwrap()
}

/// Test server without startup preferences.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    let state = AppState::with_default_sanitizer();
    (server_with(state), guard)
}

fn storefront_document() -> serde_json::Value {
    json!({
        "themeSettings": { "type": "classic" },
        "globalSettings": { "currency": "€" },
        "facetSettings": {
            "staticFacets": [
                { "name": "color", "rsConfig": { "filterType": "list" } },
                { "name": "price", "rsConfig": {} }
            ],
            "dynamicFacets": [
                {
                    "rsConfig": {
                        "componentId": "released",
                        "dataField": "released_at",
                        "filterType": "date",
                        "startValue": "2020-01-01",
                        "endValue": "2020-07-19",
                        "calendarInterval": "day"
                    }
                }
            ]
        }
    })
}

/// Test server with startup preferences loaded.
fn create_populated_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    let prefs = Preferences::from_value(storefront_document()).unwrap();
    let state = AppState::with_default_sanitizer().with_preferences(prefs);
    (server_with(state), guard)
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// PLAN ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_plan_document() {
    let (server, _guard) = create_test_server();

    let response = server.post("/plan").json(&storefront_document()).await;

    response.assert_status_ok();
    let body: WidgetPlanResponse = response.json();
    assert!(body.success);
    assert_eq!(body.plan.currency, "€");

    let ids: Vec<_> = body
        .plan
        .facets
        .iter()
        .map(|f| f.component_id.as_str())
        .collect();
    assert_eq!(ids, vec!["color", "price", "released"]);
    assert_eq!(body.plan.warnings.len(), 1);
}

#[tokio::test]
async fn test_plan_json_shape() {
    let (server, _guard) = create_test_server();

    let response = server.post("/plan").json(&storefront_document()).await;

    let body: serde_json::Value = response.json();
    let color = &body["plan"]["facets"][0];
    assert_eq!(color["mode"], "list");
    assert_eq!(color["control"]["component"], "multiList");
    assert_eq!(color["control"]["reactAnd"][0], "colorOption");
    assert_eq!(body["plan"]["facets"][2]["control"]["date"]["calendarInterval"], "week");
}

#[tokio::test]
async fn test_plan_empty_document() {
    let (server, _guard) = create_test_server();

    let response = server.post("/plan").json(&json!({})).await;

    response.assert_status_ok();
    let body: WidgetPlanResponse = response.json();
    assert!(body.plan.facets.is_empty());
    assert_eq!(body.plan.currency, "$");
}

#[tokio::test]
async fn test_plan_invalid_interval_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/plan")
        .json(&json!({
            "facetSettings": { "dynamicFacets": [ {
                "rsConfig": { "componentId": "d", "dataField": "d", "calendarInterval": "fortnight" }
            } ] }
        }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(!body.success);
    assert!(body.error.contains("fortnight"));
}

#[tokio::test]
async fn test_plan_bad_date_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/plan")
        .json(&json!({
            "facetSettings": { "dynamicFacets": [ {
                "rsConfig": {
                    "componentId": "released", "dataField": "released_at", "filterType": "date",
                    "startValue": "not-a-date", "endValue": "2020-01-01"
                }
            } ] }
        }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("not-a-date"));
}

#[tokio::test]
async fn test_startup_plan_without_preferences() {
    let (server, _guard) = create_test_server();

    let response = server.get("/plan").await;

    response.assert_status_not_found();
    let body: ErrorResponse = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_startup_plan_with_preferences() {
    let (server, _guard) = create_populated_test_server();

    let response = server.get("/plan").await;

    response.assert_status_ok();
    let body: WidgetPlanResponse = response.json();
    assert_eq!(body.plan.facets.len(), 3);
}

// =============================================================================
// FACET ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_facet_mode_list() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/facet/mode")
        .json(&json!({
            "rsConfig": {
                "componentId": "brand", "dataField": "brand", "filterType": "list",
                "startValue": "1", "endValue": "9"
            }
        }))
        .await;

    response.assert_status_ok();
    let body: ModeResponse = response.json();
    assert_eq!(body.component_id, "brand");
    assert_eq!(body.mode, FacetMode::List);
}

#[tokio::test]
async fn test_facet_mode_ranges() {
    let (server, _guard) = create_test_server();

    let bounded: ModeResponse = server
        .post("/facet/mode")
        .json(&json!({
            "rsConfig": { "componentId": "w", "dataField": "w", "filterType": "range",
                          "startValue": "10", "endValue": "20" }
        }))
        .await
        .json();
    assert_eq!(bounded.mode, FacetMode::BoundedRange);

    let dynamic: ModeResponse = server
        .post("/facet/mode")
        .json(&json!({
            "rsConfig": { "componentId": "w", "dataField": "w", "filterType": "range",
                          "startValue": "", "endValue": "" }
        }))
        .await
        .json();
    assert_eq!(dynamic.mode, FacetMode::DynamicRange);
}

#[tokio::test]
async fn test_facet_mode_missing_field() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/facet/mode")
        .json(&json!({ "rsConfig": { "componentId": "brand" } }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("dataField"));
}

#[tokio::test]
async fn test_facet_plan_sanitizes_messages() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/facet/plan")
        .json(&json!({
            "rsConfig": { "componentId": "brand", "dataField": "brand", "filterType": "list" },
            "customMessages": { "loading": "<em>wait</em><script>alert(1)</script>" }
        }))
        .await;

    response.assert_status_ok();
    let body: FacetPlanResponse = response.json();
    match body.plan.control {
        FacetControl::MultiList {
            loading_html,
            react_and,
            ..
        } => {
            assert_eq!(loading_html, "<em>wait</em>");
            assert_eq!(react_and, vec!["search"]);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_facet_plan_uses_startup_context() {
    let (server, _guard) = create_populated_test_server();

    let response = server
        .post("/facet/plan")
        .json(&json!({
            "rsConfig": { "componentId": "brand", "dataField": "brand", "filterType": "list" }
        }))
        .await;

    response.assert_status_ok();
    let body: FacetPlanResponse = response.json();
    match body.plan.control {
        FacetControl::MultiList { react_and, .. } => {
            assert_eq!(react_and, vec!["search", "color", "price", "released"]);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_facet_plan_date_range() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/facet/plan")
        .json(&json!({
            "rsConfig": {
                "componentId": "released", "dataField": "released_at", "filterType": "date",
                "startValue": "2000-01-01", "endValue": "2020-01-01"
            }
        }))
        .await;

    response.assert_status_ok();
    let body: FacetPlanResponse = response.json();
    assert_eq!(body.plan.mode, FacetMode::BoundedRange);
    let date = body.plan.control.date().unwrap();
    assert_eq!(date.calendar_interval, Granularity::Quarter);
    assert!(date.warning.is_some());
}

// =============================================================================
// GRANULARITY ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_granularity_escalates() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/granularity")
        .json(&json!({ "totalRangeMs": 200u64 * 86_400_000, "calendarInterval": "day" }))
        .await;

    response.assert_status_ok();
    let body: GranularityResponse = response.json();
    assert_eq!(body.estimate.granularity, Granularity::Week);
    assert_eq!(body.bucket_count, 29);
    assert!(body.estimate.warning.is_some());
}

#[tokio::test]
async fn test_granularity_default_floor() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/granularity")
        .json(&json!({ "totalRangeMs": 3u64 * 86_400_000 }))
        .await;

    response.assert_status_ok();
    let body: GranularityResponse = response.json();
    assert_eq!(body.estimate.granularity, Granularity::Hour);
}

#[tokio::test]
async fn test_granularity_year_warns() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/granularity")
        .json(&json!({ "totalRangeMs": 1_000u64, "calendarInterval": "year" }))
        .await;

    let body: GranularityResponse = response.json();
    assert_eq!(body.estimate.granularity, Granularity::Year);
    assert_eq!(
        body.estimate.warning.as_deref(),
        Some("Try using a shorter range of values.")
    );
}

#[tokio::test]
async fn test_granularity_unknown_interval() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/granularity")
        .json(&json!({ "totalRangeMs": 1_000u64, "calendarInterval": "bogus" }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("bogus"));
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/plan")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_negative_range_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/granularity")
        .json(&json!({ "totalRangeMs": -5 }))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_content_type_uses_error_shape() {
    let (server, _guard) = create_test_server();

    let response = server.post("/facet/mode").text(r#"{"rsConfig":{}}"#).await;

    assert_eq!(response.status_code().as_u16(), 415);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Test server with authentication enabled. Call while holding the env lock.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var(API_KEY_ENV, api_key) };
    server_with(AppState::with_default_sanitizer())
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = lock_env();
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .post("/plan")
        .json(&json!({}))
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let _guard = lock_env();
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .post("/plan")
        .json(&json!({}))
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("correct-key");

    let response = server
        .post("/plan")
        .json(&json!({}))
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ErrorResponse = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("required-key");

    let response = server.post("/granularity").json(&json!({ "totalRangeMs": 1 })).await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("actual-key");

    let response = server
        .get("/plan")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = lock_env();
    let server = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}
