//! HTTP tests that stop before touching the database.
//!
//! The router runs over a pool that never connects, so these run without
//! `TEST_DATABASE_URL`. Database-backed flows live in `db_tests.rs`.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{app, get, offline_ctx, post_json, post_raw, send};
use serde_json::json;

#[tokio::test]
async fn admin_routes_require_a_session() {
    let ctx = offline_ctx();

    for (method, uri) in [
        (Method::GET, "/api/registrations"),
        (Method::GET, "/api/stats"),
        (Method::GET, "/api/admin/coupons"),
        (Method::DELETE, "/api/admin/coupons?id=x"),
        (Method::GET, "/api/admin/games"),
        (Method::GET, "/api/admin/settings"),
        (Method::GET, "/api/admin/inventory"),
        (Method::GET, "/api/admin/finance/summary"),
        (Method::GET, "/api/admin/session"),
    ] {
        let res = send(app(&ctx), method.clone(), uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(res.json["success"], false);
        assert_eq!(res.json["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn registration_missing_fields_is_bad_request() {
    let ctx = offline_ctx();

    let res = post_json(app(&ctx), "/api/registrations", json!({}), None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let error = res.json["error"].as_str().unwrap();
    assert!(error.contains("teamName"));
    assert!(error.contains("selectedGames"));
}

#[tokio::test]
async fn registration_single_missing_field_names_it() {
    let ctx = offline_ctx();
    let mut body = common::registration("Alpha", "cash");
    body.as_object_mut().unwrap().remove("rollNumber");

    let res = post_json(app(&ctx), "/api/registrations", body, None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["field"], "rollNumber");
}

#[tokio::test]
async fn registration_rejects_bad_email() {
    let ctx = offline_ctx();
    let mut body = common::registration("Alpha", "online");
    body["email"] = json!("captain-at-example");

    let res = post_json(app(&ctx), "/api/registrations", body, None).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["field"], "email");
}

#[tokio::test]
async fn blank_coupon_code_is_bad_request_and_not_cached() {
    let ctx = offline_ctx();

    for uri in ["/api/coupons/validate?code=%20%20", "/api/coupons/validate"] {
        let res = get(app(&ctx), uri, None).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.json["valid"], false);
        assert_eq!(res.json["error"], "Coupon code is required");
        assert_eq!(res.headers[header::CACHE_CONTROL], "no-store");
    }
}

#[tokio::test]
async fn blank_credentials_never_authenticate() {
    let ctx = offline_ctx();

    for body in [
        json!({}),
        json!({"username": "  ", "password": "secret"}),
        json!({"username": "admin", "password": "   "}),
    ] {
        let res = post_json(app(&ctx), "/api/admin/login", body, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.json["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let ctx = offline_ctx();

    let res = get(app(&ctx), "/api/nope", None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json["success"], false);
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let ctx = offline_ctx();

    let res = get(app(&ctx), "/health", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.json["status"], "degraded");
    assert_eq!(res.json["database"], "unreachable");
}

#[tokio::test]
async fn mistyped_body_gets_json_error() {
    let ctx = offline_ctx();

    let res = post_json(
        app(&ctx),
        "/api/registrations",
        json!({"selectedGames": "Cricket"}),
        None,
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["success"], false);
    assert!(res.json["error"].as_str().unwrap().contains("selectedGames"));
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    let ctx = offline_ctx();

    for uri in ["/api/registrations", "/api/admin/login"] {
        let res = post_raw(app(&ctx), uri, "{\"teamName\": ").await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(res.json["success"], false);
        assert!(res.json["error"].is_string());
    }
}

#[tokio::test]
async fn oversized_registration_values_are_field_errors() {
    let ctx = offline_ctx();

    let mut body = common::registration("Alpha", "cash");
    body["contactNumber"] = json!("+92 300 1234567 ext 12");
    let res = post_json(app(&ctx), "/api/registrations", body, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["field"], "contactNumber");

    let mut body = common::registration("Alpha", "cash");
    body["totalAmount"] = json!(123456789);
    let res = post_json(app(&ctx), "/api/registrations", body, None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json["field"], "totalAmount");
}
