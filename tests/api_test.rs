//! Router-level tests that stop before the database: authentication,
//! role gating and request validation.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use club_booking::api::create_routes;
use club_booking::auth::{JwtService, UserRole};
use common::{bearer, lazy_pool, test_config};

fn app() -> Router {
    create_routes(lazy_pool(), &test_config())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, authorization: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app().oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_gated_routes_require_a_token() {
    for uri in [
        "/api/coach/trainings",
        "/api/client/subscriptions",
        "/api/client/available-trainings",
        "/api/auth/users/me",
    ] {
        let response = app().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }
}

#[tokio::test]
async fn test_malformed_and_foreign_tokens_are_rejected() {
    let response = app()
        .oneshot(get("/api/coach/trainings", Some("Token abc")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let foreign = JwtService::new("another-secret", chrono::Duration::minutes(5))
        .create_access_token(1, "coach@example.com", UserRole::Coach)
        .unwrap();
    let response = app()
        .oneshot(get("/api/coach/trainings", Some(&format!("Bearer {foreign}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid token");
}

#[tokio::test]
async fn test_expired_token_is_reported() {
    let expired = JwtService::new(common::TEST_JWT_SECRET, chrono::Duration::minutes(-5))
        .create_access_token(1, "coach@example.com", UserRole::Coach)
        .unwrap();

    let response = app()
        .oneshot(get("/api/coach/trainings", Some(&format!("Bearer {expired}"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Token expired");
}

#[tokio::test]
async fn test_student_cannot_use_coach_routes() {
    let student = bearer(2, UserRole::Student);

    let response = app()
        .oneshot(get("/api/coach/trainings", Some(&student)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/coach/trainings",
            Some(&student),
            json!({"date": "2025-03-01", "time_start": "09:00:00", "time_end": "10:00:00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/coach/trainings/1")
                .header(header::AUTHORIZATION, &student)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_coach_cannot_use_student_routes() {
    let coach = bearer(1, UserRole::Coach);

    let response = app()
        .oneshot(get("/api/client/available-trainings", Some(&coach)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/client/available-trainings/1/subscribe",
            Some(&coach),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Insufficient permissions");
}

#[tokio::test]
async fn test_cookie_carries_the_session() {
    let token = jwt_service_token(UserRole::Student);

    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/coach/trainings")
                .header(header::COOKIE, format!("access_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Authenticated through the cookie, then stopped by the role check.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

fn jwt_service_token(role: UserRole) -> String {
    common::jwt_service()
        .create_access_token(3, "cookie@example.com", role)
        .unwrap()
}

#[tokio::test]
async fn test_invalid_training_payloads_are_rejected() {
    let coach = bearer(1, UserRole::Coach);

    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/coach/trainings",
            Some(&coach),
            json!({
                "date": "2025-03-01",
                "time_start": "10:00:00",
                "time_end": "09:00:00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "validation_error");

    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/coach/trainings",
            Some(&coach),
            json!({
                "date": "2025-03-01",
                "time_start": "09:00:00",
                "time_end": "10:00:00",
                "type": "individual",
                "target_gender": "men"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app()
        .oneshot(json_request(
            Method::PATCH,
            "/api/coach/trainings/5",
            Some(&coach),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["message"], "No fields to update");
}

#[tokio::test]
async fn test_inverted_search_window_is_rejected() {
    let coach = bearer(1, UserRole::Coach);

    let response = app()
        .oneshot(get(
            "/api/coach/trainings?date_start_search=2025-02-01&date_end_search=2025-01-01",
            Some(&coach),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let student = bearer(2, UserRole::Student);
    let response = app()
        .oneshot(get(
            "/api/client/available-trainings?type=group&individual_for_id=4",
            Some(&student),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_registration_rejects_mismatched_passwords() {
    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/registration/register",
            None,
            json!({
                "name": "Robin",
                "email": "robin@example.com",
                "password": "Password123",
                "password_confirmation": "Password321",
                "role": "student",
                "birth_date": "1990-04-01",
                "gender": "men"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["message"],
        "Registration validation failed: Passwords must match"
    );
}

#[tokio::test]
async fn test_logout_clears_the_cookie() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/logout")
                .header(header::COOKIE, "access_token=whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("access_token="));
}
