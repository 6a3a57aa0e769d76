use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::auth::{
    jwt_auth_middleware, AuthError, AuthService, LoginRequest, MessageResponse, TokenForm,
    TokenResponse, UserSession, ACCESS_TOKEN_COOKIE,
};
use crate::models::{RegisterRequest, UserResponse};

pub fn registration_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/register", post(register))
        .with_state(auth_service)
}

/// Authentication routes
pub fn auth_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/token", post(token))
        .route("/login", post(login))
        .route("/login-cookie", post(login_cookie))
        .route("/logout", post(logout))
        .route(
            "/users/me",
            get(me).route_layer(middleware::from_fn_with_state(
                auth_service.clone(),
                jwt_auth_middleware,
            )),
        )
        .with_state(auth_service)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    let user = auth_service.register(request, Utc::now().date_naive()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// OAuth2 password flow: `username` carries the email.
#[tracing::instrument(skip(auth_service, form))]
async fn token(
    State(auth_service): State<AuthService>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.login(form.into()).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Same credentials check, but the token travels in an HttpOnly cookie.
#[tracing::instrument(skip(auth_service, jar, request))]
async fn login_cookie(
    State(auth_service): State<AuthService>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AuthError> {
    let response = auth_service.login(request).await?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, response.access_token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            message: "Logged in".to_string(),
        }),
    ))
}

/// Tokens are stateless; logging out drops the cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/")),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    )
}

#[tracing::instrument(skip(auth_service, session))]
async fn me(
    State(auth_service): State<AuthService>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = auth_service.current_user(&session).await?;
    Ok(Json(user))
}
