use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};

/// Cookie set by the cookie-based login flow.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// JWT authentication middleware.
///
/// Reads a bearer token from the `Authorization` header, falling back to the
/// `access_token` cookie, and stores the resulting [`UserSession`] in the
/// request extensions.
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| extract_bearer_token(header).map(str::to_owned))
        .transpose()?;

    let token = match header_token {
        Some(token) => token,
        None => CookieJar::from_headers(request.headers())
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingAuthHeader)?,
    };

    let session = auth_service.validate_session(&token)?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Role check applied at the top of every coach-only or student-only operation.
pub fn require_role(session: &UserSession, required_role: UserRole) -> Result<&UserSession, AuthError> {
    if session.role != required_role {
        tracing::warn!(
            user_id = session.user_id,
            role = session.role.as_str(),
            required = required_role.as_str(),
            "role check failed"
        );
        return Err(AuthError::InsufficientPermissions(required_role.as_str()));
    }

    Ok(session)
}

/// CORS configuration
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Security headers middleware
pub fn security_headers_layer() -> tower_http::set_header::SetResponseHeaderLayer<axum::http::HeaderValue> {
    tower_http::set_header::SetResponseHeaderLayer::overriding(
        axum::http::header::HeaderName::from_static("x-content-type-options"),
        axum::http::HeaderValue::from_static("nosniff"),
    )
}
