use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::auth::{auth_routes, registration_routes};
use super::client::client_routes;
use super::coach::coach_routes;
use super::health::health_check;
use crate::auth::middleware::{cors_layer, security_headers_layer};
use crate::auth::{AuthService, JwtService};
use crate::config::AppConfig;

pub fn create_routes(db: PgPool, config: &AppConfig) -> Router {
    let jwt_service = JwtService::new(&config.jwt_secret, config.access_token_lifetime());
    let auth_service = AuthService::new(db.clone(), jwt_service);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/registration", registration_routes(auth_service.clone()))
        .nest("/api/auth", auth_routes(auth_service.clone()))
        .nest("/api/coach", coach_routes(db.clone(), auth_service.clone()))
        .nest("/api/client", client_routes(db, auth_service))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(security_headers_layer())
}
