use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{jwt_auth_middleware, require_role, AuthService, UserRole, UserSession};
use crate::models::{Discipline, SubscriptionResponse, Training, TrainingSearchQuery, UserResponse};
use crate::services::{ServiceError, StudentService, SubscriptionService, UserService};

#[derive(Clone)]
pub struct ClientAppState {
    pub student_service: StudentService,
    pub subscription_service: SubscriptionService,
    pub user_service: UserService,
}

pub fn client_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = ClientAppState {
        student_service: StudentService::new(db.clone()),
        subscription_service: SubscriptionService::new(db.clone()),
        user_service: UserService::new(db),
    };

    Router::new()
        .route("/users/me", get(me))
        .route("/subscriptions", get(my_trainings))
        .route("/subscriptions/:training_id", delete(unsubscribe))
        .route("/available-trainings", get(available_trainings))
        .route("/available-trainings/:training_id/subscribe", post(subscribe))
        .route("/interests", get(my_interests))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(shared_state)
}

async fn me(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserResponse>, ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let user = state.user_service.get_user_by_id(student.user_id).await?;
    Ok(Json(user))
}

async fn my_trainings(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<Training>>, ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let trainings = state.student_service.my_trainings(student.user_id).await?;
    Ok(Json(trainings))
}

#[tracing::instrument(skip(state, session, query), fields(user_id = session.user_id))]
async fn available_trainings(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<TrainingSearchQuery>,
) -> Result<Json<Vec<Training>>, ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let trainings = state
        .student_service
        .available_trainings(student.user_id, &query, Utc::now().date_naive())
        .await?;
    Ok(Json(trainings))
}

#[tracing::instrument(skip(state, session), fields(user_id = session.user_id))]
async fn subscribe(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<i64>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let subscription = state
        .subscription_service
        .subscribe(student.user_id, training_id)
        .await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(&subscription))))
}

#[tracing::instrument(skip(state, session), fields(user_id = session.user_id))]
async fn unsubscribe(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<i64>,
) -> Result<Json<SubscriptionResponse>, ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let removed = state
        .subscription_service
        .unsubscribe(student.user_id, training_id)
        .await?;
    Ok(Json(removed))
}

async fn my_interests(
    State(state): State<ClientAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<Discipline>>, ServiceError> {
    let student = require_role(&session, UserRole::Student)?;
    let interests = state.student_service.my_interests(student.user_id).await?;
    Ok(Json(interests))
}
