use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch},
    Extension, Router,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{jwt_auth_middleware, require_role, AuthService, MessageResponse, UserRole, UserSession};
use crate::models::{
    CreateTrainingRequest, Training, TrainingSearchQuery, UpdateTrainingRequest, UserResponse,
};
use crate::services::{ServiceError, TrainingService, UserService};

#[derive(Clone)]
pub struct CoachAppState {
    pub training_service: TrainingService,
    pub user_service: UserService,
}

pub fn coach_routes(db: PgPool, auth_service: AuthService) -> Router {
    let shared_state = CoachAppState {
        training_service: TrainingService::new(db.clone()),
        user_service: UserService::new(db),
    };

    Router::new()
        .route("/users/me", get(me))
        .route("/trainings", get(search_trainings).post(create_training))
        .route(
            "/trainings/:training_id",
            patch(update_training).delete(delete_training),
        )
        .route("/trainings/:training_id/students", get(training_students))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(shared_state)
}

async fn me(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<UserResponse>, ServiceError> {
    let coach = require_role(&session, UserRole::Coach)?;
    let user = state.user_service.get_user_by_id(coach.user_id).await?;
    Ok(Json(user))
}

/// The caller's trainings, a week from today unless the query sets a window.
#[tracing::instrument(skip(state, session, query), fields(user_id = session.user_id))]
async fn search_trainings(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<TrainingSearchQuery>,
) -> Result<Json<Vec<Training>>, ServiceError> {
    let coach = require_role(&session, UserRole::Coach)?;
    let trainings = state
        .training_service
        .search(coach.user_id, &query, Utc::now().date_naive())
        .await?;
    Ok(Json(trainings))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = session.user_id))]
async fn create_training(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateTrainingRequest>,
) -> Result<(StatusCode, Json<Training>), ServiceError> {
    let coach = require_role(&session, UserRole::Coach)?;
    let training = state.training_service.create(coach.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(training)))
}

#[tracing::instrument(skip(state, session, patch), fields(user_id = session.user_id))]
async fn update_training(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<i64>,
    Json(patch): Json<UpdateTrainingRequest>,
) -> Result<Json<Training>, ServiceError> {
    let coach = require_role(&session, UserRole::Coach)?;
    let training = state
        .training_service
        .update(training_id, coach.user_id, patch)
        .await?;
    Ok(Json(training))
}

#[tracing::instrument(skip(state, session), fields(user_id = session.user_id))]
async fn delete_training(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<i64>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let coach = require_role(&session, UserRole::Coach)?;
    state
        .training_service
        .delete(training_id, coach.user_id)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("Training with id={training_id} deleted"),
    }))
}

#[tracing::instrument(skip(state, session), fields(user_id = session.user_id))]
async fn training_students(
    State(state): State<CoachAppState>,
    Extension(session): Extension<UserSession>,
    Path(training_id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    require_role(&session, UserRole::Coach)?;
    let students = state
        .training_service
        .students_of_training(training_id)
        .await?;
    Ok(Json(students))
}
