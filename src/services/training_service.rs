use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{
    CreateTrainingRequest, Training, TrainingSearchQuery, UpdateTrainingRequest, UserResponse,
};
use crate::services::availability::{check_individual_target, sync_availability};
use crate::services::{ServiceError, ServiceResult};
use crate::store::{self, trainings, users, SearchScope};

/// Create, update and delete trainings, keeping their availability edges in step.
///
/// Every mutation runs in one transaction and locks the training row first,
/// existence before ownership.
#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
}

fn map_write_error(err: sqlx::Error) -> ServiceError {
    if store::is_foreign_key_violation(&err) {
        ServiceError::Validation("Individual training must target an existing student".to_string())
    } else {
        ServiceError::Database(err)
    }
}

impl TrainingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create(&self, coach_id: i64, request: CreateTrainingRequest) -> ServiceResult<Training> {
        let new_training = request.into_new_training(coach_id);
        let rule = new_training.validate().map_err(ServiceError::validation)?;

        let mut tx = self.db.begin().await?;

        check_individual_target(&mut tx, &rule).await?;

        let training = trainings::insert(&mut tx, &new_training)
            .await
            .map_err(map_write_error)?;
        let outcome = sync_availability(&mut tx, training.id, &rule).await?;

        tx.commit().await?;

        tracing::info!(
            training_id = training.id,
            coach_id,
            available = outcome.added,
            "training created"
        );

        Ok(training)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        training_id: i64,
        coach_id: i64,
        patch: UpdateTrainingRequest,
    ) -> ServiceResult<Training> {
        if patch.is_empty() {
            return Err(ServiceError::Validation("No fields to update".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let current = trainings::lock_for_update(&mut tx, training_id)
            .await?
            .ok_or_else(|| ServiceError::training_not_found(training_id))?;
        ensure_owner(&current, coach_id)?;

        let merged = patch.apply_to(&current).map_err(ServiceError::validation)?;
        let rule = merged.targeting().map_err(ServiceError::validation)?;
        if merged.individual_for_id != current.individual_for_id {
            check_individual_target(&mut tx, &rule).await?;
        }

        let training = trainings::update(&mut tx, &merged)
            .await
            .map_err(map_write_error)?;

        if current.targeting_changed(&training) {
            let outcome = sync_availability(&mut tx, training.id, &rule).await?;
            tracing::info!(
                training_id,
                added = outcome.added,
                removed = outcome.removed,
                "availability recomputed"
            );
        }

        tx.commit().await?;

        tracing::info!(training_id, coach_id, "training updated");

        Ok(training)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, training_id: i64, coach_id: i64) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;

        let training = trainings::lock_for_update(&mut tx, training_id)
            .await?
            .ok_or_else(|| ServiceError::training_not_found(training_id))?;
        ensure_owner(&training, coach_id)?;

        let (subscriptions, available) =
            store::edges::delete_edges_for_training(&mut tx, training_id).await?;
        trainings::delete(&mut tx, training_id).await?;

        tx.commit().await?;

        tracing::info!(
            training_id,
            coach_id,
            subscriptions,
            available,
            "training deleted"
        );

        Ok(())
    }

    pub async fn get(&self, training_id: i64) -> ServiceResult<Training> {
        trainings::find_by_id(&self.db, training_id)
            .await?
            .ok_or_else(|| ServiceError::training_not_found(training_id))
    }

    /// The coach's own trainings matching `query`, within its window (a week
    /// from `today` by default).
    #[tracing::instrument(skip(self, query))]
    pub async fn search(
        &self,
        coach_id: i64,
        query: &TrainingSearchQuery,
        today: NaiveDate,
    ) -> ServiceResult<Vec<Training>> {
        let mut filter = query.filter().map_err(ServiceError::validation)?;
        filter.coach_id = Some(coach_id);
        let window = query.window(today).map_err(ServiceError::validation)?;

        Ok(trainings::search(&self.db, SearchScope::All, &filter, Some(window)).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn students_of_training(&self, training_id: i64) -> ServiceResult<Vec<UserResponse>> {
        if !trainings::exists(&self.db, training_id).await? {
            return Err(ServiceError::training_not_found(training_id));
        }

        let students = users::subscribed_to(&self.db, training_id).await?;

        Ok(students.into_iter().map(UserResponse::from).collect())
    }
}

fn ensure_owner(training: &Training, coach_id: i64) -> ServiceResult<()> {
    if training.coach_id != coach_id {
        tracing::warn!(training_id = training.id, coach_id, "coach does not own training");
        return Err(ServiceError::Permission(
            "You can only change your own trainings".to_string(),
        ));
    }

    Ok(())
}
