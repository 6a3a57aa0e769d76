use sqlx::PgPool;

use crate::models::{Subscription, SubscriptionResponse};
use crate::services::availability::is_eligible;
use crate::services::{ServiceError, ServiceResult};
use crate::store::{edges, trainings};

/// Moves a (student, training) pair between "available" and "subscribed".
///
/// Both directions hold a shared lock on the training row, so they run
/// concurrently with each other but never interleave with a retargeting update.
#[derive(Clone)]
pub struct SubscriptionService {
    db: PgPool,
}

impl SubscriptionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn subscribe(&self, student_id: i64, training_id: i64) -> ServiceResult<Subscription> {
        let mut tx = self.db.begin().await?;

        if trainings::lock_shared(&mut tx, training_id).await?.is_none() {
            return Err(ServiceError::NotAvailable(training_id));
        }

        if !edges::take_available(&mut tx, student_id, training_id).await? {
            tracing::warn!(student_id, training_id, "subscribe without availability");
            return Err(ServiceError::NotAvailable(training_id));
        }

        let subscription = edges::insert_subscription(&mut tx, student_id, training_id).await?;

        tx.commit().await?;

        tracing::info!(student_id, training_id, "subscription created");

        Ok(subscription)
    }

    /// Cancels the subscription; the availability edge comes back while the
    /// student still matches the training's targeting.
    #[tracing::instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        student_id: i64,
        training_id: i64,
    ) -> ServiceResult<SubscriptionResponse> {
        let not_found = || {
            ServiceError::NotFound(format!(
                "Subscription of user {student_id} to training {training_id}"
            ))
        };

        let mut tx = self.db.begin().await?;

        let training = trainings::lock_shared(&mut tx, training_id)
            .await?
            .ok_or_else(not_found)?;

        let subscription = edges::remove_subscription(&mut tx, student_id, training_id)
            .await?
            .ok_or_else(not_found)?;

        let rule = training.targeting()?;
        let restored = if is_eligible(&mut tx, &rule, student_id).await? {
            edges::insert_available(&mut tx, training_id, &[student_id]).await?
        } else {
            0
        };

        tx.commit().await?;

        tracing::info!(
            student_id,
            training_id,
            available_again = restored > 0,
            "subscription removed"
        );

        Ok(SubscriptionResponse::from(&subscription))
    }
}
