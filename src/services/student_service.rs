use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{Discipline, Training, TrainingFilter, TrainingSearchQuery};
use crate::services::{ServiceError, ServiceResult};
use crate::store::{trainings, users, SearchScope};

/// Read side for students: their subscriptions, what they can still book, and interests.
#[derive(Clone)]
pub struct StudentService {
    db: PgPool,
}

impl StudentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn my_trainings(&self, student_id: i64) -> ServiceResult<Vec<Training>> {
        Ok(trainings::search(
            &self.db,
            SearchScope::SubscribedBy(student_id),
            &TrainingFilter::default(),
            None,
        )
        .await?)
    }

    /// A time window applies only when the query names one of its bounds.
    #[tracing::instrument(skip(self, query))]
    pub async fn available_trainings(
        &self,
        student_id: i64,
        query: &TrainingSearchQuery,
        today: NaiveDate,
    ) -> ServiceResult<Vec<Training>> {
        let filter = query.filter().map_err(ServiceError::validation)?;
        let window = if query.has_window() {
            Some(query.window(today).map_err(ServiceError::validation)?)
        } else {
            None
        };

        Ok(trainings::search(&self.db, SearchScope::AvailableTo(student_id), &filter, window).await?)
    }

    pub async fn my_interests(&self, student_id: i64) -> ServiceResult<Vec<Discipline>> {
        Ok(users::interests_of(&self.db, student_id).await?)
    }
}
