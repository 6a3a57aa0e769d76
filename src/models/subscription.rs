use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student enrolled in a training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub student_id: i64,
    pub training_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A user who may subscribe to a training but has not yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct AvailableTraining {
    pub user_id: i64,
    pub training_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub user_id: i64,
    pub training_id: i64,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(subscription: &Subscription) -> Self {
        Self {
            user_id: subscription.student_id,
            training_id: subscription.training_id,
        }
    }
}
