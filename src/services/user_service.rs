use sqlx::PgPool;

use crate::models::UserResponse;
use crate::services::{ServiceError, ServiceResult};
use crate::store::users;

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> ServiceResult<UserResponse> {
        users::find_by_id(&self.db, user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ServiceError::NotFound(format!("User with id={user_id}")))
    }

    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<UserResponse>> {
        Ok(users::find_by_email(&self.db, email)
            .await?
            .map(UserResponse::from))
    }
}
