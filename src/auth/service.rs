use chrono::NaiveDate;
use sqlx::PgPool;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, JwtService, LoginRequest, TokenResponse, UserSession};
use crate::models::{
    validate_birth_date, validate_password_confirmation, CreateUser, RegisterRequest, User,
    UserResponse,
};
use crate::store::{self, users};

const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_service: JwtService) -> Self {
        Self { jwt_service, db }
    }

    /// Field checks plus the ones that need more than one field or today's date.
    pub fn validate_registration(request: &RegisterRequest, today: NaiveDate) -> Result<(), AuthError> {
        request
            .validate()
            .map_err(|err| AuthError::Validation(err.to_string()))?;
        validate_password_confirmation(&request.password, &request.password_confirmation)
            .map_err(|err| AuthError::Validation(err.to_string()))?;
        validate_birth_date(request.birth_date, today)
            .map_err(|err| AuthError::Validation(err.to_string()))?;

        Ok(())
    }

    /// Register a new user together with their interests.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(
        &self,
        request: RegisterRequest,
        today: NaiveDate,
    ) -> Result<UserResponse, AuthError> {
        Self::validate_registration(&request, today)?;

        if users::email_exists(&self.db, &request.email).await? {
            tracing::warn!("registration with an existing email");
            return Err(AuthError::EmailAlreadyExists);
        }

        let new_user = CreateUser {
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: hash_password(&request.password)?,
            role: request.role,
            age: request.age(today),
            age_bracket: request.resolved_age_bracket(today),
            gender: request.gender,
            skill_level: request.level,
        };

        let mut tx = self.db.begin().await?;

        let user = users::insert(&mut tx, &new_user).await.map_err(|err| {
            if store::is_unique_violation(&err, EMAIL_CONSTRAINT) {
                AuthError::EmailAlreadyExists
            } else {
                AuthError::Database(err)
            }
        })?;
        users::insert_interests(&mut tx, user.id, &request.interests).await?;

        tx.commit().await?;

        tracing::info!(user_id = user.id, role = user.role.as_str(), "user registered");

        Ok(UserResponse::from(user))
    }

    /// Checks the credentials; unknown email and wrong password look the same.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<User, AuthError> {
        let user = users::find_by_email(&self.db, &request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::warn!(user_id = user.id, "wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AuthError> {
        let user = self.authenticate(&request).await?;
        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<TokenResponse, AuthError> {
        let access_token = self
            .jwt_service
            .create_access_token(user.id, &user.email, user.role)?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
        })
    }

    /// Validate user session from token
    pub fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        self.jwt_service.extract_user_session(token)
    }

    pub async fn current_user(&self, session: &UserSession) -> Result<UserResponse, AuthError> {
        users::find_by_id(&self.db, session.user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }
}
