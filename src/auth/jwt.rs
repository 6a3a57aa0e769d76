use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::{AuthError, Claims, UserRole, UserSession};

/// JWT token service for creating and validating tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("access_token_expires_in", &self.access_token_expires_in)
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given secret and access token lifetime
    pub fn new(secret: &str, access_token_expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in,
        }
    }

    /// Create an access token for a user
    pub fn create_access_token(
        &self,
        user_id: i64,
        email: &str,
        role: UserRole,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.access_token_expires_in;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Jwt)
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Extract user session from token
    pub fn extract_user_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let claims = self.validate_token(token)?;
        UserSession::from_claims(&claims).map_err(|_| AuthError::InvalidToken)
    }

    /// Get access token expiration time in seconds
    pub fn access_token_expires_in_seconds(&self) -> usize {
        self.access_token_expires_in.num_seconds().max(0) as usize
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeaderFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeaderFormat);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> JwtService {
        JwtService::new("test_secret", Duration::minutes(30))
    }

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = service();

        let token = jwt_service
            .create_access_token(42, "coach@example.com", UserRole::Coach)
            .unwrap();

        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "coach@example.com");
        assert_eq!(claims.role, UserRole::Coach);
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            extract_bearer_token("Bearer test_token").unwrap(),
            "test_token"
        );

        assert!(extract_bearer_token("Invalid header").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_user_session_extraction() {
        let jwt_service = service();

        let token = jwt_service
            .create_access_token(7, "student@example.com", UserRole::Student)
            .unwrap();

        let session = jwt_service.extract_user_session(&token).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.email, "student@example.com");
        assert_eq!(session.role, UserRole::Student);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = JwtService::new("other_secret", Duration::minutes(30))
            .create_access_token(1, "a@example.com", UserRole::Coach)
            .unwrap();

        assert_matches!(service().validate_token(&token), Err(AuthError::InvalidToken));
        assert_matches!(service().validate_token("garbage"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let jwt_service = JwtService::new("test_secret", Duration::minutes(-10));
        let token = jwt_service
            .create_access_token(1, "a@example.com", UserRole::Student)
            .unwrap();

        assert_matches!(jwt_service.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_tokens_get_distinct_ids() {
        let jwt_service = service();
        let first = jwt_service
            .extract_user_session(
                &jwt_service
                    .create_access_token(1, "a@example.com", UserRole::Coach)
                    .unwrap(),
            )
            .unwrap();
        let second = jwt_service
            .extract_user_session(
                &jwt_service
                    .create_access_token(1, "a@example.com", UserRole::Coach)
                    .unwrap(),
            )
            .unwrap();

        assert_ne!(first.jti, second.jti);
    }
}
