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
    pub fn new(secret: &str) -> Self {
        Self::with_expiry(secret, 60)
    }

    pub fn with_expiry(secret: &str, expires_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: Duration::minutes(expires_minutes.max(1)),
        }
    }

    pub fn create_access_token(&self, user_id: i64, email: &str, role: UserRole) -> Result<String, AuthError> {
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

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    pub fn extract_user_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let claims = self.validate_token(token)?;
        UserSession::from_claims(&claims).map_err(|_| AuthError::InvalidToken)
    }

    pub fn access_token_expires_in_seconds(&self) -> usize {
        self.access_token_expires_in.num_seconds() as usize
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeaderFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = JwtService::new("test_secret");
        let token = jwt_service
            .create_access_token(42, "student@example.com", UserRole::Student)
            .unwrap();

        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "student@example.com");
        assert_eq!(claims.role, UserRole::Student);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret_a");
        let verifier = JwtService::new("secret_b");
        let token = issuer.create_access_token(1, "a@example.com", UserRole::Admin).unwrap();

        assert!(matches!(verifier.validate_token(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer test_token").unwrap(), "test_token");

        assert!(extract_bearer_token("Invalid header").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
        assert!(extract_bearer_token("bearer lowercase").is_err());
    }

    #[test]
    fn test_user_session_extraction() {
        let jwt_service = JwtService::with_expiry("test_secret", 5);
        let token = jwt_service
            .create_access_token(7, "teacher@example.com", UserRole::Teacher)
            .unwrap();

        let session = jwt_service.extract_user_session(&token).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.email, "teacher@example.com");
        assert_eq!(session.role, UserRole::Teacher);
        assert_eq!(jwt_service.access_token_expires_in_seconds(), 300);
    }

    #[test]
    fn test_each_token_gets_unique_jti() {
        let jwt_service = JwtService::new("test_secret");
        let a = jwt_service.create_access_token(1, "a@example.com", UserRole::Admin).unwrap();
        let b = jwt_service.create_access_token(1, "a@example.com", UserRole::Admin).unwrap();

        let jti_a = jwt_service.validate_token(&a).unwrap().jti;
        let jti_b = jwt_service.validate_token(&b).unwrap().jti;
        assert_ne!(jti_a, jti_b);
    }
}
