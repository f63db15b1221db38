//! JWT authentication and role gating.
//!
//! Every mutating route extracts an [`AuthUser`] from the bearer token; role
//! checks are explicit per operation (e.g. only ADMIN may delete a product).

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::user::{self, Role};
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginCredentials {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Verifies credentials against the users table and issues a token.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: LoginCredentials) -> Result<TokenResponse, ServiceError> {
        credentials.validate()?;

        let account = user::Entity::find()
            .filter(user::Column::Email.eq(credentials.email.clone()))
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::Unauthorized("Invalid credentials".to_string()))?;

        if !verify_password(&account.password_hash, &credentials.password) {
            return Err(ServiceError::Unauthorized("Invalid credentials".to_string()));
        }
        if !account.is_active() {
            return Err(ServiceError::Forbidden("Account is not active".to_string()));
        }

        let role = account
            .role()
            .ok_or_else(|| ServiceError::InternalError(format!("Unknown role {}", account.role)))?;
        let access_token = self.issue_token(account.id, role)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl.as_secs(),
        })
    }

    pub fn issue_token(&self, user_id: Uuid, role: Role) -> Result<String, ServiceError> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.config.token_ttl.as_secs() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {e}")))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {e}")))
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// The verified identity behind a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Role gate: `Forbidden` unless the caller holds one of the given roles.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ServiceError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You are not authorized to perform this action".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = state.services.auth.validate_token(token)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    fn test_service() -> AuthService {
        AuthService::new(
            AuthConfig {
                jwt_secret: "test_secret_key_for_testing_purposes_only".to_string(),
                token_ttl: Duration::from_secs(3600),
            },
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue_token(user_id, Role::Keeper).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Keeper);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = test_service();
        let token = service.issue_token(Uuid::new_v4(), Role::User).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            service.validate_token(&tampered),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn role_gate_denies_outsiders() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(user.require_any(&[Role::Admin, Role::Keeper]).is_err());
        assert!(user.require_any(&[Role::User]).is_ok());
    }
}
