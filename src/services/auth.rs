//! Registration, login, and stateless session tokens.
//!
//! Passwords are hashed with Argon2id; tokens are HS256 JWTs carrying the
//! user id and an expiry. Token verification re-fetches the user to confirm
//! the account still exists.

use crate::config::AuthConfig;
use crate::db::Store;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User with this email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Public user fields attached to authenticated requests.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<crate::entities::users::Model> for AuthUser {
    fn from(model: crate::entities::users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    exp: i64,
}

pub struct AuthService {
    store: Store,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub const fn new(store: Store, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Creates the account and issues its first session token.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(AuthUser, String), AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hash = hash_password(password).await?;
        let user = self.store.create_user(name, email, &hash).await?;

        let token = self.sign_token(user.id)?;
        self.store.set_user_token(user.id, &token).await?;

        Ok((AuthUser::from(user), token))
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(AuthUser, String), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sign_token(user.id)?;
        self.store.set_user_token(user.id, &token).await?;

        Ok((AuthUser::from(user), token))
    }

    /// Validates signature and expiry, then confirms the user still exists.
    pub async fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .store
            .get_user_by_id(data.claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthUser::from(user))
    }

    fn sign_token(&self, user_id: i32) -> Result<String, AuthError> {
        let exp = (chrono::Utc::now() + chrono::Duration::days(self.config.token_ttl_days))
            .timestamp();
        let claims = Claims { sub: user_id, exp };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Cookie lifetime in seconds, matching the token validity window.
    #[must_use]
    pub const fn token_max_age(&self) -> i64 {
        self.config.token_ttl_days * 24 * 60 * 60
    }
}

/// Argon2 is CPU-intensive and would block the async runtime if run inline.
async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();

    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))
    })
    .await
    .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))?
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash format: {e}")))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("hunter2-but-longer").await.unwrap();
        assert_ne!(hash, "hunter2-but-longer");
        assert!(verify_password("hunter2-but-longer", &hash).await.unwrap());
        assert!(!verify_password("wrong-password", &hash).await.unwrap());
    }

    #[test]
    fn token_round_trip() {
        let secret = "test-secret";
        let exp = (chrono::Utc::now() + chrono::Duration::days(1)).timestamp();
        let token = jsonwebtoken::encode(
            &Header::default(),
            &Claims { sub: 42, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = "test-secret";
        let exp = (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp();
        let token = jsonwebtoken::encode(
            &Header::default(),
            &Claims { sub: 42, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let exp = (chrono::Utc::now() + chrono::Duration::days(1)).timestamp();
        let token = jsonwebtoken::encode(
            &Header::default(),
            &Claims { sub: 42, exp },
            &EncodingKey::from_secret(b"secret-one"),
        )
        .unwrap();

        let result = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret-two"),
            &Validation::default(),
        );

        assert!(result.is_err());
    }
}
