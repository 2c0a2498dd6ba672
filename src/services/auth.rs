//! Registration and login

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::User,
    repository::CredentialStore,
    services::tokens::TokenCodec,
};

/// Well-formed Argon2id hash with default parameters that no password
/// matches. Unknown usernames are verified against it so a failed login
/// costs the same whether or not the account exists.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$t4ekBcNBiXAK1k0cL7JC6g$NWayV8fuDGHuShjytWF3DmrWZ2qObBvYb5gnudjypFc";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    tokens: TokenCodec,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn CredentialStore>, tokens: TokenCodec, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens,
            // Out-of-range lifetimes surface as an issuing error at login
            access_token_ttl: Duration::try_minutes(config.access_token_expire_minutes)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Create an account. The name is checked first; the store's own
    /// uniqueness check catches registrations racing past that read.
    pub async fn register(&self, username: &str, password: &str) -> AppResult<User> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::UsernameTaken);
        }

        let password_hash = self.hash_password(password)?;
        let user = self.users.create(username, &password_hash).await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and issue an access token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let Some(user) = self.users.find_by_username(username).await? else {
            verify_password(DUMMY_PASSWORD_HASH, password)?;
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(&user.username, Some(self.access_token_ttl))
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(user_id = user.id, username = %user.username, "User logged in");
        Ok(token)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

/// Verify a password against a stored PHC hash
fn verify_password(password_hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
