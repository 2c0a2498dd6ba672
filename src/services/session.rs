//! Request-time authentication gate

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Identity,
    repository::CredentialStore,
    services::tokens::TokenCodec,
};

#[derive(Clone)]
pub struct SessionGuard {
    users: Arc<dyn CredentialStore>,
    tokens: TokenCodec,
}

impl SessionGuard {
    pub fn new(users: Arc<dyn CredentialStore>, tokens: TokenCodec) -> Self {
        Self { users, tokens }
    }

    /// Resolve the caller from a raw `Authorization` header value.
    ///
    /// Every rejection is reported as the same `Unauthorized` error; the
    /// reason is only logged.
    pub async fn authenticate(&self, authorization: Option<&str>) -> AppResult<Identity> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or_else(|| {
                tracing::debug!("Missing or malformed bearer credential");
                AppError::Unauthorized
            })?;

        let username = self.tokens.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            AppError::Unauthorized
        })?;

        let user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or_else(|| {
                tracing::debug!(%username, "Token subject does not exist");
                AppError::Unauthorized
            })?;

        Ok(Identity::from(user))
    }
}

/// Extract the credential from `Bearer <token>`, scheme case-insensitive
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        models::User,
        repository::MockCredentialStore,
        services::tokens::testing::ManualClock,
    };

    fn guard_with(
        store: MockCredentialStore,
    ) -> (SessionGuard, TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let tokens = TokenCodec::new("guard-secret", clock.clone());
        (SessionGuard::new(Arc::new(store), tokens.clone()), tokens, clock)
    }

    fn known_users() -> MockCredentialStore {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_username().returning(|username| {
            Ok((username == "bob").then(|| User {
                id: 3,
                username: "bob".to_string(),
                password_hash: "$argon2id$irrelevant".to_string(),
            }))
        });
        store
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[tokio::test]
    async fn test_valid_token_resolves_identity() {
        let (guard, tokens, _) = guard_with(known_users());
        let token = tokens.issue("bob", Some(Duration::minutes(30))).unwrap();

        let identity = guard
            .authenticate(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: 3,
                username: "bob".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_username().times(0);
        let (guard, _, _) = guard_with(store);

        assert!(matches!(
            guard.authenticate(None).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            guard.authenticate(Some("Token abc")).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let (guard, tokens, clock) = guard_with(known_users());
        let token = tokens.issue("bob", None).unwrap();
        clock.advance(Duration::minutes(15));

        assert!(matches!(
            guard.authenticate(Some(&format!("Bearer {}", token))).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthorized() {
        let (guard, tokens, _) = guard_with(known_users());
        let token = tokens.issue("ghost", None).unwrap();

        assert!(matches!(
            guard.authenticate(Some(&format!("Bearer {}", token))).await,
            Err(AppError::Unauthorized)
        ));
    }
}
