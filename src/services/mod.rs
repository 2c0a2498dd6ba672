//! Business logic services

pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod session;
pub mod tokens;

use std::sync::Arc;

use mockable::Clock;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub session: session::SessionGuard,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    repository: Repository,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let tokens = tokens::TokenCodec::new(&auth_config.jwt_secret, clock);

        Self {
            auth: auth::AuthService::new(repository.users.clone(), tokens.clone(), auth_config),
            session: session::SessionGuard::new(repository.users.clone(), tokens),
            catalog: catalog::CatalogService::new(repository.items.clone()),
            circulation: circulation::CirculationService::new(repository.items.clone()),
            repository,
        }
    }

    /// Whether the backing store answers
    pub async fn store_ready(&self) -> bool {
        match self.repository.users.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store readiness probe failed");
                false
            }
        }
    }
}
