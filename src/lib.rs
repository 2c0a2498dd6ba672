//! Librarium Library Catalog Server
//!
//! Tracks book metadata, physical copies and their borrow/return status
//! behind username/password authentication with bearer tokens.

use std::sync::Arc;

use mockable::Clock;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: &AppConfig, repository: repository::Repository, clock: Arc<dyn Clock>) -> Self {
        let services = services::Services::new(repository, &config.auth, clock);
        Self {
            services: Arc::new(services),
        }
    }
}
