//! Repository layer for record storage
//!
//! Services talk to storage through the [`CredentialStore`] and [`ItemStore`]
//! traits. `users` and `items` hold the Postgres implementations, `memory`
//! holds the in-process ones used for local runs and tests.

pub mod items;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{CreateBookInfo, CreateBookItem},
        BookInfo, BookItemDetails, ItemStatus, User,
    },
};

/// Persistence of user identities
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by exact username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a user. Fails with `AppError::UsernameTaken` when the username
    /// is already present.
    async fn create(&self, username: &str, password_hash: &str) -> AppResult<User>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> AppResult<()>;
}

/// Outcome of a conditional status update
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The row was updated; carries the item after the update
    Applied(BookItemDetails),
    /// No item has that barcode
    NotFound,
    /// The item exists but was not in the required state
    Rejected(ItemStatus),
}

/// Persistence of catalog records and physical copies
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create_info(&self, info: &CreateBookInfo) -> AppResult<BookInfo>;

    async fn get_info(&self, id: i32) -> AppResult<Option<BookInfo>>;

    async fn list_infos(&self) -> AppResult<Vec<BookInfo>>;

    /// Stock a copy with `available` status
    async fn create_item(&self, item: &CreateBookItem) -> AppResult<BookItemDetails>;

    async fn get_by_barcode(&self, barcode: &str) -> AppResult<Option<BookItemDetails>>;

    async fn list_items(&self) -> AppResult<Vec<BookItemDetails>>;

    /// Atomically set the status of `barcode` to `to`, provided the current
    /// status equals `from` (any status when `from` is `None`).
    async fn transition(
        &self,
        barcode: &str,
        from: Option<ItemStatus>,
        to: ItemStatus,
    ) -> AppResult<Transition>;
}

/// Main repository struct holding the store handles
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn CredentialStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            items: Arc::new(items::ItemsRepository::new(pool)),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryCredentialStore::new()),
            items: Arc::new(memory::MemoryItemStore::new()),
        }
    }
}

/// True when the error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True when the error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
