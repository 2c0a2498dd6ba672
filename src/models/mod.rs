//! Data models for Librarium

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{BookInfo, BookItem, BookItemDetails, ItemStatus};
pub use user::{Identity, User};
