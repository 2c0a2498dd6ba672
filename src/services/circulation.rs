//! Borrow/return state machine over physical copies
//!
//! A copy is either `available` or `borrowed`. Borrowing requires
//! `available`; returning is accepted from either state, so returning a copy
//! that is already on the shelf succeeds without changing anything.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{BookItemDetails, Identity, ItemStatus},
    repository::{ItemStore, Transition},
};

#[derive(Clone)]
pub struct CirculationService {
    items: Arc<dyn ItemStore>,
}

impl CirculationService {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// Lend the copy with `barcode` to `actor`
    pub async fn borrow(&self, barcode: &str, actor: &Identity) -> AppResult<BookItemDetails> {
        let transition = self
            .items
            .transition(barcode, Some(ItemStatus::Available), ItemStatus::Borrowed)
            .await?;

        match transition {
            Transition::Applied(item) => {
                tracing::info!(
                    user_id = actor.user_id,
                    username = %actor.username,
                    barcode,
                    "Item borrowed"
                );
                Ok(item)
            }
            Transition::NotFound => Err(AppError::ItemNotFound(barcode.to_string())),
            Transition::Rejected(status) => {
                tracing::debug!(barcode, %status, "Borrow refused");
                Err(AppError::ItemNotAvailable(barcode.to_string()))
            }
        }
    }

    /// Put the copy with `barcode` back on the shelf
    pub async fn return_item(
        &self,
        barcode: &str,
        actor: &Identity,
    ) -> AppResult<BookItemDetails> {
        let transition = self
            .items
            .transition(barcode, None, ItemStatus::Available)
            .await?;

        match transition {
            Transition::Applied(item) => {
                tracing::info!(
                    user_id = actor.user_id,
                    username = %actor.username,
                    barcode,
                    "Item returned"
                );
                Ok(item)
            }
            Transition::NotFound => Err(AppError::ItemNotFound(barcode.to_string())),
            // No required state, so the store never rejects
            Transition::Rejected(_) => Err(AppError::Internal(format!(
                "Unconditional return of {} was rejected",
                barcode
            ))),
        }
    }
}
