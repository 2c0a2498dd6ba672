//! Catalog and inventory service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBookInfo, CreateBookItem},
        BookInfo, BookItemDetails,
    },
    repository::ItemStore,
};

#[derive(Clone)]
pub struct CatalogService {
    items: Arc<dyn ItemStore>,
}

impl CatalogService {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// Catalogue a new title
    pub async fn create_info(&self, info: CreateBookInfo) -> AppResult<BookInfo> {
        let created = self.items.create_info(&info).await?;
        tracing::info!(info_id = created.id, isbn = %created.isbn, "Book info catalogued");
        Ok(created)
    }

    pub async fn list_infos(&self) -> AppResult<Vec<BookInfo>> {
        self.items.list_infos().await
    }

    /// Stock a physical copy of an existing title
    pub async fn create_item(&self, item: CreateBookItem) -> AppResult<BookItemDetails> {
        if self.items.get_info(item.info_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Book info with id {} not found",
                item.info_id
            )));
        }

        let created = self.items.create_item(&item).await?;
        tracing::info!(item_id = created.id, barcode = %created.barcode, "Book item stocked");
        Ok(created)
    }

    pub async fn list_items(&self) -> AppResult<Vec<BookItemDetails>> {
        self.items.list_items().await
    }
}
