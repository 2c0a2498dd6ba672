//! In-memory store implementations

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, ItemStore, Transition};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBookInfo, CreateBookItem},
        BookInfo, BookItem, BookItemDetails, ItemStatus, User,
    },
};

/// In-memory implementation of [`CredentialStore`]
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let mut users = self.users.write().await;

        if users.contains_key(username) {
            return Err(AppError::UsernameTaken);
        }

        let user = User {
            id: users.len() as i32 + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.insert(user.username.clone(), user.clone());

        Ok(user)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inventory {
    infos: BTreeMap<i32, BookInfo>,
    items: BTreeMap<i32, BookItem>,
    /// barcode -> item id
    barcodes: HashMap<String, i32>,
}

impl Inventory {
    fn details(&self, item: &BookItem) -> AppResult<BookItemDetails> {
        let info = self.infos.get(&item.info_id).cloned().ok_or_else(|| {
            AppError::Internal(format!("Item {} references missing info", item.barcode))
        })?;
        Ok(BookItemDetails::new(item.clone(), info))
    }
}

/// In-memory implementation of [`ItemStore`]
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    inventory: RwLock<Inventory>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create_info(&self, info: &CreateBookInfo) -> AppResult<BookInfo> {
        let mut inventory = self.inventory.write().await;

        if inventory.infos.values().any(|existing| existing.isbn == info.isbn) {
            return Err(AppError::Duplicate(format!(
                "ISBN {} already catalogued",
                info.isbn
            )));
        }

        let id = inventory.infos.len() as i32 + 1;
        let created = BookInfo {
            id,
            isbn: info.isbn.clone(),
            title: info.title.clone(),
            author: info.author.clone(),
            publisher: info.publisher.clone(),
            price: info.price,
            intro: info.intro.clone(),
        };
        inventory.infos.insert(id, created.clone());

        Ok(created)
    }

    async fn get_info(&self, id: i32) -> AppResult<Option<BookInfo>> {
        let inventory = self.inventory.read().await;
        Ok(inventory.infos.get(&id).cloned())
    }

    async fn list_infos(&self) -> AppResult<Vec<BookInfo>> {
        let inventory = self.inventory.read().await;
        Ok(inventory.infos.values().cloned().collect())
    }

    async fn create_item(&self, item: &CreateBookItem) -> AppResult<BookItemDetails> {
        let mut inventory = self.inventory.write().await;

        if inventory.barcodes.contains_key(&item.barcode) {
            return Err(AppError::Duplicate(format!(
                "Barcode {} already stocked",
                item.barcode
            )));
        }
        if !inventory.infos.contains_key(&item.info_id) {
            return Err(AppError::NotFound(format!(
                "Book info with id {} not found",
                item.info_id
            )));
        }

        let id = inventory.items.len() as i32 + 1;
        let created = BookItem {
            id,
            barcode: item.barcode.clone(),
            info_id: item.info_id,
            status: ItemStatus::Available,
        };
        inventory.barcodes.insert(created.barcode.clone(), id);
        inventory.items.insert(id, created.clone());

        inventory.details(&created)
    }

    async fn get_by_barcode(&self, barcode: &str) -> AppResult<Option<BookItemDetails>> {
        let inventory = self.inventory.read().await;

        match inventory
            .barcodes
            .get(barcode)
            .and_then(|id| inventory.items.get(id))
        {
            Some(item) => inventory.details(item).map(Some),
            None => Ok(None),
        }
    }

    async fn list_items(&self) -> AppResult<Vec<BookItemDetails>> {
        let inventory = self.inventory.read().await;
        inventory
            .items
            .values()
            .map(|item| inventory.details(item))
            .collect()
    }

    async fn transition(
        &self,
        barcode: &str,
        from: Option<ItemStatus>,
        to: ItemStatus,
    ) -> AppResult<Transition> {
        // Check and update under one write lock
        let mut inventory = self.inventory.write().await;

        let Some(id) = inventory.barcodes.get(barcode).copied() else {
            return Ok(Transition::NotFound);
        };
        let Some(item) = inventory.items.get_mut(&id) else {
            return Ok(Transition::NotFound);
        };

        if let Some(required) = from {
            if item.status != required {
                return Ok(Transition::Rejected(item.status));
            }
        }
        item.status = to;

        let updated = item.clone();
        inventory.details(&updated).map(Transition::Applied)
    }
}
