//! Items repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{is_foreign_key_violation, is_unique_violation, ItemStore, Transition};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBookInfo, CreateBookItem},
        BookInfo, BookItemDetails, ItemStatus,
    },
};

/// Projection shared by every query returning an item with its info
const ITEM_DETAILS_COLUMNS: &str = r#"
    bi.id, bi.barcode, bi.status,
    i.id AS info_id, i.isbn AS info_isbn, i.title AS info_title,
    i.author AS info_author, i.publisher AS info_publisher,
    i.price AS info_price, i.intro AS info_intro
"#;

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for ItemsRepository {
    async fn create_info(&self, info: &CreateBookInfo) -> AppResult<BookInfo> {
        sqlx::query_as::<_, BookInfo>(
            r#"
            INSERT INTO book_infos (isbn, title, author, publisher, price, intro)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&info.isbn)
        .bind(&info.title)
        .bind(&info.author)
        .bind(&info.publisher)
        .bind(info.price)
        .bind(&info.intro)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate(format!("ISBN {} already catalogued", info.isbn))
            } else {
                AppError::Database(e)
            }
        })
    }

    async fn get_info(&self, id: i32) -> AppResult<Option<BookInfo>> {
        let info = sqlx::query_as::<_, BookInfo>("SELECT * FROM book_infos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(info)
    }

    async fn list_infos(&self) -> AppResult<Vec<BookInfo>> {
        let infos = sqlx::query_as::<_, BookInfo>("SELECT * FROM book_infos ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(infos)
    }

    async fn create_item(&self, item: &CreateBookItem) -> AppResult<BookItemDetails> {
        let row = sqlx::query(&format!(
            r#"
            WITH bi AS (
                INSERT INTO book_items (barcode, info_id, status)
                VALUES ($1, $2, $3)
                RETURNING id, barcode, info_id, status
            )
            SELECT {ITEM_DETAILS_COLUMNS}
            FROM bi
            JOIN book_infos i ON i.id = bi.info_id
            "#
        ))
        .bind(&item.barcode)
        .bind(item.info_id)
        .bind(ItemStatus::Available.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate(format!("Barcode {} already stocked", item.barcode))
            } else if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Book info with id {} not found", item.info_id))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(BookItemDetails::from_joined_row(&row)?)
    }

    async fn get_by_barcode(&self, barcode: &str) -> AppResult<Option<BookItemDetails>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ITEM_DETAILS_COLUMNS}
            FROM book_items bi
            JOIN book_infos i ON i.id = bi.info_id
            WHERE bi.barcode = $1
            "#
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(BookItemDetails::from_joined_row)
            .transpose()
            .map_err(AppError::from)
    }

    async fn list_items(&self) -> AppResult<Vec<BookItemDetails>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_DETAILS_COLUMNS}
            FROM book_items bi
            JOIN book_infos i ON i.id = bi.info_id
            ORDER BY bi.id
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(BookItemDetails::from_joined_row(row)?);
        }
        Ok(result)
    }

    async fn transition(
        &self,
        barcode: &str,
        from: Option<ItemStatus>,
        to: ItemStatus,
    ) -> AppResult<Transition> {
        // Single conditional UPDATE: two racing borrowers cannot both match
        let row = sqlx::query(&format!(
            r#"
            WITH bi AS (
                UPDATE book_items
                SET status = $2
                WHERE barcode = $1 AND ($3::varchar IS NULL OR status = $3)
                RETURNING id, barcode, info_id, status
            )
            SELECT {ITEM_DETAILS_COLUMNS}
            FROM bi
            JOIN book_infos i ON i.id = bi.info_id
            "#
        ))
        .bind(barcode)
        .bind(to.as_str())
        .bind(from.map(|status| status.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Transition::Applied(BookItemDetails::from_joined_row(&row)?));
        }

        let current: Option<ItemStatus> =
            sqlx::query_scalar("SELECT status FROM book_items WHERE barcode = $1")
                .bind(barcode)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match current {
            Some(status) => Transition::Rejected(status),
            None => Transition::NotFound,
        })
    }
}
