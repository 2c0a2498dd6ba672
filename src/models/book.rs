//! Book metadata and physical copy models

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, Decode, Encode, FromRow, Postgres, Row};
use utoipa::ToSchema;
use validator::Validate;

/// Circulation state of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Borrowed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "borrowed" => Ok(ItemStatus::Borrowed),
            _ => Err(format!("Invalid item status: {}", s)),
        }
    }
}

// Stored as VARCHAR, constrained by a CHECK in the schema
impl sqlx::Type<Postgres> for ItemStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for ItemStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ItemStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Bibliographic record shared by every copy of a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInfo {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub price: f64,
    pub intro: Option<String>,
}

/// Create book info request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInfo {
    #[validate(length(min = 1, max = 20))]
    pub isbn: String,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 50))]
    pub author: String,
    #[validate(length(max = 50))]
    pub publisher: String,
    pub price: f64,
    #[validate(length(max = 500))]
    pub intro: Option<String>,
}

/// Physical copy as stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookItem {
    pub id: i32,
    pub barcode: String,
    pub info_id: i32,
    pub status: ItemStatus,
}

/// Physical copy with its bibliographic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookItemDetails {
    pub id: i32,
    pub barcode: String,
    pub status: ItemStatus,
    pub info: BookInfo,
}

impl BookItemDetails {
    pub fn new(item: BookItem, info: BookInfo) -> Self {
        Self {
            id: item.id,
            barcode: item.barcode,
            status: item.status,
            info,
        }
    }

    /// Build from a `book_items` row joined with its `book_infos` row, the
    /// info columns aliased with an `info_` prefix.
    pub fn from_joined_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            barcode: row.try_get("barcode")?,
            status: row.try_get("status")?,
            info: BookInfo {
                id: row.try_get("info_id")?,
                isbn: row.try_get("info_isbn")?,
                title: row.try_get("info_title")?,
                author: row.try_get("info_author")?,
                publisher: row.try_get("info_publisher")?,
                price: row.try_get("info_price")?,
                intro: row.try_get("info_intro")?,
            },
        })
    }
}

/// Stock a new copy
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookItem {
    #[validate(length(min = 1, max = 50))]
    pub barcode: String,
    pub info_id: i32,
}

/// Borrow or return request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CirculationRequest {
    pub barcode: String,
}
