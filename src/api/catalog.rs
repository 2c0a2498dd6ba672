//! Catalog and inventory endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{CreateBookInfo, CreateBookItem},
        BookInfo, BookItemDetails,
    },
    AppState,
};

/// Catalogue a new title
#[utoipa::path(
    post,
    path = "/catalog",
    tag = "catalog",
    request_body = CreateBookInfo,
    responses(
        (status = 200, description = "Title catalogued", body = BookInfo),
        (status = 400, description = "Invalid input or duplicate ISBN", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book_info(
    State(state): State<AppState>,
    Json(info): Json<CreateBookInfo>,
) -> AppResult<Json<BookInfo>> {
    info.validate()?;

    let created = state.services.catalog.create_info(info).await?;
    Ok(Json(created))
}

/// List catalogued titles
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "All titles", body = Vec<BookInfo>)
    )
)]
pub async fn list_book_infos(State(state): State<AppState>) -> AppResult<Json<Vec<BookInfo>>> {
    let infos = state.services.catalog.list_infos().await?;
    Ok(Json(infos))
}

/// Stock a physical copy
#[utoipa::path(
    post,
    path = "/inventory",
    tag = "inventory",
    request_body = CreateBookItem,
    responses(
        (status = 200, description = "Copy stocked", body = BookItemDetails),
        (status = 400, description = "Invalid input or duplicate barcode", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown book info", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book_item(
    State(state): State<AppState>,
    Json(item): Json<CreateBookItem>,
) -> AppResult<Json<BookItemDetails>> {
    item.validate()?;

    let created = state.services.catalog.create_item(item).await?;
    Ok(Json(created))
}

/// List physical copies
#[utoipa::path(
    get,
    path = "/inventory",
    tag = "inventory",
    responses(
        (status = 200, description = "All copies", body = Vec<BookItemDetails>)
    )
)]
pub async fn list_book_items(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookItemDetails>>> {
    let items = state.services.catalog.list_items().await?;
    Ok(Json(items))
}
