//! Borrow and return endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{book::CirculationRequest, BookItemDetails},
    AppState,
};

use super::AuthenticatedUser;

/// Borrow a copy by barcode
#[utoipa::path(
    post,
    path = "/circulation/borrow",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = CirculationRequest,
    responses(
        (status = 200, description = "Item borrowed", body = BookItemDetails),
        (status = 400, description = "Item already borrowed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown barcode", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<BookItemDetails>> {
    let item = state
        .services
        .circulation
        .borrow(&request.barcode, &identity)
        .await?;

    Ok(Json(item))
}

/// Return a copy by barcode
#[utoipa::path(
    post,
    path = "/circulation/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = CirculationRequest,
    responses(
        (status = 200, description = "Item returned", body = BookItemDetails),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown barcode", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_item(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<CirculationRequest>,
) -> AppResult<Json<BookItemDetails>> {
    let item = state
        .services
        .circulation
        .return_item(&request.barcode, &identity)
        .await?;

    Ok(Json(item))
}
