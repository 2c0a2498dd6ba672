//! Registration and login endpoints

use axum::{extract::State, Form, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{LoginForm, RegisterRequest, TokenResponse, UserResponse},
    AppState,
};

use super::AuthenticatedUser;

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Username taken or invalid", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    request.validate()?;

    let user = state
        .services
        .auth
        .register(&request.username, &request.password)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth
        .login(&form.username, &form.password)
        .await?;

    Ok(Json(TokenResponse::bearer(token)))
}

/// Get the account behind the bearer token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(identity))
}
