use axum::{
    extract::{rejection::JsonRejection, Json, State},
    Extension,
};

use crate::{
    app::AppState,
    error::Result,
    handlers::ApiResponse,
    middleware::AuthUser,
    models::user::{LoginRequest, LoginResponse, UserDto},
    report::ValidationError,
    services::{auth_service::verify_password_blocking, AuthError},
};

/// Exchange username and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    request: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>> {
    let Json(request) = request.map_err(|rejection| {
        ValidationError::rejected(&rejection.body_text(), LoginRequest::FIELDS, "body")
    })?;

    let user = state
        .users
        .get_user_by_username(&request.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.auth.issue_token(&user)?;
    tracing::info!(user = %user.username, "user logged in");

    Ok(ApiResponse::with_message(
        LoginResponse {
            user: UserDto::from(user),
            token,
        },
        "Login successful",
    ))
}

/// The user behind the bearer token
pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResponse<UserDto> {
    ApiResponse::ok(user)
}
