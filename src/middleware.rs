use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    app::AppState,
    error::{AppError, Result},
    models::UserDto,
    services::AuthError,
};

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserDto);

/// Rejects requests without a valid bearer token for an existing user
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer(req.headers())?;
    let claims = state.auth.verify_token(token)?;

    let user = state
        .users
        .get_user_by_id(&claims.sub)
        .await?
        .ok_or(AppError::Auth(AuthError::UserNotFound))?;

    req.extensions_mut().insert(AuthUser(UserDto::from(user)));
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> std::result::Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|_| AuthError::InvalidToken)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
