use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Pull the raw token out of an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

// Middleware for authentication
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Resolve the caller's practitioner id, rejecting non-practitioner accounts.
pub fn require_practitioner(user: &User) -> Result<Uuid, AppError> {
    if !user.is_practitioner() {
        return Err(AppError::Forbidden("Practitioner account required".to_string()));
    }

    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Forbidden("Invalid practitioner identity".to_string()))
}

/// Resolve the caller's user id as a UUID.
pub fn require_user_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user identity".to_string()))
}
