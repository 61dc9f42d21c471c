use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::HeaderMap,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use availability_cell::SchedulingServices;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{bearer_token, require_practitioner};
use shared_utils::jwt::secrets_match;

use crate::models::CreateWaitlistEntryRequest;
use crate::services::WaitlistManager;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", what)))
}

// ==============================================================================
// CRON HANDLERS
// ==============================================================================

/// Expire stale entries. Called by the scheduler with `Authorization: Bearer <CRON_SECRET>`.
#[axum::debug_handler]
pub async fn cleanup_expired(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let presented = bearer_token(&headers)?;
    if !secrets_match(presented, &state.cron_secret) {
        warn!("Rejected waitlist cleanup call with invalid cron secret");
        return Err(AppError::Auth("Invalid cron secret".to_string()));
    }

    let manager = WaitlistManager::from_config(&state, Some(state.service_key()));
    let deleted = manager.expire_stale().await?;

    Ok(Json(json!({
        "success": true,
        "deleted": deleted,
    })))
}

// ==============================================================================
// PRACTITIONER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_entries(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let manager = WaitlistManager::from_config(&state, Some(auth.token()));

    let entries = manager.list(practitioner_id).await?;

    Ok(Json(json!({
        "total": entries.len(),
        "entries": entries,
    })))
}

#[axum::debug_handler]
pub async fn create_entry(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateWaitlistEntryRequest>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let manager = WaitlistManager::from_config(&state, Some(auth.token()));

    let entry = manager.create(practitioner_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn delete_entry(
    State(state): State<Arc<AppConfig>>,
    Path(entry_id): Path<String>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let entry_id = parse_id(&entry_id, "Waitlist entry")?;
    let manager = WaitlistManager::from_config(&state, Some(auth.token()));

    manager.delete(entry_id, practitioner_id).await?;

    Ok(Json(json!({ "success": true })))
}

#[axum::debug_handler]
pub async fn fulfill_entry(
    State(state): State<Arc<AppConfig>>,
    Path(entry_id): Path<String>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let entry_id = parse_id(&entry_id, "Waitlist entry")?;
    let manager = WaitlistManager::from_config(&state, Some(auth.token()));

    let entry = manager.fulfill(entry_id, practitioner_id).await?;

    Ok(Json(json!({
        "success": true,
        "entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn count_active(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let manager = WaitlistManager::from_config(&state, Some(auth.token()));

    let count = manager.count_active(practitioner_id).await?;

    Ok(Json(json!({ "count": count })))
}

/// Cancel one of the practitioner's appointments and offer the freed time to
/// the waitlist. Retrying an earlier cancellation reports `notified: 0`.
#[axum::debug_handler]
pub async fn cancel_and_promote(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let practitioner_id = require_practitioner(&user)?;
    let appointment_id = parse_id(&appointment_id, "Appointment")?;

    let scheduling = SchedulingServices::from_config(&state, Some(auth.token()));
    let cancellation = scheduling
        .booking
        .cancel_appointment(appointment_id, practitioner_id)
        .await?;

    let manager = WaitlistManager::from_config(&state, Some(auth.token()));
    let promotions = manager.promote_after(&cancellation).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": cancellation.appointment(),
        "notified": promotions.len(),
    })))
}
