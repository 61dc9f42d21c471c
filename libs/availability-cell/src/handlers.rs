use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_user_id;

use crate::models::{AvailableDaysResponse, BookSlotRequest, PractitionerSummary, SlotsResponse};
use crate::services::{parse_month, SchedulingServices};

#[derive(Debug, Deserialize)]
pub struct AvailableDaysQuery {
    pub month: Option<String>,
    pub consultation_type_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
    pub consultation_type_id: Option<String>,
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 128
        && slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn checked_slug(slug: &str) -> Result<&str, AppError> {
    if is_valid_slug(slug) {
        Ok(slug)
    } else {
        Err(AppError::NotFound("Practitioner not found".to_string()))
    }
}

fn consultation_type_param(value: Option<String>) -> Result<Uuid, AppError> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("consultation_type_id is required".to_string()))?;

    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::ValidationError("consultation_type_id must be a UUID".to_string()))
}

/// Public booking reads run with the service key; practitioner rows are
/// gated by `booking_enabled` rather than by row-level security.
fn public_services(config: &AppConfig) -> SchedulingServices {
    SchedulingServices::from_config(config, Some(config.service_key()))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_days(
    State(state): State<Arc<AppConfig>>,
    Path(slug): Path<String>,
    Query(query): Query<AvailableDaysQuery>,
) -> Result<Json<AvailableDaysResponse>, AppError> {
    let slug = checked_slug(&slug)?;
    let month = query
        .month
        .ok_or_else(|| AppError::ValidationError("month is required (YYYY-MM)".to_string()))?;
    let (year, month) = parse_month(&month)?;
    let consultation_type_id = consultation_type_param(query.consultation_type_id)?;

    let services = public_services(&state);
    let practitioner = services.booking.bookable_practitioner(slug).await?;
    let consultation_type = services
        .slots
        .resolve_consultation_type(&practitioner, consultation_type_id)
        .await?;

    let days = services
        .months
        .compute_available_days_for(&practitioner, &consultation_type, year, month)
        .await?;

    debug!("{} available days for {} in {}-{:02}", days.len(), slug, year, month);

    Ok(Json(AvailableDaysResponse {
        available_days: days.into_iter().collect(),
    }))
}

#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<AppConfig>>,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let slug = checked_slug(&slug)?;
    let date = query
        .date
        .ok_or_else(|| AppError::ValidationError("date is required (YYYY-MM-DD)".to_string()))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", date)))?;
    let consultation_type_id = consultation_type_param(query.consultation_type_id)?;

    let services = public_services(&state);
    let practitioner = services.booking.bookable_practitioner(slug).await?;
    let consultation_type = services
        .slots
        .resolve_consultation_type(&practitioner, consultation_type_id)
        .await?;

    let slots = services
        .slots
        .compute_slots_for(&practitioner, &consultation_type, date)
        .await?;

    Ok(Json(SlotsResponse {
        date,
        consultation_type,
        slots,
        practitioner: PractitionerSummary::from(&practitioner),
    }))
}

// ==============================================================================
// AUTHENTICATED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(slug): Path<String>,
    Extension(user): Extension<User>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let slug = checked_slug(&slug)?;
    let patient_id = require_user_id(&user)?;

    let services = public_services(&state);
    let practitioner = services.booking.bookable_practitioner(slug).await?;
    let appointment = services
        .booking
        .book_slot(&practitioner, patient_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}
