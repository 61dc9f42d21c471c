// libs/waitlist-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    Active,
    Expired,
    Fulfilled,
    Deleted,
}

impl WaitlistStatus {
    /// Expired, fulfilled and deleted entries never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WaitlistStatus::Active)
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitlistStatus::Active => write!(f, "active"),
            WaitlistStatus::Expired => write!(f, "expired"),
            WaitlistStatus::Fulfilled => write!(f, "fulfilled"),
            WaitlistStatus::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub requested_from: NaiveDate,
    pub requested_until: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: WaitlistStatus,
    pub notes: Option<String>,
}

impl WaitlistEntry {
    /// Active and not yet past `expires_at`, whether or not a sweep has run.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status == WaitlistStatus::Active && self.expires_at > now
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.requested_from <= date && date <= self.requested_until
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWaitlistEntry {
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub requested_from: NaiveDate,
    pub requested_until: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub notes: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWaitlistEntryRequest {
    pub patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub requested_from: NaiveDate,
    /// Defaults to `requested_from` for a single-day request.
    pub requested_until: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A waitlisted patient who can be offered time freed by a cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitlistPromotion {
    pub entry: WaitlistEntry,
    pub date: NaiveDate,
    pub slots: Vec<DateTime<Utc>>,
}
