// libs/availability-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// PRACTITIONER & CONSULTATION TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub booking_enabled: bool,
    pub min_booking_lead_minutes: Option<i32>,
}

impl Practitioner {
    /// Minimum notice before a slot may start, falling back to the platform default.
    pub fn booking_lead(&self, default_minutes: i64) -> Duration {
        let minutes = self
            .min_booking_lead_minutes
            .map(i64::from)
            .unwrap_or(default_minutes)
            .max(0);
        Duration::minutes(minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultationType {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub buffer_before_minutes: i32,
    #[serde(default)]
    pub buffer_after_minutes: i32,
    pub price_cents: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl ConsultationType {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn buffer_before(&self) -> Duration {
        Duration::minutes(i64::from(self.buffer_before_minutes.max(0)))
    }

    pub fn buffer_after(&self) -> Duration {
        Duration::minutes(i64::from(self.buffer_after_minutes.max(0)))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.duration_minutes <= 0 {
            return Err(format!("Consultation type {} has a non-positive duration", self.id));
        }
        if self.buffer_before_minutes < 0 || self.buffer_after_minutes < 0 {
            return Err(format!("Consultation type {} has a negative buffer", self.id));
        }
        Ok(())
    }
}

// ==============================================================================
// AVAILABILITY RULES
// ==============================================================================

/// Recurring weekly working hours. `weekday` is 0 = Sunday .. 6 = Saturday.
///
/// Times, dates and weekdays are UTC wall-clock values, as are the open
/// intervals of overrides; practitioners store their hours in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHourRule {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub weekday: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
}

impl WorkingHourRule {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.weekday == weekday_index(date)
            && self.valid_from.map_or(true, |from| date >= from)
            && self.valid_until.map_or(true, |until| date <= until)
            && self.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenInterval {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Date-specific replacement for the weekly rules: either closed for the day
/// or open only during `open_intervals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub override_date: NaiveDate,
    pub is_closed: bool,
    #[serde(default)]
    pub open_intervals: Vec<OpenInterval>,
    pub reason: Option<String>,
}

pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn is_confirmed(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.starts_at, self.ends_at)
    }
}

/// Result of a cancel request. Only `Cancelled` is a new cancellation event;
/// `AlreadyCancelled` is a repeat of an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum Cancellation {
    Cancelled(Appointment),
    AlreadyCancelled(Appointment),
}

impl Cancellation {
    pub fn appointment(&self) -> &Appointment {
        match self {
            Cancellation::Cancelled(appointment) | Cancellation::AlreadyCancelled(appointment) => appointment,
        }
    }

    pub fn into_appointment(self) -> Appointment {
        match self {
            Cancellation::Cancelled(appointment) | Cancellation::AlreadyCancelled(appointment) => appointment,
        }
    }

    /// True when this request performed the confirmed -> cancelled transition.
    pub fn is_new(&self) -> bool {
        matches!(self, Cancellation::Cancelled(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub consultation_type_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Copied from the consultation type at booking time.
    #[serde(default)]
    pub buffer_before_minutes: i32,
    #[serde(default)]
    pub buffer_after_minutes: i32,
}

impl NewAppointment {
    /// Time this appointment keeps the practitioner busy, buffers included.
    pub fn occupied(&self) -> TimeWindow {
        TimeWindow::new(self.starts_at, self.ends_at).widen(
            Duration::minutes(i64::from(self.buffer_before_minutes.max(0))),
            Duration::minutes(i64::from(self.buffer_after_minutes.max(0))),
        )
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `start..end` on `date`, both read as UTC.
    pub fn on_date(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(date.and_time(start).and_utc(), date.and_time(end).and_utc())
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn widen(&self, before: Duration, after: Duration) -> Self {
        Self::new(self.start - before, self.end + after)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerSummary {
    pub id: Uuid,
    pub slug: String,
    pub display_name: String,
}

impl From<&Practitioner> for PractitionerSummary {
    fn from(practitioner: &Practitioner) -> Self {
        Self {
            id: practitioner.id,
            slug: practitioner.slug.clone(),
            display_name: practitioner.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub consultation_type: ConsultationType,
    pub slots: Vec<DateTime<Utc>>,
    pub practitioner: PractitionerSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDaysResponse {
    pub available_days: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub consultation_type_id: Uuid,
    pub starts_at: DateTime<Utc>,
}
