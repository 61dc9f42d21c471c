use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Appointment, AvailabilityOverride, ConsultationType, NewAppointment, Practitioner,
    WorkingHourRule,
};

/// Read access to practitioners, consultation types, weekly rules and overrides.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find_practitioner(&self, practitioner_id: Uuid) -> Result<Option<Practitioner>, SchedulingError>;

    async fn find_practitioner_by_slug(&self, slug: &str) -> Result<Option<Practitioner>, SchedulingError>;

    /// Only returns the type when it belongs to `practitioner_id`.
    async fn find_consultation_type(
        &self,
        practitioner_id: Uuid,
        consultation_type_id: Uuid,
    ) -> Result<Option<ConsultationType>, SchedulingError>;

    async fn list_consultation_types(&self, practitioner_id: Uuid) -> Result<Vec<ConsultationType>, SchedulingError>;

    /// Weekly rules, optionally narrowed to one weekday (0 = Sunday).
    async fn working_hour_rules(
        &self,
        practitioner_id: Uuid,
        weekday: Option<u32>,
    ) -> Result<Vec<WorkingHourRule>, SchedulingError>;

    /// Overrides dated within `[from, to]`.
    async fn overrides_between(
        &self,
        practitioner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>, SchedulingError>;
}

/// Source of truth for occupied time.
///
/// `insert_confirmed` is the exclusivity guarantee for concurrent bookings: it
/// must fail with [`SchedulingError::SlotUnavailable`] when a confirmed
/// appointment overlapping the new one already exists, atomically with the
/// insert.
#[async_trait]
pub trait AppointmentLedger: Send + Sync {
    /// Confirmed appointments intersecting `[from, to)`.
    async fn confirmed_between(
        &self,
        practitioner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
    ) -> Result<Option<Appointment>, SchedulingError>;

    async fn insert_confirmed(&self, appointment: NewAppointment) -> Result<Appointment, SchedulingError>;

    /// Conditional confirmed -> cancelled transition. `None` when no confirmed
    /// appointment with that id belongs to the practitioner.
    async fn cancel(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, SchedulingError>;
}
