//! In-process adapters for the availability traits. Used by tests and local
//! development runs without a Supabase project.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    Appointment, AppointmentStatus, AvailabilityOverride, ConsultationType, NewAppointment,
    Practitioner, TimeWindow, WorkingHourRule,
};
use crate::services::store::{AppointmentLedger, AvailabilityStore};

#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    practitioners: RwLock<Vec<Practitioner>>,
    consultation_types: RwLock<Vec<ConsultationType>>,
    rules: RwLock<Vec<WorkingHourRule>>,
    overrides: RwLock<Vec<AvailabilityOverride>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_practitioner(&self, practitioner: Practitioner) {
        self.practitioners.write().await.push(practitioner);
    }

    pub async fn add_consultation_type(&self, consultation_type: ConsultationType) {
        self.consultation_types.write().await.push(consultation_type);
    }

    pub async fn add_rule(&self, rule: WorkingHourRule) {
        self.rules.write().await.push(rule);
    }

    pub async fn add_override(&self, availability_override: AvailabilityOverride) {
        self.overrides.write().await.push(availability_override);
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn find_practitioner(&self, practitioner_id: Uuid) -> Result<Option<Practitioner>, SchedulingError> {
        Ok(self.practitioners.read().await.iter().find(|p| p.id == practitioner_id).cloned())
    }

    async fn find_practitioner_by_slug(&self, slug: &str) -> Result<Option<Practitioner>, SchedulingError> {
        Ok(self.practitioners.read().await.iter().find(|p| p.slug == slug).cloned())
    }

    async fn find_consultation_type(
        &self,
        practitioner_id: Uuid,
        consultation_type_id: Uuid,
    ) -> Result<Option<ConsultationType>, SchedulingError> {
        Ok(self
            .consultation_types
            .read()
            .await
            .iter()
            .find(|t| t.id == consultation_type_id && t.practitioner_id == practitioner_id)
            .cloned())
    }

    async fn list_consultation_types(&self, practitioner_id: Uuid) -> Result<Vec<ConsultationType>, SchedulingError> {
        Ok(self
            .consultation_types
            .read()
            .await
            .iter()
            .filter(|t| t.practitioner_id == practitioner_id)
            .cloned()
            .collect())
    }

    async fn working_hour_rules(
        &self,
        practitioner_id: Uuid,
        weekday: Option<u32>,
    ) -> Result<Vec<WorkingHourRule>, SchedulingError> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.practitioner_id == practitioner_id)
            .filter(|r| weekday.map_or(true, |day| r.weekday == day))
            .cloned()
            .collect())
    }

    async fn overrides_between(
        &self,
        practitioner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>, SchedulingError> {
        Ok(self
            .overrides
            .read()
            .await
            .iter()
            .filter(|o| o.practitioner_id == practitioner_id)
            .filter(|o| o.override_date >= from && o.override_date <= to)
            .cloned()
            .collect())
    }
}

/// Ledger whose insert check and write happen under one lock, mirroring the
/// buffered exclusion constraint on the real table. Each row keeps the window
/// it occupies including its consultation type's buffers.
#[derive(Default)]
pub struct InMemoryAppointmentLedger {
    appointments: Mutex<Vec<(Appointment, TimeWindow)>>,
}

impl InMemoryAppointmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an appointment that occupies only its own `[starts_at, ends_at)`.
    pub async fn add_appointment(&self, appointment: Appointment) {
        let occupied = appointment.window();
        self.appointments.lock().await.push((appointment, occupied));
    }

    pub async fn all(&self) -> Vec<Appointment> {
        self.appointments.lock().await.iter().map(|(a, _)| a.clone()).collect()
    }
}

#[async_trait]
impl AppointmentLedger for InMemoryAppointmentLedger {
    async fn confirmed_between(
        &self,
        practitioner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut found: Vec<Appointment> = self
            .appointments
            .lock()
            .await
            .iter()
            .map(|(a, _)| a)
            .filter(|a| a.practitioner_id == practitioner_id && a.is_confirmed())
            .filter(|a| a.starts_at < to && a.ends_at > from)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.starts_at);
        Ok(found)
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
    ) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self
            .appointments
            .lock()
            .await
            .iter()
            .map(|(a, _)| a)
            .find(|a| a.id == appointment_id && a.practitioner_id == practitioner_id)
            .cloned())
    }

    async fn insert_confirmed(&self, appointment: NewAppointment) -> Result<Appointment, SchedulingError> {
        let mut appointments = self.appointments.lock().await;

        let needed = appointment.occupied();
        let taken = appointments.iter().any(|(existing, occupied)| {
            existing.practitioner_id == appointment.practitioner_id
                && existing.is_confirmed()
                && occupied.overlaps(&needed)
        });
        if taken {
            return Err(SchedulingError::SlotUnavailable);
        }

        let created = Appointment {
            id: Uuid::new_v4(),
            practitioner_id: appointment.practitioner_id,
            patient_id: appointment.patient_id,
            consultation_type_id: appointment.consultation_type_id,
            starts_at: appointment.starts_at,
            ends_at: appointment.ends_at,
            status: AppointmentStatus::Confirmed,
        };
        appointments.push((created.clone(), needed));

        Ok(created)
    }

    async fn cancel(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
        _cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let mut appointments = self.appointments.lock().await;

        Ok(appointments
            .iter_mut()
            .map(|(a, _)| a)
            .find(|a| a.id == appointment_id && a.practitioner_id == practitioner_id && a.is_confirmed())
            .map(|a| {
                a.status = AppointmentStatus::Cancelled;
                a.clone()
            }))
    }
}
