use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::error::SchedulingError;
use crate::models::{
    Appointment, AvailabilityOverride, ConsultationType, NewAppointment, Practitioner,
    WorkingHourRule,
};
use crate::services::store::{AppointmentLedger, AvailabilityStore};

// PostgREST reads '+' in a query string as a space, so timestamps go out in Z form
pub(crate) fn timestamp_param(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: Option<String>) -> Self {
        Self { supabase, auth_token }
    }

    async fn select<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, SchedulingError> {
        let rows: Vec<T> = self.supabase.request(
            Method::GET,
            path,
            self.auth_token.as_deref(),
            None,
        ).await?;
        Ok(rows)
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn find_practitioner(&self, practitioner_id: Uuid) -> Result<Option<Practitioner>, SchedulingError> {
        let path = format!("/rest/v1/practitioners?id=eq.{}&limit=1", practitioner_id);
        Ok(self.select::<Practitioner>(&path).await?.into_iter().next())
    }

    async fn find_practitioner_by_slug(&self, slug: &str) -> Result<Option<Practitioner>, SchedulingError> {
        debug!("Resolving practitioner by slug: {}", slug);
        let path = format!("/rest/v1/practitioners?slug=eq.{}&limit=1", slug);
        Ok(self.select::<Practitioner>(&path).await?.into_iter().next())
    }

    async fn find_consultation_type(
        &self,
        practitioner_id: Uuid,
        consultation_type_id: Uuid,
    ) -> Result<Option<ConsultationType>, SchedulingError> {
        let path = format!(
            "/rest/v1/consultation_types?id=eq.{}&practitioner_id=eq.{}&limit=1",
            consultation_type_id, practitioner_id
        );
        Ok(self.select::<ConsultationType>(&path).await?.into_iter().next())
    }

    async fn list_consultation_types(&self, practitioner_id: Uuid) -> Result<Vec<ConsultationType>, SchedulingError> {
        let path = format!("/rest/v1/consultation_types?practitioner_id=eq.{}", practitioner_id);
        self.select(&path).await
    }

    async fn working_hour_rules(
        &self,
        practitioner_id: Uuid,
        weekday: Option<u32>,
    ) -> Result<Vec<WorkingHourRule>, SchedulingError> {
        let mut path = format!("/rest/v1/working_hour_rules?practitioner_id=eq.{}", practitioner_id);
        if let Some(day) = weekday {
            path.push_str(&format!("&weekday=eq.{}", day));
        }
        path.push_str("&order=weekday.asc,start_time.asc");

        self.select(&path).await
    }

    async fn overrides_between(
        &self,
        practitioner_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>, SchedulingError> {
        let path = format!(
            "/rest/v1/availability_overrides?practitioner_id=eq.{}&override_date=gte.{}&override_date=lte.{}&order=override_date.asc",
            practitioner_id, from, to
        );
        self.select(&path).await
    }
}

pub struct SupabaseAppointmentLedger {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseAppointmentLedger {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: Option<String>) -> Self {
        Self { supabase, auth_token }
    }
}

#[async_trait]
impl AppointmentLedger for SupabaseAppointmentLedger {
    async fn confirmed_between(
        &self,
        practitioner_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?practitioner_id=eq.{}&status=eq.confirmed&starts_at=lt.{}&ends_at=gt.{}&order=starts_at.asc",
            practitioner_id,
            timestamp_param(to),
            timestamp_param(from),
        );

        let appointments: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            self.auth_token.as_deref(),
            None,
        ).await?;

        debug!("Loaded {} confirmed appointments for practitioner {}", appointments.len(), practitioner_id);
        Ok(appointments)
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&practitioner_id=eq.{}&limit=1",
            appointment_id, practitioner_id
        );

        let appointments: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            self.auth_token.as_deref(),
            None,
        ).await?;

        Ok(appointments.into_iter().next())
    }

    async fn insert_confirmed(&self, appointment: NewAppointment) -> Result<Appointment, SchedulingError> {
        let body = json!({
            "practitioner_id": appointment.practitioner_id,
            "patient_id": appointment.patient_id,
            "consultation_type_id": appointment.consultation_type_id,
            "starts_at": timestamp_param(appointment.starts_at),
            "ends_at": timestamp_param(appointment.ends_at),
            "buffer_before_minutes": appointment.buffer_before_minutes,
            "buffer_after_minutes": appointment.buffer_after_minutes,
            "status": "confirmed",
        });

        // The appointments table carries an exclusion constraint over confirmed
        // (practitioner_id, tstzrange(starts_at - buffer_before, ends_at + buffer_after));
        // PostgREST reports a violation as 409
        let result: Result<Vec<Appointment>, DatabaseError> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            self.auth_token.as_deref(),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await;

        match result {
            Ok(rows) => rows.into_iter().next().ok_or_else(|| {
                SchedulingError::Database(DatabaseError::Decode("insert returned no rows".to_string()))
            }),
            Err(e) if e.is_conflict() => {
                info!(
                    "Insert rejected for practitioner {} at {}: slot already taken",
                    appointment.practitioner_id, appointment.starts_at
                );
                Err(SchedulingError::SlotUnavailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn cancel(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
        cancelled_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&practitioner_id=eq.{}&status=eq.confirmed",
            appointment_id, practitioner_id
        );

        let rows: Vec<Appointment> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            self.auth_token.as_deref(),
            Some(json!({
                "status": "cancelled",
                "cancelled_at": timestamp_param(cancelled_at),
            })),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Ok(rows.into_iter().next())
    }
}
