use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_utils::clock::Clock;

use crate::error::SchedulingError;
use crate::models::{Appointment, BookSlotRequest, Cancellation, NewAppointment, Practitioner};
use crate::services::slots::SlotGenerator;
use crate::services::store::{AppointmentLedger, AvailabilityStore};

pub struct BookingService {
    store: Arc<dyn AvailabilityStore>,
    ledger: Arc<dyn AppointmentLedger>,
    slots: Arc<SlotGenerator>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        ledger: Arc<dyn AppointmentLedger>,
        slots: Arc<SlotGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            slots,
            clock,
        }
    }

    /// Book `request.starts_at` for the patient. The start must still be one of
    /// the generated slots; a concurrent booking that wins the insert race makes
    /// this fail with `SlotUnavailable`.
    pub async fn book_slot(
        &self,
        practitioner: &Practitioner,
        patient_id: Uuid,
        request: BookSlotRequest,
    ) -> Result<Appointment, SchedulingError> {
        if !practitioner.booking_enabled {
            warn!("Booking attempt for practitioner {} with booking disabled", practitioner.id);
            return Err(SchedulingError::BookingDisabled);
        }

        let consultation_type = self
            .slots
            .resolve_consultation_type(practitioner, request.consultation_type_id)
            .await?;

        let date = request.starts_at.date_naive();
        let slots = self
            .slots
            .compute_slots_for(practitioner, &consultation_type, date)
            .await?;

        if !slots.contains(&request.starts_at) {
            info!(
                "Requested start {} is not an open slot for practitioner {}",
                request.starts_at, practitioner.id
            );
            return Err(SchedulingError::SlotUnavailable);
        }

        let appointment = self
            .ledger
            .insert_confirmed(NewAppointment {
                practitioner_id: practitioner.id,
                patient_id,
                consultation_type_id: consultation_type.id,
                starts_at: request.starts_at,
                ends_at: request.starts_at + consultation_type.duration(),
                buffer_before_minutes: consultation_type.buffer_before_minutes,
                buffer_after_minutes: consultation_type.buffer_after_minutes,
            })
            .await?;

        info!(
            "Booked appointment {} for practitioner {} at {}",
            appointment.id, practitioner.id, appointment.starts_at
        );
        Ok(appointment)
    }

    /// Cancel a confirmed appointment. Repeating the request for an already
    /// cancelled appointment reports `AlreadyCancelled` and changes nothing.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        practitioner_id: Uuid,
    ) -> Result<Cancellation, SchedulingError> {
        if let Some(cancelled) = self
            .ledger
            .cancel(appointment_id, practitioner_id, self.clock.now())
            .await?
        {
            info!("Cancelled appointment {} for practitioner {}", appointment_id, practitioner_id);
            return Ok(Cancellation::Cancelled(cancelled));
        }

        let existing = self
            .ledger
            .find_appointment(appointment_id, practitioner_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        debug!("Appointment {} already {}", appointment_id, existing.status);
        Ok(Cancellation::AlreadyCancelled(existing))
    }

    /// Public lookup used by the booking routes. Unknown slugs and practitioners
    /// with booking disabled are reported separately.
    pub async fn bookable_practitioner(&self, slug: &str) -> Result<Practitioner, SchedulingError> {
        let practitioner = self
            .store
            .find_practitioner_by_slug(slug)
            .await?
            .ok_or(SchedulingError::PractitionerNotFound)?;

        if !practitioner.booking_enabled {
            return Err(SchedulingError::BookingDisabled);
        }
        Ok(practitioner)
    }
}
