use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Practitioner not found")]
    PractitionerNotFound,

    #[error("Consultation type not found")]
    ConsultationTypeNotFound,

    #[error("Online booking is disabled for this practitioner")]
    BookingDisabled,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Slot is no longer available, please choose another time")]
    SlotUnavailable,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<SchedulingError> for AppError {
    fn from(error: SchedulingError) -> Self {
        match error {
            SchedulingError::Validation(msg) => AppError::ValidationError(msg),
            SchedulingError::PractitionerNotFound
            | SchedulingError::ConsultationTypeNotFound
            | SchedulingError::AppointmentNotFound => AppError::NotFound(error.to_string()),
            SchedulingError::BookingDisabled => AppError::Forbidden(error.to_string()),
            SchedulingError::SlotUnavailable => AppError::Conflict(error.to_string()),
            SchedulingError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
