use thiserror::Error;

use availability_cell::SchedulingError;
use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum WaitlistError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Waitlist entry not found")]
    EntryNotFound,

    #[error("Notification failed: {0}")]
    NotificationError(String),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl From<WaitlistError> for AppError {
    fn from(error: WaitlistError) -> Self {
        match error {
            WaitlistError::ValidationError(msg) => AppError::ValidationError(msg),
            WaitlistError::EntryNotFound => AppError::NotFound(error.to_string()),
            WaitlistError::NotificationError(msg) => AppError::Internal(msg),
            WaitlistError::Scheduling(e) => e.into(),
            WaitlistError::DatabaseError(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_error_mapping() {
        assert_matches!(AppError::from(WaitlistError::EntryNotFound), AppError::NotFound(_));
        assert_matches!(
            AppError::from(WaitlistError::ValidationError("bad window".to_string())),
            AppError::ValidationError(_)
        );
        assert_matches!(
            AppError::from(WaitlistError::Scheduling(SchedulingError::ConsultationTypeNotFound)),
            AppError::NotFound(_)
        );
        assert_matches!(
            AppError::from(WaitlistError::DatabaseError(DatabaseError::Decode("x".to_string()))),
            AppError::Database(_)
        );
    }
}
