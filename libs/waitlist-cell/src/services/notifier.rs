use async_trait::async_trait;
use tracing::info;

use crate::error::WaitlistError;
use crate::models::WaitlistPromotion;

/// Outbound channel telling a waitlisted patient that time has opened up.
#[async_trait]
pub trait WaitlistNotifier: Send + Sync {
    async fn notify_slot_opened(&self, promotion: &WaitlistPromotion) -> Result<(), WaitlistError>;
}

/// Records promotions in the log. Used until a delivery channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl WaitlistNotifier for LoggingNotifier {
    async fn notify_slot_opened(&self, promotion: &WaitlistPromotion) -> Result<(), WaitlistError> {
        info!(
            "Waitlist entry {} (patient {}) can book {} slot(s) on {}",
            promotion.entry.id,
            promotion.entry.patient_id,
            promotion.slots.len(),
            promotion.date
        );
        Ok(())
    }
}
