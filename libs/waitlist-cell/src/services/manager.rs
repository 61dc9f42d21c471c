// libs/waitlist-cell/src/services/manager.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{Appointment, Cancellation, ConsultationType, SchedulingError, SchedulingServices, SlotGenerator};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

use crate::error::WaitlistError;
use crate::models::{
    CreateWaitlistEntryRequest, NewWaitlistEntry, WaitlistEntry, WaitlistPromotion, WaitlistStatus,
};
use crate::services::notifier::{LoggingNotifier, WaitlistNotifier};
use crate::services::store::WaitlistStore;
use crate::services::supabase::SupabaseWaitlistStore;

pub struct WaitlistManager {
    store: Arc<dyn WaitlistStore>,
    slots: Arc<SlotGenerator>,
    notifier: Arc<dyn WaitlistNotifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    promotion_limit: usize,
}

impl WaitlistManager {
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        slots: Arc<SlotGenerator>,
        notifier: Arc<dyn WaitlistNotifier>,
        clock: Arc<dyn Clock>,
        ttl_days: i64,
        promotion_limit: usize,
    ) -> Self {
        Self {
            store,
            slots,
            notifier,
            clock,
            ttl: Duration::days(ttl_days.max(1)),
            promotion_limit,
        }
    }

    /// Supabase-backed manager; `auth_token` is used for both the waitlist
    /// table and the availability reads behind promotion.
    pub fn from_config(config: &AppConfig, auth_token: Option<&str>) -> Self {
        let scheduling = SchedulingServices::from_config(config, auth_token);
        let supabase = Arc::new(SupabaseClient::new(config));

        Self::new(
            Arc::new(SupabaseWaitlistStore::new(supabase, auth_token.map(str::to_string))),
            scheduling.slots,
            Arc::new(LoggingNotifier),
            Arc::new(SystemClock),
            config.waitlist_ttl_days,
            config.waitlist_promotion_limit,
        )
    }

    pub async fn create(
        &self,
        practitioner_id: Uuid,
        request: CreateWaitlistEntryRequest,
    ) -> Result<WaitlistEntry, WaitlistError> {
        let requested_until = request.requested_until.unwrap_or(request.requested_from);
        if requested_until < request.requested_from {
            return Err(WaitlistError::ValidationError(
                "requested_until must not be before requested_from".to_string(),
            ));
        }
        if requested_until < self.clock.today() {
            return Err(WaitlistError::ValidationError(
                "Requested window is entirely in the past".to_string(),
            ));
        }

        let practitioner = self
            .slots
            .find_practitioner(practitioner_id)
            .await?
            .ok_or(SchedulingError::PractitionerNotFound)?;
        let consultation_type = self
            .slots
            .resolve_consultation_type(&practitioner, request.consultation_type_id)
            .await?;

        let now = self.clock.now();
        let entry = self
            .store
            .insert(NewWaitlistEntry {
                practitioner_id,
                patient_id: request.patient_id,
                consultation_type_id: consultation_type.id,
                requested_from: request.requested_from,
                requested_until,
                created_at: now,
                expires_at: now + self.ttl,
                notes: request.notes,
            })
            .await?;

        info!(
            "Waitlist entry {} created for practitioner {} (expires {})",
            entry.id, practitioner_id, entry.expires_at
        );
        Ok(entry)
    }

    /// Remove an entry from the waitlist. Entries already in a terminal state
    /// are returned unchanged.
    pub async fn delete(&self, entry_id: Uuid, practitioner_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        self.finish(entry_id, practitioner_id, WaitlistStatus::Deleted).await
    }

    /// Mark an entry fulfilled once its patient has been booked.
    pub async fn fulfill(&self, entry_id: Uuid, practitioner_id: Uuid) -> Result<WaitlistEntry, WaitlistError> {
        self.finish(entry_id, practitioner_id, WaitlistStatus::Fulfilled).await
    }

    async fn finish(
        &self,
        entry_id: Uuid,
        practitioner_id: Uuid,
        to: WaitlistStatus,
    ) -> Result<WaitlistEntry, WaitlistError> {
        if let Some(entry) = self.store.transition_if_active(entry_id, practitioner_id, to).await? {
            info!("Waitlist entry {} is now {}", entry_id, to);
            return Ok(entry);
        }

        // Missing and foreign entries look the same to the caller
        let entry = self
            .store
            .find(entry_id, practitioner_id)
            .await?
            .ok_or(WaitlistError::EntryNotFound)?;

        debug!("Waitlist entry {} already {}, leaving it as is", entry_id, entry.status);
        Ok(entry)
    }

    /// Expire every active entry past its `expires_at`. Returns how many this
    /// call expired; a concurrent sweep never causes double counting.
    pub async fn expire_stale(&self) -> Result<u64, WaitlistError> {
        let now = self.clock.now();
        let expired = self.store.expire_active_before(now).await?;

        if expired > 0 {
            info!("Waitlist sweep at {} expired {} entries", now, expired);
        } else {
            debug!("Waitlist sweep at {} found nothing to expire", now);
        }
        Ok(expired)
    }

    pub async fn count_active(&self, practitioner_id: Uuid) -> Result<u64, WaitlistError> {
        self.store.count_active(practitioner_id, self.clock.now()).await
    }

    pub async fn list(&self, practitioner_id: Uuid) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        self.store.list_active(practitioner_id, self.clock.now()).await
    }

    /// Promote for a cancel request. A repeated request for an appointment that
    /// was already cancelled is not a new event and notifies nobody.
    pub async fn promote_after(
        &self,
        cancellation: &Cancellation,
    ) -> Result<Vec<WaitlistPromotion>, WaitlistError> {
        match cancellation {
            Cancellation::Cancelled(appointment) => self.promote_on_cancellation(appointment).await,
            Cancellation::AlreadyCancelled(appointment) => {
                debug!(
                    "Appointment {} was already cancelled, waitlist was offered its time then",
                    appointment.id
                );
                Ok(Vec::new())
            }
        }
    }

    /// Offer the time freed by `appointment` to the oldest matching entries.
    /// Entries stay active; they are fulfilled when the patient actually books.
    pub async fn promote_on_cancellation(
        &self,
        appointment: &Appointment,
    ) -> Result<Vec<WaitlistPromotion>, WaitlistError> {
        if appointment.is_confirmed() {
            return Err(WaitlistError::ValidationError(format!(
                "Appointment {} is still confirmed",
                appointment.id
            )));
        }

        let date = appointment.starts_at.date_naive();
        if date < self.clock.today() || self.promotion_limit == 0 {
            return Ok(Vec::new());
        }

        let practitioner = self
            .slots
            .find_practitioner(appointment.practitioner_id)
            .await?
            .ok_or(SchedulingError::PractitionerNotFound)?;

        let candidates = self
            .store
            .list_active_covering(appointment.practitioner_id, date, self.clock.now())
            .await?;
        debug!(
            "{} waitlist candidates for practitioner {} on {}",
            candidates.len(), appointment.practitioner_id, date
        );

        let mut types: HashMap<Uuid, Option<ConsultationType>> = HashMap::new();
        let mut promotions = Vec::new();

        for entry in candidates {
            if promotions.len() >= self.promotion_limit {
                break;
            }

            if !types.contains_key(&entry.consultation_type_id) {
                let resolved = match self
                    .slots
                    .resolve_consultation_type(&practitioner, entry.consultation_type_id)
                    .await
                {
                    Ok(consultation_type) => Some(consultation_type),
                    Err(SchedulingError::ConsultationTypeNotFound | SchedulingError::Validation(_)) => None,
                    Err(e) => return Err(e.into()),
                };
                types.insert(entry.consultation_type_id, resolved);
            }
            let Some(consultation_type) = types.get(&entry.consultation_type_id).and_then(Option::as_ref) else {
                debug!("Skipping waitlist entry {}: consultation type no longer bookable", entry.id);
                continue;
            };

            let slots = self
                .slots
                .compute_slots_for(&practitioner, consultation_type, date)
                .await?;
            if slots.is_empty() {
                continue;
            }

            let promotion = WaitlistPromotion { entry, date, slots };
            if let Err(e) = self.notifier.notify_slot_opened(&promotion).await {
                warn!("Failed to notify waitlist entry {}: {}", promotion.entry.id, e);
            }
            promotions.push(promotion);
        }

        info!(
            "Cancellation of appointment {} offered to {} waitlist entries",
            appointment.id,
            promotions.len()
        );
        Ok(promotions)
    }
}
