use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::WaitlistError;
use crate::models::{NewWaitlistEntry, WaitlistEntry, WaitlistStatus};

/// Persistence for waitlist entries.
///
/// Every status change is conditional on the row still being `active` at write
/// time, so concurrent sweeps, deletes and fulfilments never move an entry out
/// of a terminal state or count it twice.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn insert(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, WaitlistError>;

    /// `None` when the entry is missing or belongs to another practitioner.
    async fn find(&self, entry_id: Uuid, practitioner_id: Uuid) -> Result<Option<WaitlistEntry>, WaitlistError>;

    /// Live entries, oldest first.
    async fn list_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<WaitlistEntry>, WaitlistError>;

    /// Live entries whose requested window contains `date`, oldest first.
    async fn list_active_covering(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<WaitlistEntry>, WaitlistError>;

    /// Move an active entry to `to`. `None` when no active entry matched.
    async fn transition_if_active(
        &self,
        entry_id: Uuid,
        practitioner_id: Uuid,
        to: WaitlistStatus,
    ) -> Result<Option<WaitlistEntry>, WaitlistError>;

    /// Expire every active entry with `expires_at <= now`; returns how many
    /// rows this call changed.
    async fn expire_active_before(&self, now: DateTime<Utc>) -> Result<u64, WaitlistError>;

    async fn count_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<u64, WaitlistError>;
}
