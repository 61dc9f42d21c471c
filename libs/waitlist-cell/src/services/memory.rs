//! In-process waitlist store for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::WaitlistError;
use crate::models::{NewWaitlistEntry, WaitlistEntry, WaitlistStatus};
use crate::services::store::WaitlistStore;

#[derive(Default)]
pub struct InMemoryWaitlistStore {
    entries: Mutex<Vec<WaitlistEntry>>,
}

impl InMemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<WaitlistEntry> {
        self.entries.lock().await.clone()
    }
}

fn oldest_first(mut entries: Vec<WaitlistEntry>) -> Vec<WaitlistEntry> {
    entries.sort_by_key(|e| e.created_at);
    entries
}

#[async_trait]
impl WaitlistStore for InMemoryWaitlistStore {
    async fn insert(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, WaitlistError> {
        let created = WaitlistEntry {
            id: Uuid::new_v4(),
            practitioner_id: entry.practitioner_id,
            patient_id: entry.patient_id,
            consultation_type_id: entry.consultation_type_id,
            requested_from: entry.requested_from,
            requested_until: entry.requested_until,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            status: WaitlistStatus::Active,
            notes: entry.notes,
        };
        self.entries.lock().await.push(created.clone());
        Ok(created)
    }

    async fn find(&self, entry_id: Uuid, practitioner_id: Uuid) -> Result<Option<WaitlistEntry>, WaitlistError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .find(|e| e.id == entry_id && e.practitioner_id == practitioner_id)
            .cloned())
    }

    async fn list_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let entries = self.entries.lock().await;
        Ok(oldest_first(
            entries
                .iter()
                .filter(|e| e.practitioner_id == practitioner_id && e.is_live_at(now))
                .cloned()
                .collect(),
        ))
    }

    async fn list_active_covering(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let entries = self.entries.lock().await;
        Ok(oldest_first(
            entries
                .iter()
                .filter(|e| e.practitioner_id == practitioner_id && e.is_live_at(now) && e.covers(date))
                .cloned()
                .collect(),
        ))
    }

    async fn transition_if_active(
        &self,
        entry_id: Uuid,
        practitioner_id: Uuid,
        to: WaitlistStatus,
    ) -> Result<Option<WaitlistEntry>, WaitlistError> {
        let mut entries = self.entries.lock().await;

        Ok(entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.practitioner_id == practitioner_id && e.status == WaitlistStatus::Active)
            .map(|e| {
                e.status = to;
                e.clone()
            }))
    }

    async fn expire_active_before(&self, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        let mut entries = self.entries.lock().await;
        let mut expired = 0;

        for entry in entries
            .iter_mut()
            .filter(|e| e.status == WaitlistStatus::Active && e.expires_at <= now)
        {
            entry.status = WaitlistStatus::Expired;
            expired += 1;
        }
        Ok(expired)
    }

    async fn count_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.practitioner_id == practitioner_id && e.is_live_at(now))
            .count() as u64)
    }
}
