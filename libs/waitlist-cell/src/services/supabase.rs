use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::error::WaitlistError;
use crate::models::{NewWaitlistEntry, WaitlistEntry, WaitlistStatus};
use crate::services::store::WaitlistStore;

const TABLE: &str = "/rest/v1/waitlist_entries";

fn timestamp_param(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct SupabaseWaitlistStore {
    supabase: Arc<SupabaseClient>,
    auth_token: Option<String>,
}

impl SupabaseWaitlistStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: Option<String>) -> Self {
        Self { supabase, auth_token }
    }

    async fn select(&self, query: &str) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let path = format!("{}?{}", TABLE, query);
        let rows: Vec<WaitlistEntry> = self.supabase.request(
            Method::GET,
            &path,
            self.auth_token.as_deref(),
            None,
        ).await?;
        Ok(rows)
    }
}

#[async_trait]
impl WaitlistStore for SupabaseWaitlistStore {
    async fn insert(&self, entry: NewWaitlistEntry) -> Result<WaitlistEntry, WaitlistError> {
        let body = json!({
            "practitioner_id": entry.practitioner_id,
            "patient_id": entry.patient_id,
            "consultation_type_id": entry.consultation_type_id,
            "requested_from": entry.requested_from,
            "requested_until": entry.requested_until,
            "created_at": timestamp_param(entry.created_at),
            "expires_at": timestamp_param(entry.expires_at),
            "status": WaitlistStatus::Active,
            "notes": entry.notes,
        });

        let rows: Vec<WaitlistEntry> = self.supabase.request_with_headers(
            Method::POST,
            TABLE,
            self.auth_token.as_deref(),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        rows.into_iter().next().ok_or_else(|| {
            WaitlistError::DatabaseError(DatabaseError::Decode("insert returned no rows".to_string()))
        })
    }

    async fn find(&self, entry_id: Uuid, practitioner_id: Uuid) -> Result<Option<WaitlistEntry>, WaitlistError> {
        let query = format!("id=eq.{}&practitioner_id=eq.{}&limit=1", entry_id, practitioner_id);
        Ok(self.select(&query).await?.into_iter().next())
    }

    async fn list_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let query = format!(
            "practitioner_id=eq.{}&status=eq.active&expires_at=gt.{}&order=created_at.asc",
            practitioner_id,
            timestamp_param(now)
        );
        self.select(&query).await
    }

    async fn list_active_covering(
        &self,
        practitioner_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<WaitlistEntry>, WaitlistError> {
        let query = format!(
            "practitioner_id=eq.{}&status=eq.active&expires_at=gt.{}&requested_from=lte.{}&requested_until=gte.{}&order=created_at.asc",
            practitioner_id,
            timestamp_param(now),
            date,
            date
        );
        self.select(&query).await
    }

    async fn transition_if_active(
        &self,
        entry_id: Uuid,
        practitioner_id: Uuid,
        to: WaitlistStatus,
    ) -> Result<Option<WaitlistEntry>, WaitlistError> {
        let path = format!(
            "{}?id=eq.{}&practitioner_id=eq.{}&status=eq.active",
            TABLE, entry_id, practitioner_id
        );

        let rows: Vec<WaitlistEntry> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            self.auth_token.as_deref(),
            Some(json!({ "status": to })),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Ok(rows.into_iter().next())
    }

    async fn expire_active_before(&self, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        // One conditional UPDATE; rows already moved by a concurrent sweep no
        // longer match the filter and are not returned
        let path = format!(
            "{}?status=eq.active&expires_at=lte.{}&select=id",
            TABLE,
            timestamp_param(now)
        );

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            self.auth_token.as_deref(),
            Some(json!({ "status": WaitlistStatus::Expired })),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        info!("Expired {} stale waitlist entries", rows.len());
        Ok(rows.len() as u64)
    }

    async fn count_active(&self, practitioner_id: Uuid, now: DateTime<Utc>) -> Result<u64, WaitlistError> {
        let path = format!(
            "{}?practitioner_id=eq.{}&status=eq.active&expires_at=gt.{}",
            TABLE,
            practitioner_id,
            timestamp_param(now)
        );

        let count = self.supabase.count(&path, self.auth_token.as_deref()).await?;
        debug!("Practitioner {} has {} active waitlist entries", practitioner_id, count);
        Ok(count)
    }
}
