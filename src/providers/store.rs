use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use uuid::Uuid;

use crate::error::Result;
use crate::db::entity::schedule;
use crate::models::{ Lead, StaticPage };

/// Post-dispatch update for a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RunCompletion {
    pub schedule_id: Uuid,
    pub run_id: Uuid,
    pub last_sent: DateTime<Utc>,
    pub next_send: Option<DateTime<Utc>>,
    /// `Some(false)` deactivates the schedule (spent `once` rules).
    pub active: Option<bool>,
    pub messages_sent: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSendRecord {
    pub phone: String,
    pub url: String,
    pub schedule_id: Option<Uuid>,
    pub webhook_response: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// Persisted state the scheduler reads and writes.
///
/// Due schedules come back as raw rows so a malformed one fails only its own
/// run; everything else is parsed into domain records.
#[async_trait]
pub trait OutreachStore: Send + Sync {
    /// Active schedules with `next_send <= now` that were never sent.
    async fn due_never_sent(&self, now: DateTime<Utc>) -> Result<Vec<schedule::Model>>;

    /// Active schedules with `next_send <= now` last sent before `day_start`.
    async fn due_sent_before(
        &self,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>
    ) -> Result<Vec<schedule::Model>>;

    /// Atomically take the run lease on a schedule that is still due.
    /// Returns `false` when another run holds it or it is no longer due.
    async fn claim_schedule(
        &self,
        schedule_id: Uuid,
        run_id: Uuid,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>
    ) -> Result<bool>;

    /// Drop the lease without touching send state.
    async fn release_schedule(&self, schedule_id: Uuid, run_id: Uuid) -> Result<()>;

    /// Persist `last_sent`/`next_send`, counters and activation, and clear the lease.
    async fn complete_run(&self, completion: RunCompletion) -> Result<()>;

    /// Leads explicitly attached to the schedule.
    async fn explicit_leads(&self, schedule_id: Uuid) -> Result<Vec<Lead>>;

    async fn group_leads(&self, group_id: Uuid) -> Result<Vec<Lead>>;

    async fn static_page(&self, page_id: &str) -> Result<Option<StaticPage>>;

    /// Up to `limit` ids of currently active properties, newest first.
    async fn active_property_sample(&self, limit: u64) -> Result<Vec<i64>>;

    async fn whatsapp_already_sent(&self, phone: &str, url: &str) -> Result<bool>;

    async fn record_whatsapp_send(&self, record: NewSendRecord) -> Result<()>;
}
