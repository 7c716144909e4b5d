//! In-memory collaborators for unit tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::entity::{ property, schedule, static_page };
use crate::enums::{ DeliveryMethod, Region, ScheduleStatus };
use crate::error::{ AppError, Result };
use crate::models::{ Lead, StaticPage };
use crate::providers::{
    CatalogEmail,
    EmailSender,
    NewSendRecord,
    OutreachStore,
    RunCompletion,
    WhatsAppPayload,
    WhatsAppRelay,
};

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn schedule_row(name: &str, method: DeliveryMethod, next_send: &str) -> schedule::Model {
    let created = at("2023-12-01T00:00:00Z");
    schedule::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        method: method.as_str().to_string(),
        status: ScheduleStatus::Active.as_str().to_string(),
        group_id: None,
        recurrence_type: "daily".to_string(),
        recurrence_interval: 1,
        send_time: "09:00".to_string(),
        weekdays: None,
        day_of_month: None,
        timezone: "UTC".to_string(),
        last_sent: None,
        next_send: Some(at(next_send)),
        email_subject: Some("Oportunidades da semana".to_string()),
        email_message: Some("Confira os imóveis selecionados.".to_string()),
        whatsapp_message: Some("Olá! Novos imóveis em leilão.".to_string()),
        image_url: None,
        total_sent: 0,
        run_count: 0,
        locked_by: None,
        locked_until: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn lead(name: &str, email: Option<&str>, phone: Option<&str>, filter: Option<&str>) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
        filter_config: filter.map(str::to_string),
    }
}

pub fn page(page_id: &str, property_ids: &[i64], region: Region) -> static_page::Model {
    static_page::Model {
        id: Uuid::new_v4(),
        page_id: page_id.to_string(),
        property_ids: json!(property_ids),
        page_type: region.as_str().to_string(),
        title: format!("Catálogo {}", page_id),
    }
}

#[derive(Default)]
struct StoreState {
    schedules: Vec<schedule::Model>,
    leads: Vec<(Option<Uuid>, Lead)>,
    links: Vec<(Uuid, Uuid)>,
    pages: Vec<static_page::Model>,
    properties: Vec<property::Model>,
    sends: Vec<NewSendRecord>,
    completions: Vec<RunCompletion>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    pub fail_due_selection: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose due-selection queries always fail.
    pub fn failing() -> Self {
        Self {
            fail_due_selection: true,
            ..Self::default()
        }
    }

    pub async fn add_schedule(&self, row: schedule::Model) {
        self.state.lock().await.schedules.push(row);
    }

    pub async fn add_group_lead(&self, group_id: Uuid, lead: Lead) {
        self.state.lock().await.leads.push((Some(group_id), lead));
    }

    pub async fn add_explicit_lead(&self, schedule_id: Uuid, lead: Lead) {
        let mut state = self.state.lock().await;
        state.links.push((schedule_id, lead.id));
        state.leads.push((None, lead));
    }

    pub async fn add_page(&self, row: static_page::Model) {
        self.state.lock().await.pages.push(row);
    }

    pub async fn add_property(&self, id: i64, active: bool) {
        self.state.lock().await.properties.push(property::Model {
            id,
            title: format!("Imóvel {}", id),
            is_active: active,
            created_at: at("2024-01-01T00:00:00Z") + chrono::TimeDelta::minutes(id),
        });
    }

    pub async fn add_send(&self, phone: &str, url: &str) {
        self.state.lock().await.sends.push(NewSendRecord {
            phone: phone.to_string(),
            url: url.to_string(),
            schedule_id: None,
            webhook_response: None,
            sent_at: at("2024-01-01T00:00:00Z"),
        });
    }

    pub async fn schedule(&self, id: Uuid) -> schedule::Model {
        let state = self.state.lock().await;
        state.schedules
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap()
    }

    pub async fn sends(&self) -> Vec<NewSendRecord> {
        self.state.lock().await.sends.clone()
    }

    pub async fn completions(&self) -> Vec<RunCompletion> {
        self.state.lock().await.completions.clone()
    }

    pub async fn lock_schedule(&self, id: Uuid, until: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(row) = state.schedules.iter_mut().find(|s| s.id == id) {
            row.locked_by = Some(Uuid::new_v4());
            row.locked_until = Some(until);
        }
    }

    fn due(row: &schedule::Model, now: DateTime<Utc>) -> bool {
        row.status == ScheduleStatus::Active.as_str() && row.next_send.map_or(false, |n| n <= now)
    }
}

#[async_trait]
impl OutreachStore for MemoryStore {
    async fn due_never_sent(&self, now: DateTime<Utc>) -> Result<Vec<schedule::Model>> {
        if self.fail_due_selection {
            return Err(AppError::Internal("connection refused".to_string()));
        }
        let state = self.state.lock().await;
        Ok(
            state.schedules
                .iter()
                .filter(|s| Self::due(s, now) && s.last_sent.is_none())
                .cloned()
                .collect()
        )
    }

    async fn due_sent_before(
        &self,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>
    ) -> Result<Vec<schedule::Model>> {
        let state = self.state.lock().await;
        Ok(
            state.schedules
                .iter()
                .filter(|s| Self::due(s, now) && s.last_sent.map_or(false, |l| l < day_start))
                .cloned()
                .collect()
        )
    }

    async fn claim_schedule(
        &self,
        schedule_id: Uuid,
        run_id: Uuid,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(row) = state.schedules.iter_mut().find(|s| s.id == schedule_id) else {
            return Ok(false);
        };
        let free = row.locked_until.map_or(true, |until| until < now);
        if !free || !Self::due(row, now) {
            return Ok(false);
        }
        row.locked_by = Some(run_id);
        row.locked_until = Some(lease_until);
        Ok(true)
    }

    async fn release_schedule(&self, schedule_id: Uuid, run_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(row) = state.schedules.iter_mut().find(|s| s.id == schedule_id) {
            if row.locked_by == Some(run_id) {
                row.locked_by = None;
                row.locked_until = None;
            }
        }
        Ok(())
    }

    async fn complete_run(&self, completion: RunCompletion) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(row) = state.schedules.iter_mut().find(|s| s.id == completion.schedule_id) {
            if row.locked_by == Some(completion.run_id) {
                row.last_sent = Some(completion.last_sent);
                row.next_send = completion.next_send;
                row.total_sent += completion.messages_sent;
                row.run_count += 1;
                row.locked_by = None;
                row.locked_until = None;
                if completion.active == Some(false) {
                    row.status = ScheduleStatus::Inactive.as_str().to_string();
                }
            }
        }
        state.completions.push(completion);
        Ok(())
    }

    async fn explicit_leads(&self, schedule_id: Uuid) -> Result<Vec<Lead>> {
        let state = self.state.lock().await;
        let ids: Vec<Uuid> = state.links
            .iter()
            .filter(|(s, _)| *s == schedule_id)
            .map(|(_, l)| *l)
            .collect();
        Ok(
            state.leads
                .iter()
                .filter(|(_, l)| ids.contains(&l.id))
                .map(|(_, l)| l.clone())
                .collect()
        )
    }

    async fn group_leads(&self, group_id: Uuid) -> Result<Vec<Lead>> {
        let state = self.state.lock().await;
        Ok(
            state.leads
                .iter()
                .filter(|(g, _)| *g == Some(group_id))
                .map(|(_, l)| l.clone())
                .collect()
        )
    }

    async fn static_page(&self, page_id: &str) -> Result<Option<StaticPage>> {
        let state = self.state.lock().await;
        state.pages
            .iter()
            .find(|p| p.page_id == page_id)
            .cloned()
            .map(StaticPage::try_from)
            .transpose()
    }

    async fn active_property_sample(&self, limit: u64) -> Result<Vec<i64>> {
        let state = self.state.lock().await;
        let mut active: Vec<&property::Model> = state.properties
            .iter()
            .filter(|p| p.is_active)
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(
            active
                .into_iter()
                .take(limit as usize)
                .map(|p| p.id)
                .collect()
        )
    }

    async fn whatsapp_already_sent(&self, phone: &str, url: &str) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.sends.iter().any(|s| s.phone == phone && s.url == url))
    }

    async fn record_whatsapp_send(&self, record: NewSendRecord) -> Result<()> {
        self.state.lock().await.sends.push(record);
        Ok(())
    }
}

/// Records every email; fails for the listed recipients.
#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<CatalogEmail>>,
    pub fail_for: HashSet<String>,
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_catalog(&self, email: &CatalogEmail) -> Result<()> {
        if self.fail_for.contains(&email.recipient_email) {
            return Err(AppError::Email("mailbox unavailable".to_string()));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}

/// Records every delivery; fails for the listed (formatted) phone numbers.
#[derive(Default)]
pub struct RecordingRelay {
    pub delivered: Mutex<Vec<(Region, WhatsAppPayload)>>,
    pub fail_for: HashSet<String>,
}

#[async_trait]
impl WhatsAppRelay for RecordingRelay {
    async fn deliver(&self, region: Region, payload: &WhatsAppPayload) -> Result<String> {
        if self.fail_for.contains(&payload.num) {
            return Err(AppError::WhatsApp("Webhook returned 502 Bad Gateway: upstream".to_string()));
        }
        self.delivered.lock().await.push((region, payload.clone()));
        Ok("{\"status\":\"queued\"}".to_string())
    }
}
