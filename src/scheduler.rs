use std::sync::Arc;

use chrono::{ DateTime, FixedOffset, TimeDelta, Utc };
use serde::Serialize;
use tokio::time::{ interval, Duration };
use uuid::Uuid;

use crate::db::entity::schedule;
use crate::enums::DeliveryMethod;
use crate::error::Result;
use crate::models::Schedule;
use crate::providers::{ OutreachStore, RunCompletion };
use crate::recurrence::{ next_trigger, start_of_local_day };
use crate::services::{ AudienceService, ChannelReport, ContentService, EmailService, WhatsAppService };

/// Which schedules a batch picks up and which channels it dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every due schedule, through every channel it selects.
    Unified,
    /// Legacy processor: WhatsApp-only schedules, WhatsApp channel only.
    WhatsAppOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub schedule_id: Uuid,
    pub schedule_name: String,
    pub success: bool,
    #[serde(rename = "emailsSent")]
    pub emails_sent: u32,
    #[serde(rename = "whatsappSent")]
    pub whatsapp_sent: u32,
    #[serde(rename = "whatsappSkipped")]
    pub whatsapp_skipped: u32,
    #[serde(rename = "leadsProcessed", skip_serializing_if = "Option::is_none")]
    pub leads_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScheduleResult {
    fn failed(schedule_id: Uuid, schedule_name: String, error: String) -> Self {
        Self {
            schedule_id,
            schedule_name,
            success: false,
            emails_sent: 0,
            whatsapp_sent: 0,
            whatsapp_skipped: 0,
            leads_processed: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub success: bool,
    pub processed: usize,
    pub successful: usize,
    pub total_emails_sent: u32,
    pub total_whatsapp_sent: u32,
    pub results: Vec<ScheduleResult>,
    pub current_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Batch orchestrator: selects due schedules and runs each one through
/// audience resolution, content resolution, dispatch and the schedule update.
pub struct Scheduler {
    store: Arc<dyn OutreachStore>,
    audience: AudienceService,
    content: ContentService,
    email: EmailService,
    whatsapp: WhatsAppService,
    timezone: FixedOffset,
    lease: TimeDelta,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn OutreachStore>,
        audience: AudienceService,
        content: ContentService,
        email: EmailService,
        whatsapp: WhatsAppService,
        timezone: FixedOffset,
        lease: Duration
    ) -> Self {
        Self {
            store,
            audience,
            content,
            email,
            whatsapp,
            timezone,
            lease: TimeDelta::from_std(lease).unwrap_or(TimeDelta::minutes(10)),
        }
    }

    /// Run the unified batch on a fixed period. Runs are sequential, so a slow
    /// batch delays the next tick instead of overlapping it.
    pub async fn start(self: Arc<Self>, every: Duration) {
        let mut interval = interval(every);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_batch(RunMode::Unified, Utc::now()).await {
                tracing::error!("Scheduled batch failed: {}", e);
            }
        }
    }

    /// Process every schedule due at `now`. Only due-selection failures are
    /// returned as errors; schedule failures are reported in the results.
    pub async fn run_batch(&self, mode: RunMode, now: DateTime<Utc>) -> Result<BatchSummary> {
        let day_start = start_of_local_day(now, self.timezone);

        let mut due = self.store.due_never_sent(now).await?;
        due.extend(self.store.due_sent_before(now, day_start).await?);

        if mode == RunMode::WhatsAppOnly {
            // Unparseable methods stay in so they are reported as failures
            due.retain(|row| {
                row.method
                    .parse::<DeliveryMethod>()
                    .map_or(true, |m| m == DeliveryMethod::Whatsapp)
            });
        }

        let run_id = Uuid::new_v4();
        tracing::info!("Run {} ({:?}) found {} due schedules", run_id, mode, due.len());

        let mut results = Vec::with_capacity(due.len());
        for row in due {
            results.push(self.process_schedule(row, mode, run_id, now).await);
        }

        let summary = BatchSummary {
            success: true,
            processed: results.len(),
            successful: results
                .iter()
                .filter(|r| r.success)
                .count(),
            total_emails_sent: results
                .iter()
                .map(|r| r.emails_sent)
                .sum(),
            total_whatsapp_sent: results
                .iter()
                .map(|r| r.whatsapp_sent)
                .sum(),
            message: results.is_empty().then(|| "No schedules due".to_string()),
            results,
            current_time: now,
        };

        tracing::info!(
            "Run {} finished: {} processed, {} successful, {} emails, {} WhatsApp messages",
            run_id,
            summary.processed,
            summary.successful,
            summary.total_emails_sent,
            summary.total_whatsapp_sent
        );

        Ok(summary)
    }

    async fn process_schedule(
        &self,
        row: schedule::Model,
        mode: RunMode,
        run_id: Uuid,
        now: DateTime<Utc>
    ) -> ScheduleResult {
        let schedule_id = row.id;
        let schedule_name = row.name.clone();

        match self.store.claim_schedule(schedule_id, run_id, now, now + self.lease).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Schedule {} is claimed by another run, skipping", schedule_id);
                return ScheduleResult::failed(
                    schedule_id,
                    schedule_name,
                    "schedule claimed by another run".to_string()
                );
            }
            Err(e) => {
                tracing::error!("Failed to claim schedule {}: {}", schedule_id, e);
                return ScheduleResult::failed(schedule_id, schedule_name, e.to_string());
            }
        }

        match self.run_schedule(row, mode, run_id, now).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Schedule {} ({}) failed: {}", schedule_id, schedule_name, e);

                if let Err(release_err) = self.store.release_schedule(schedule_id, run_id).await {
                    tracing::warn!("Failed to release schedule {}: {}", schedule_id, release_err);
                }

                ScheduleResult::failed(schedule_id, schedule_name, e.to_string())
            }
        }
    }

    async fn run_schedule(
        &self,
        row: schedule::Model,
        mode: RunMode,
        run_id: Uuid,
        now: DateTime<Utc>
    ) -> Result<ScheduleResult> {
        let schedule = Schedule::try_from(row)?;
        let leads = self.audience.resolve(&schedule).await?;
        let content = self.content.resolve(&leads).await?;

        if content.used_fallback {
            tracing::info!(
                "Schedule {} ({}): {} leads, {} sampled properties, region {}",
                schedule.id,
                schedule.name,
                leads.len(),
                content.property_ids.len(),
                content.region
            );
        } else {
            tracing::info!(
                "Schedule {} ({}): {} leads, {} properties from pages [{}], region {}",
                schedule.id,
                schedule.name,
                leads.len(),
                content.property_ids.len(),
                content.resolved_pages.join(", "),
                content.region
            );
        }

        let emails = if mode == RunMode::Unified && schedule.method.includes_email() {
            self.email.dispatch(&leads, &content, &schedule.templates).await
        } else {
            ChannelReport::default()
        };

        let whatsapp = if schedule.method.includes_whatsapp() {
            self.whatsapp.dispatch(schedule.id, &leads, &content, &schedule.templates).await
        } else {
            ChannelReport::default()
        };

        let delivered = emails.sent + whatsapp.sent;
        if delivered == 0 {
            tracing::warn!(
                "Schedule {} delivered nothing ({} email failures, {} WhatsApp failures)",
                schedule.id,
                emails.failed,
                whatsapp.failed
            );
        }

        // Advances even when nothing was delivered
        let next_send = next_trigger(&schedule.recurrence, now);
        self.store.complete_run(RunCompletion {
            schedule_id: schedule.id,
            run_id,
            last_sent: now,
            next_send,
            active: if schedule.recurrence.kind.is_recurring() {
                None
            } else {
                Some(false)
            },
            messages_sent: delivered as i64,
        }).await?;

        Ok(ScheduleResult {
            schedule_id: schedule.id,
            schedule_name: schedule.name,
            success: delivered > 0,
            emails_sent: emails.sent,
            whatsapp_sent: whatsapp.sent,
            whatsapp_skipped: whatsapp.skipped,
            leads_processed: Some(leads.len()),
            error: None,
        })
    }
}
