use async_trait::async_trait;
use chrono::{ DateTime, Utc };
use sea_orm::{
    sea_query::{ Condition, Expr },
    ActiveModelTrait,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::enums::ScheduleStatus;
use crate::error::Result;
use crate::models::{ Lead, StaticPage };
use crate::providers::{ NewSendRecord, OutreachStore, RunCompletion };

pub mod entity;

use entity::{ lead, property, schedule, schedule_lead, static_page, whatsapp_send };

/// Postgres-backed store for schedules, leads, static pages and send history.
pub struct OutreachRepository {
    db: DatabaseConnection,
}

impl OutreachRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn due_query(now: DateTime<Utc>) -> sea_orm::Select<schedule::Entity> {
        schedule::Entity
            ::find()
            .filter(schedule::Column::Status.eq(ScheduleStatus::Active.as_str()))
            .filter(schedule::Column::NextSend.is_not_null())
            .filter(schedule::Column::NextSend.lte(now))
            .order_by_asc(schedule::Column::NextSend)
    }

    async fn leads_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Lead>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let leads = lead::Entity
            ::find()
            .filter(lead::Column::Id.is_in(ids))
            .order_by_asc(lead::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(leads.into_iter().map(Lead::from).collect())
    }
}

#[async_trait]
impl OutreachStore for OutreachRepository {
    async fn due_never_sent(&self, now: DateTime<Utc>) -> Result<Vec<schedule::Model>> {
        let schedules = Self::due_query(now)
            .filter(schedule::Column::LastSent.is_null())
            .all(&self.db).await?;

        Ok(schedules)
    }

    async fn due_sent_before(
        &self,
        now: DateTime<Utc>,
        day_start: DateTime<Utc>
    ) -> Result<Vec<schedule::Model>> {
        let schedules = Self::due_query(now)
            .filter(schedule::Column::LastSent.is_not_null())
            .filter(schedule::Column::LastSent.lt(day_start))
            .all(&self.db).await?;

        Ok(schedules)
    }

    async fn claim_schedule(
        &self,
        schedule_id: Uuid,
        run_id: Uuid,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>
    ) -> Result<bool> {
        let result = schedule::Entity
            ::update_many()
            .col_expr(schedule::Column::LockedBy, Expr::value(Some(run_id)))
            .col_expr(schedule::Column::LockedUntil, Expr::value(Some(lease_until)))
            .filter(schedule::Column::Id.eq(schedule_id))
            .filter(schedule::Column::Status.eq(ScheduleStatus::Active.as_str()))
            .filter(schedule::Column::NextSend.lte(now))
            .filter(
                Condition::any()
                    .add(schedule::Column::LockedUntil.is_null())
                    .add(schedule::Column::LockedUntil.lt(now))
            )
            .exec(&self.db).await?;

        Ok(result.rows_affected == 1)
    }

    async fn release_schedule(&self, schedule_id: Uuid, run_id: Uuid) -> Result<()> {
        schedule::Entity
            ::update_many()
            .col_expr(schedule::Column::LockedBy, Expr::value(Option::<Uuid>::None))
            .col_expr(
                schedule::Column::LockedUntil,
                Expr::value(Option::<DateTime<Utc>>::None)
            )
            .filter(schedule::Column::Id.eq(schedule_id))
            .filter(schedule::Column::LockedBy.eq(run_id))
            .exec(&self.db).await?;

        Ok(())
    }

    async fn complete_run(&self, completion: RunCompletion) -> Result<()> {
        let mut update = schedule::Entity
            ::update_many()
            .col_expr(schedule::Column::LastSent, Expr::value(Some(completion.last_sent)))
            .col_expr(schedule::Column::NextSend, Expr::value(completion.next_send))
            .col_expr(
                schedule::Column::TotalSent,
                Expr::col(schedule::Column::TotalSent).add(completion.messages_sent)
            )
            .col_expr(schedule::Column::RunCount, Expr::col(schedule::Column::RunCount).add(1))
            .col_expr(schedule::Column::LockedBy, Expr::value(Option::<Uuid>::None))
            .col_expr(
                schedule::Column::LockedUntil,
                Expr::value(Option::<DateTime<Utc>>::None)
            )
            .col_expr(schedule::Column::UpdatedAt, Expr::value(Utc::now()));

        if completion.active == Some(false) {
            update = update.col_expr(
                schedule::Column::Status,
                Expr::value(ScheduleStatus::Inactive.as_str())
            );
        }

        let result = update
            .filter(schedule::Column::Id.eq(completion.schedule_id))
            .filter(schedule::Column::LockedBy.eq(completion.run_id))
            .exec(&self.db).await?;

        if result.rows_affected == 0 {
            tracing::warn!(
                "Run {} lost the lease on schedule {} before completing",
                completion.run_id,
                completion.schedule_id
            );
        }

        Ok(())
    }

    async fn explicit_leads(&self, schedule_id: Uuid) -> Result<Vec<Lead>> {
        let lead_ids = schedule_lead::Entity
            ::find()
            .filter(schedule_lead::Column::ScheduleId.eq(schedule_id))
            .all(&self.db).await?
            .into_iter()
            .map(|link| link.lead_id)
            .collect();

        self.leads_by_ids(lead_ids).await
    }

    async fn group_leads(&self, group_id: Uuid) -> Result<Vec<Lead>> {
        let leads = lead::Entity
            ::find()
            .filter(lead::Column::GroupId.eq(group_id))
            .order_by_asc(lead::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(leads.into_iter().map(Lead::from).collect())
    }

    async fn static_page(&self, page_id: &str) -> Result<Option<StaticPage>> {
        let page = static_page::Entity
            ::find()
            .filter(static_page::Column::PageId.eq(page_id))
            .one(&self.db).await?;

        page.map(StaticPage::try_from).transpose()
    }

    async fn active_property_sample(&self, limit: u64) -> Result<Vec<i64>> {
        let properties = property::Entity
            ::find()
            .filter(property::Column::IsActive.eq(true))
            .order_by_desc(property::Column::CreatedAt)
            .limit(limit)
            .all(&self.db).await?;

        Ok(
            properties
                .into_iter()
                .map(|p| p.id)
                .collect()
        )
    }

    async fn whatsapp_already_sent(&self, phone: &str, url: &str) -> Result<bool> {
        let record = whatsapp_send::Entity
            ::find()
            .filter(whatsapp_send::Column::Phone.eq(phone))
            .filter(whatsapp_send::Column::Url.eq(url))
            .one(&self.db).await?;

        Ok(record.is_some())
    }

    async fn record_whatsapp_send(&self, record: NewSendRecord) -> Result<()> {
        let send = whatsapp_send::ActiveModel {
            id: Set(Uuid::new_v4()),
            phone: Set(record.phone),
            url: Set(record.url),
            schedule_id: Set(record.schedule_id),
            webhook_response: Set(record.webhook_response),
            sent_at: Set(record.sent_at),
        };

        send.insert(&self.db).await?;
        Ok(())
    }
}
