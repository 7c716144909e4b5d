use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub method: String, // "email", "whatsapp", "both"
    pub status: String, // "active", "inactive", "paused"
    pub group_id: Option<Uuid>,
    pub recurrence_type: String, // "daily", "weekly", "monthly", "once"
    pub recurrence_interval: i32,
    pub send_time: String, // "HH:MM" local
    pub weekdays: Option<Json>, // [0..=6], 0 = Sunday
    pub day_of_month: Option<i32>,
    pub timezone: String, // fixed offset, e.g. "-03:00"
    pub last_sent: Option<DateTimeUtc>,
    pub next_send: Option<DateTimeUtc>,
    pub email_subject: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub email_message: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub whatsapp_message: Option<String>,
    pub image_url: Option<String>,
    pub total_sent: i64,
    pub run_count: i64,
    pub locked_by: Option<Uuid>,
    pub locked_until: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
