//! Validated records read from the store.
//!
//! Rows are parsed here, at the boundary, so the scheduler never works with
//! half-formed data. A row that cannot be parsed becomes
//! `AppError::MalformedRecord`, which fails only the schedule being processed.

use uuid::Uuid;

use crate::db::entity::{ lead, schedule, static_page };
use crate::enums::{ DeliveryMethod, RecurrenceType, Region };
use crate::error::{ AppError, Result };
use crate::recurrence::{ self, RecurrenceRule };

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageTemplates {
    pub email_subject: Option<String>,
    pub email_message: Option<String>,
    pub whatsapp_message: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: Uuid,
    pub name: String,
    pub method: DeliveryMethod,
    pub group_id: Option<Uuid>,
    pub recurrence: RecurrenceRule,
    pub templates: MessageTemplates,
}

impl TryFrom<schedule::Model> for Schedule {
    type Error = AppError;

    fn try_from(row: schedule::Model) -> Result<Self> {
        let id = row.id;
        let bad = |reason: String| AppError::malformed("schedule", id, reason);

        let method = row.method.parse::<DeliveryMethod>().map_err(|e| bad(e.to_string()))?;
        let kind = row.recurrence_type.parse::<RecurrenceType>().map_err(|e| bad(e.to_string()))?;

        let interval = u32
            ::try_from(row.recurrence_interval)
            .ok()
            .filter(|i| *i >= 1)
            .ok_or_else(|| bad(format!("invalid interval {}", row.recurrence_interval)))?;

        let time = recurrence
            ::parse_time_of_day(&row.send_time)
            .ok_or_else(|| bad(format!("invalid send time '{}'", row.send_time)))?;

        let offset = recurrence
            ::parse_offset(&row.timezone)
            .ok_or_else(|| bad(format!("invalid timezone '{}'", row.timezone)))?;

        let weekdays = match &row.weekdays {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => {
                let mut days = Vec::with_capacity(items.len());
                for item in items {
                    let day = item
                        .as_i64()
                        .and_then(recurrence::weekday_from_index)
                        .ok_or_else(|| bad(format!("invalid weekday {}", item)))?;
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
                days
            }
            Some(other) => {
                return Err(bad(format!("weekdays must be an array, got {}", other)));
            }
        };

        let day_of_month = match row.day_of_month {
            None => None,
            Some(d) if (1..=31).contains(&d) => Some(d as u32),
            Some(d) => {
                return Err(bad(format!("invalid day of month {}", d)));
            }
        };

        // Without a fixed day the rule would drift after landing on a clamped day
        if kind == RecurrenceType::Monthly && day_of_month.is_none() {
            return Err(bad("monthly recurrence requires a day of month".to_string()));
        }

        Ok(Schedule {
            id,
            name: row.name,
            method,
            group_id: row.group_id,
            recurrence: RecurrenceRule {
                kind,
                interval,
                time,
                weekdays,
                day_of_month,
                offset,
            },
            templates: MessageTemplates {
                email_subject: non_blank(row.email_subject),
                email_message: non_blank(row.email_message),
                whatsapp_message: non_blank(row.whatsapp_message),
                image_url: non_blank(row.image_url),
            },
        })
    }
}

/// A lead with its contact points trimmed; blank values become `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub filter_config: Option<String>,
}

impl From<lead::Model> for Lead {
    fn from(row: lead::Model) -> Self {
        Lead {
            id: row.id,
            name: row.name,
            email: non_blank(row.email),
            phone: non_blank(row.phone),
            filter_config: non_blank(row.filter_config),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticPage {
    pub page_id: String,
    pub property_ids: Vec<i64>,
    pub region: Region,
}

impl TryFrom<static_page::Model> for StaticPage {
    type Error = AppError;

    fn try_from(row: static_page::Model) -> Result<Self> {
        let region = row.page_type
            .parse::<Region>()
            .map_err(|e| AppError::malformed("static page", &row.page_id, e.to_string()))?;

        Ok(StaticPage {
            property_ids: parse_property_ids(&row.property_ids),
            page_id: row.page_id,
            region,
        })
    }
}

/// Accept integers and numeric strings; drop everything else.
pub fn parse_property_ids(value: &serde_json::Value) -> Vec<i64> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => {
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| {
            match item {
                serde_json::Value::Number(n) => n.as_i64(),
                serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
