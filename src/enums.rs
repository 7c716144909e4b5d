use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── DeliveryMethod ─────────────────────────────────────────────────

/// Channels a schedule dispatches through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    Email,
    Whatsapp,
    Both,
}

impl DeliveryMethod {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Email => "email",
            DeliveryMethod::Whatsapp => "whatsapp",
            DeliveryMethod::Both => "both",
        }
    }

    pub fn includes_email(&self) -> bool {
        matches!(self, DeliveryMethod::Email | DeliveryMethod::Both)
    }

    pub fn includes_whatsapp(&self) -> bool {
        matches!(self, DeliveryMethod::Whatsapp | DeliveryMethod::Both)
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(DeliveryMethod::Email),
            "whatsapp" => Ok(DeliveryMethod::Whatsapp),
            "both" => Ok(DeliveryMethod::Both),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid delivery method: {}. Supported: email, whatsapp, both",
                s
            ))),
        }
    }
}

// ─── ScheduleStatus ─────────────────────────────────────────────────

/// Activation state of an outreach schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Active,
    Inactive,
    Paused,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Inactive => "inactive",
            ScheduleStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ScheduleStatus::Active),
            "inactive" => Ok(ScheduleStatus::Inactive),
            "paused" => Ok(ScheduleStatus::Paused),
            _ => Err(AppError::InvalidInput(format!("Invalid schedule status: {}", s))),
        }
    }
}

// ─── RecurrenceType ─────────────────────────────────────────────────

/// Recurrence pattern of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Once,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Once => "once",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceType::Once)
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            "once" => Ok(RecurrenceType::Once),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid recurrence type: {}. Supported: daily, weekly, monthly, once",
                s
            ))),
        }
    }
}

// ─── Region ─────────────────────────────────────────────────────────

/// Catalog region; selects the page type sent to the email function and
/// the WhatsApp webhook endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Rj,
    Sp,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Rj => "rj",
            Region::Sp => "sp",
        }
    }

    pub fn all() -> &'static [Region] {
        &[Region::Rj, Region::Sp]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rj" | "rio" | "rio-de-janeiro" => Ok(Region::Rj),
            "sp" | "sao-paulo" | "são-paulo" => Ok(Region::Sp),
            _ => Err(AppError::InvalidInput(format!(
                "Unsupported region: {}. Supported: rj, sp",
                s
            ))),
        }
    }
}
