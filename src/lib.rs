pub mod config;
pub mod enums;
pub mod error;
pub mod recurrence;
pub mod db;
pub mod models;
pub mod providers;
pub mod clients;
pub mod services;
pub mod scheduler;
pub mod api;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use enums::{ DeliveryMethod, RecurrenceType, Region, ScheduleStatus };
pub use error::{ AppError, Result };
pub use scheduler::{ BatchSummary, RunMode, Scheduler };
