use axum::{ extract::State, Json };
use chrono::Utc;

use crate::error::Result;
use crate::scheduler::{ BatchSummary, RunMode };

use super::AppState;

pub async fn process_unified_schedules(
    State(state): State<AppState>
) -> Result<Json<BatchSummary>> {
    let summary = state.scheduler.run_batch(RunMode::Unified, Utc::now()).await?;
    Ok(Json(summary))
}

pub async fn process_whatsapp_schedules(
    State(state): State<AppState>
) -> Result<Json<BatchSummary>> {
    let summary = state.scheduler.run_batch(RunMode::WhatsAppOnly, Utc::now()).await?;
    Ok(Json(summary))
}

pub async fn preflight() -> &'static str {
    "ok"
}
