use std::sync::Arc;

use axum::{ routing::{ get, post }, Router };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };

pub mod schedules;

use crate::scheduler::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/functions/v1/process-unified-schedules",
            post(schedules::process_unified_schedules).options(schedules::preflight)
        )
        .route(
            "/functions/v1/process-whatsapp-schedules",
            post(schedules::process_whatsapp_schedules).options(schedules::preflight)
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}
