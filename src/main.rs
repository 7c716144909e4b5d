use std::sync::Arc;

use migration::MigratorTrait;
use outreach_scheduler::{
    api::{ self, AppState },
    clients::{ EmailFunctionClient, WebhookRelay },
    db::OutreachRepository,
    providers::OutreachStore,
    services::{ AudienceService, ContentService, EmailService, WhatsAppService },
    AppError,
    Config,
    Result,
    Scheduler,
};
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "outreach_scheduler=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!(
        "Starting outreach-scheduler (default region {}, timezone {})",
        config.default_region,
        config.timezone
    );

    // Initialize database connection
    let db = sea_orm::Database::connect(&config.database_url).await?;

    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;

    tracing::info!("Migrations completed successfully");

    let store: Arc<dyn OutreachStore> = Arc::new(OutreachRepository::new(db));

    // Outbound channels
    let email_sender = Arc::new(
        EmailFunctionClient::new(&config.email_function_url, config.email_function_token.clone())
    );
    let relay = Arc::new(
        WebhookRelay::new(config.whatsapp_webhooks.clone(), config.default_region)?
    );

    // Initialize services
    let audience = AudienceService::new(store.clone());
    let content = ContentService::new(
        store.clone(),
        config.default_region,
        config.default_property_sample
    );
    let email = EmailService::new(email_sender);
    let whatsapp = WhatsAppService::new(
        store.clone(),
        relay,
        config.default_catalog_path.clone(),
        config.whatsapp_send_delay
    );

    let scheduler = Arc::new(
        Scheduler::new(
            store,
            audience,
            content,
            email,
            whatsapp,
            config.timezone,
            config.schedule_lease
        )
    );

    if let Some(every) = config.scheduler_interval {
        tracing::info!("In-process scheduler running every {:?}", every);
        tokio::spawn(scheduler.clone().start(every));
    }

    let app = api::router(AppState::new(scheduler));

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
