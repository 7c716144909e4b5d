use std::collections::HashMap;
use std::env;
use std::time::Duration;

use chrono::FixedOffset;

use crate::enums::Region;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub email_function_url: String,
    pub email_function_token: Option<String>,
    pub whatsapp_webhooks: HashMap<Region, String>,
    pub default_region: Region,
    pub default_catalog_path: String,
    pub default_property_sample: u64,
    pub timezone: FixedOffset,
    pub whatsapp_send_delay: Duration,
    pub schedule_lease: Duration,
    pub scheduler_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let email_function_url = env::var("EMAIL_FUNCTION_URL")?;
        let email_function_token = env::var("EMAIL_FUNCTION_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        // One webhook per region, only for regions that have one configured
        let mut whatsapp_webhooks = HashMap::new();
        for &region in Region::all() {
            let key = format!("WHATSAPP_WEBHOOK_{}", region.as_str().to_uppercase());
            if let Ok(url) = env::var(&key) {
                let url = url.trim().to_string();
                if !url.is_empty() {
                    whatsapp_webhooks.insert(region, url);
                }
            }
        }

        if whatsapp_webhooks.is_empty() {
            return Err(
                "No WhatsApp webhook configured. Set WHATSAPP_WEBHOOK_RJ and/or WHATSAPP_WEBHOOK_SP.".into()
            );
        }

        let default_region: Region = env::var("DEFAULT_REGION")
            .unwrap_or_else(|_| "rj".to_string())
            .parse()?;

        let default_catalog_path = env::var("DEFAULT_CATALOG_PATH").unwrap_or_else(|_|
            "/catalogo".to_string()
        );

        let default_property_sample = env::var("DEFAULT_PROPERTY_SAMPLE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let timezone = Self::parse_offset(
            &env::var("SCHEDULER_TIMEZONE").unwrap_or_else(|_| "-03:00".to_string())
        )?;

        let whatsapp_send_delay = Duration::from_millis(
            env::var("WHATSAPP_SEND_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?
        );

        let schedule_lease = Duration::from_secs(
            env::var("SCHEDULE_LEASE_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?
        );

        let scheduler_interval = match env::var("SCHEDULER_INTERVAL_SECS") {
            Ok(secs) => Some(Duration::from_secs(secs.parse()?)),
            Err(_) => None,
        };

        Ok(Config {
            database_url,
            server_host,
            server_port,
            email_function_url,
            email_function_token,
            whatsapp_webhooks,
            default_region,
            default_catalog_path,
            default_property_sample,
            timezone,
            whatsapp_send_delay,
            schedule_lease,
            scheduler_interval,
        })
    }

    /// Parse a fixed UTC offset such as `-03:00`, `+0530`, `UTC` or `Z`.
    pub fn parse_offset(value: &str) -> Result<FixedOffset, Box<dyn std::error::Error>> {
        crate::recurrence::parse_offset(value).ok_or_else(||
            format!("Invalid UTC offset: {}", value).into()
        )
    }
}
