use std::collections::HashMap;

use async_trait::async_trait;

use crate::enums::Region;
use crate::error::{ AppError, Result };
use crate::providers::{ WhatsAppPayload, WhatsAppRelay };

/// Posts messages to the WhatsApp relay, one webhook per region.
#[derive(Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    endpoints: HashMap<Region, String>,
    default_region: Region,
}

impl WebhookRelay {
    pub fn new(endpoints: HashMap<Region, String>, default_region: Region) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(AppError::Config("No WhatsApp webhook endpoints configured".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            endpoints,
            default_region,
        })
    }

    /// The region's endpoint, else the default region's, else any configured one.
    pub fn endpoint_for(&self, region: Region) -> Option<&str> {
        self.endpoints
            .get(&region)
            .or_else(|| self.endpoints.get(&self.default_region))
            .or_else(|| Region::all().iter().find_map(|r| self.endpoints.get(r)))
            .map(String::as_str)
    }
}

#[async_trait]
impl WhatsAppRelay for WebhookRelay {
    async fn deliver(&self, region: Region, payload: &WhatsAppPayload) -> Result<String> {
        let endpoint = self
            .endpoint_for(region)
            .ok_or_else(|| AppError::Config(format!("No WhatsApp webhook for region {}", region)))?;

        let resp = self.client
            .post(endpoint)
            .json(payload)
            .send().await
            .map_err(|e| AppError::WhatsApp(format!("Webhook request failed: {}", e)))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::WhatsApp(format!("Webhook returned {}: {}", status, body)));
        }

        Ok(body)
    }
}
