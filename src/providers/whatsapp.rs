use async_trait::async_trait;
use serde::Serialize;

use crate::enums::Region;
use crate::error::Result;

/// Body posted to the WhatsApp relay webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatsAppPayload {
    pub num: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[async_trait]
pub trait WhatsAppRelay: Send + Sync {
    /// Deliver one message through the region's webhook, returning the relay's response body.
    async fn deliver(&self, region: Region, payload: &WhatsAppPayload) -> Result<String>;
}
