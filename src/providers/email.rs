use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Payload for the catalog email function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEmail {
    pub property_ids: Vec<i64>,
    pub recipient_email: String,
    pub page_type: String,
    pub subject: String,
    pub message: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Render and send one catalog email. `Ok` means the function reported success.
    async fn send_catalog(&self, email: &CatalogEmail) -> Result<()>;
}
