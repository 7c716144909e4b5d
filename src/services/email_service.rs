use std::sync::Arc;

use serde::Serialize;

use crate::models::{ Lead, MessageTemplates };
use crate::providers::{ CatalogEmail, EmailSender };

use super::content_service::ResolvedContent;

const DEFAULT_SUBJECT: &str = "Imóveis em leilão selecionados para você";
const DEFAULT_MESSAGE: &str = "Confira as oportunidades que separamos para você.";

/// Per-channel tally for one schedule run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub sent: u32,
    pub failed: u32,
    /// Recipients without a contact for the channel, or already served.
    pub skipped: u32,
}

/// Sends the resolved catalog to every lead with an email address.
#[derive(Clone)]
pub struct EmailService {
    sender: Arc<dyn EmailSender>,
}

impl EmailService {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }

    pub async fn dispatch(
        &self,
        leads: &[Lead],
        content: &ResolvedContent,
        templates: &MessageTemplates
    ) -> ChannelReport {
        let mut report = ChannelReport::default();

        let subject = templates.email_subject.as_deref().unwrap_or(DEFAULT_SUBJECT);
        let message = templates.email_message.as_deref().unwrap_or(DEFAULT_MESSAGE);

        for lead in leads {
            let Some(address) = lead.email.as_deref() else {
                report.skipped += 1;
                continue;
            };

            let email = CatalogEmail {
                property_ids: content.property_ids.clone(),
                recipient_email: address.to_string(),
                page_type: content.region.as_str().to_string(),
                subject: subject.to_string(),
                message: message.to_string(),
            };

            match self.sender.send_catalog(&email).await {
                Ok(()) => {
                    tracing::debug!("Catalog email sent to {}", address);
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to send catalog email to {}: {}", address, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
