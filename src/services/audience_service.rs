use std::sync::Arc;

use crate::error::{ AppError, Result };
use crate::models::{ Lead, Schedule };
use crate::providers::OutreachStore;

/// Resolves who a schedule run goes to.
#[derive(Clone)]
pub struct AudienceService {
    store: Arc<dyn OutreachStore>,
}

impl AudienceService {
    pub fn new(store: Arc<dyn OutreachStore>) -> Self {
        Self { store }
    }

    /// Explicitly attached leads replace group membership entirely; the two
    /// sources are never merged.
    pub async fn resolve(&self, schedule: &Schedule) -> Result<Vec<Lead>> {
        let explicit = self.store.explicit_leads(schedule.id).await?;
        if !explicit.is_empty() {
            tracing::debug!(
                "Schedule {} targets {} explicitly attached leads",
                schedule.id,
                explicit.len()
            );
            return Ok(explicit);
        }

        if let Some(group_id) = schedule.group_id {
            let members = self.store.group_leads(group_id).await?;
            if !members.is_empty() {
                tracing::debug!(
                    "Schedule {} targets {} leads from group {}",
                    schedule.id,
                    members.len(),
                    group_id
                );
                return Ok(members);
            }
        }

        Err(AppError::NoRecipients)
    }
}
