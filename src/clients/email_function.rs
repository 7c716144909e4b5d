use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ AppError, Result };
use crate::providers::{ CatalogEmail, EmailSender };

/// Calls the hosted function that renders the property catalog and sends it.
#[derive(Clone)]
pub struct EmailFunctionClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl EmailFunctionClient {
    pub fn new(url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            url: url.to_string(),
            token,
        }
    }
}

#[async_trait]
impl EmailSender for EmailFunctionClient {
    async fn send_catalog(&self, email: &CatalogEmail) -> Result<()> {
        let mut request = self.client.post(&self.url).json(email);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send().await
            .map_err(|e| AppError::Email(format!("Email function request failed: {}", e)))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::Email(format!("Email function returned {}: {}", status, body)));
        }

        // A 2xx with an explicit `success: false` is still a failure
        if let Ok(parsed) = serde_json::from_str::<FunctionResponse>(&body) {
            if parsed.success == Some(false) {
                return Err(
                    AppError::Email(
                        parsed.error.unwrap_or_else(|| "Email function reported failure".to_string())
                    )
                );
            }
        }

        Ok(())
    }
}
