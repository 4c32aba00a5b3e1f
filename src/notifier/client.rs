use std::time::Duration;
use anyhow::{Context, Result};
use reqwest::{Client, Url};

use super::models::SlackMessage;

/// Posts chat messages to one incoming-webhook URL.
pub struct WebhookClient {
    url: Url,
    client: Client,
}

impl WebhookClient {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build webhook HTTP client")?,
        })
    }

    /// Sends the message once. Non-2xx answers count as failures.
    pub async fn post(&self, message: &SlackMessage) -> Result<()> {
        let res = self.client
            .post(self.url.clone())
            .json(message)
            .send()
            .await
            .context("Failed to reach webhook")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Webhook error {}: {}", status, body));
        }

        Ok(())
    }
}
