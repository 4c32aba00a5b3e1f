use std::env;
use std::time::Duration;
use anyhow::{ensure, Context, Result};
use log::info;
use reqwest::Url;

const DEFAULT_TIMEOUT_S: u64 = 10;

pub struct NotifierConfig {
    pub webhook_url: String,
    pub timeout: Duration,
}

impl NotifierConfig {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_s = lookup("NOTIFIER_TIMEOUT_S")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_S);

        Self {
            webhook_url: lookup("SLACK_WEBHOOK_URL").unwrap_or_default(),
            timeout: Duration::from_secs(timeout_s),
        }
    }

    pub fn validate(self) -> Result<Self> {
        let url = self.webhook()?;
        info!("🔗 Webhook host: {}", url.host_str().unwrap_or_default());
        Ok(self)
    }

    /// Parsed webhook URL. The URL is mandatory: nothing is sent without it.
    pub fn webhook(&self) -> Result<Url> {
        ensure!(
            !self.webhook_url.trim().is_empty(),
            "Critical Error: SLACK_WEBHOOK_URL not set!"
        );

        let url = Url::parse(&self.webhook_url).context("SLACK_WEBHOOK_URL is not a valid URL")?;
        ensure!(
            matches!(url.scheme(), "http" | "https"),
            "SLACK_WEBHOOK_URL must be an http(s) URL, got scheme {:?}",
            url.scheme()
        );

        Ok(url)
    }
}
