//! CloudWatch alarm relay: one SNS notification in, one Slack message out.

pub mod client;
pub mod config;
pub mod models;
pub mod presentation;

use anyhow::Result;
use log::{debug, error, info};

pub use client::WebhookClient;
pub use config::NotifierConfig;
pub use models::{AlarmEvent, InvocationResult, SlackMessage, SnsEvent};

/// Relays the alarm carried by `event`.
///
/// Delivery failures are reported through the returned [`InvocationResult`]
/// (status 500) and are not retried. A missing webhook URL or a malformed
/// event is an `Err`, raised before anything is sent.
pub async fn notify(config: &NotifierConfig, event: &SnsEvent) -> Result<InvocationResult> {
    let webhook = config.webhook()?;
    let alarm = event.alarm()?;
    info!("Relaying alarm {} ({})", alarm.alarm_name, alarm.new_state);

    let message = presentation::build_message(&alarm);
    debug!("Chat message: {:?}", message);

    let client = WebhookClient::new(webhook, config.timeout)?;

    match client.post(&message).await {
        Ok(()) => Ok(InvocationResult::new(200, "Message sent to Slack")),
        Err(e) => {
            error!("Error sending to Slack: {:#}", e);
            Ok(InvocationResult::new(500, &format!("Error: {:#}", e)))
        }
    }
}
