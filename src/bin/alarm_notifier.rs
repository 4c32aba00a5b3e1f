//! Relays one CloudWatch alarm notification to Slack.
//!
//! Usage: `alarm-notifier [EVENT_FILE]`. The SNS envelope is read from
//! `EVENT_FILE`, or from stdin when no file is given. The invocation result
//! is printed to stdout as JSON.

use anyhow::{Context, Result};
use std::io::Read;
use std::process::ExitCode;

extern crate pretty_env_logger;
#[macro_use] extern crate log;

use visit_tracker::notifier::{self, NotifierConfig, SnsEvent};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let config = NotifierConfig::load()
        .validate()
        .context("Error checking env variables.")?;

    let raw = read_event(std::env::args().nth(1))?;
    let event: SnsEvent = serde_json::from_str(&raw)
        .context("Event is not a valid SNS notification envelope")?;

    let result = notifier::notify(&config, &event).await?;
    println!("{}", serde_json::to_string(&result)?);

    if result.is_success() {
        info!("✅ Alarm relayed");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn read_event(path: Option<String>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event file {:?}", path)),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            Ok(raw)
        }
    }
}
