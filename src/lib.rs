//! Visit tracking web service and the CloudWatch-to-Slack alarm relay.

pub mod config;
pub mod db;
pub mod models;
pub mod notifier;
pub mod web;
