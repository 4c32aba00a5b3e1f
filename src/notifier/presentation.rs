use super::models::{AlarmEvent, Attachment, Field, SlackMessage};

/// Alarm states with special presentation. Every other label is a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmState {
    Alarm,
    Ok,
    Other(String),
}

impl AlarmState {
    pub fn from_label(label: &str) -> Self {
        match label {
            "ALARM" => AlarmState::Alarm,
            "OK" => AlarmState::Ok,
            other => AlarmState::Other(other.to_string()),
        }
    }

    /// Slack attachment color.
    pub fn color(&self) -> &'static str {
        match self {
            AlarmState::Alarm => "danger",
            AlarmState::Ok => "good",
            AlarmState::Other(_) => "warning",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            AlarmState::Alarm => "🔴",
            AlarmState::Ok => "✅",
            AlarmState::Other(_) => "⚠️",
        }
    }
}

fn field(title: &str, value: &str, short: bool) -> Field {
    Field {
        title: title.to_string(),
        value: value.to_string(),
        short,
    }
}

pub fn build_message(alarm: &AlarmEvent) -> SlackMessage {
    let state = AlarmState::from_label(&alarm.new_state);

    SlackMessage {
        text: format!("{} CloudWatch Alarm: {}", state.marker(), alarm.alarm_name),
        attachments: vec![Attachment {
            color: state.color().to_string(),
            fields: vec![
                field("Alarm Name", &alarm.alarm_name, true),
                field("State", &alarm.new_state, true),
                field("Reason", &alarm.reason, false),
                field("Time", &alarm.state_change_time, true),
            ],
        }],
    }
}
