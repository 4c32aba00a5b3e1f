use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notification envelope as delivered by SNS.
#[derive(Deserialize, Debug, Clone)]
pub struct SnsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SnsRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SnsRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SnsMessage {
    /// JSON-encoded CloudWatch alarm.
    #[serde(rename = "Message")]
    pub message: String,
}

impl SnsEvent {
    /// Decodes the alarm embedded in the first record.
    pub fn alarm(&self) -> Result<AlarmEvent> {
        let record = self
            .records
            .first()
            .context("Notification envelope has no records")?;

        serde_json::from_str(&record.sns.message)
            .context("Embedded alarm message is not a JSON object")
    }
}

#[derive(Deserialize, Debug)]
struct RawAlarm {
    #[serde(rename = "AlarmName")]
    alarm_name: Option<Value>,
    #[serde(rename = "NewStateValue")]
    new_state: Option<Value>,
    #[serde(rename = "NewStateReason")]
    reason: Option<Value>,
    #[serde(rename = "StateChangeTime")]
    state_change_time: Option<Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "RawAlarm")]
pub struct AlarmEvent {
    pub alarm_name: String,
    pub new_state: String,
    pub reason: String,
    /// Passed through verbatim, never parsed.
    pub state_change_time: String,
}

/// Strings pass through; numbers, booleans and nested values are rendered
/// as JSON text. Missing or null falls back to `default`.
fn text_or(value: Option<Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

impl From<RawAlarm> for AlarmEvent {
    fn from(raw: RawAlarm) -> Self {
        Self {
            alarm_name: text_or(raw.alarm_name, "Unknown Alarm"),
            new_state: text_or(raw.new_state, "UNKNOWN"),
            reason: text_or(raw.reason, "No reason provided"),
            state_change_time: text_or(raw.state_change_time, ""),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SlackMessage {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Attachment {
    pub color: String,
    pub fields: Vec<Field>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// `true` renders the field at half width.
    pub short: bool,
}

/// What one invocation reports back to its caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded string.
    pub body: String,
}

impl InvocationResult {
    pub fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::Value::from(message).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn envelope(message: &str) -> SnsEvent {
        serde_json::from_value(json!({
            "Records": [{ "EventSource": "aws:sns", "Sns": { "Message": message, "Subject": "ALARM" } }]
        }))
        .unwrap()
    }

    #[test]
    fn alarm_fields_are_read_verbatim() {
        let event = envelope(r#"{"AlarmName":"CPUHigh","NewStateValue":"ALARM","NewStateReason":"Threshold breached","StateChangeTime":"2024-01-01T00:00:00Z"}"#);

        assert_eq!(
            event.alarm().unwrap(),
            AlarmEvent {
                alarm_name: "CPUHigh".to_string(),
                new_state: "ALARM".to_string(),
                reason: "Threshold breached".to_string(),
                state_change_time: "2024-01-01T00:00:00Z".to_string(),
            }
        );
    }

    #[test]
    fn missing_and_null_fields_fall_back_to_defaults() {
        let alarm = envelope(r#"{"AlarmName":null,"Region":"eu-west-1"}"#).alarm().unwrap();

        assert_eq!(alarm.alarm_name, "Unknown Alarm");
        assert_eq!(alarm.new_state, "UNKNOWN");
        assert_eq!(alarm.reason, "No reason provided");
        assert_eq!(alarm.state_change_time, "");
    }

    #[test]
    fn non_string_fields_are_rendered_as_text() {
        let alarm = envelope(r#"{"AlarmName":123,"NewStateValue":"OK","NewStateReason":true,"StateChangeTime":1704067200}"#)
            .alarm()
            .unwrap();

        assert_eq!(alarm.alarm_name, "123");
        assert_eq!(alarm.new_state, "OK");
        assert_eq!(alarm.reason, "true");
        assert_eq!(alarm.state_change_time, "1704067200");
    }

    #[test]
    fn empty_envelope_or_bad_message_is_an_error() {
        let empty: SnsEvent = serde_json::from_value(json!({ "Records": [] })).unwrap();
        assert!(empty.alarm().is_err());

        assert!(envelope("not json").alarm().is_err());
    }

    #[test]
    fn invocation_body_is_json_encoded() {
        let result = InvocationResult::new(200, "Message sent to Slack");
        assert_eq!(result.body, "\"Message sent to Slack\"");

        let encoded = serde_json::to_value(&result).unwrap();
        assert_eq!(encoded, json!({ "statusCode": 200, "body": "\"Message sent to Slack\"" }));
    }
}
