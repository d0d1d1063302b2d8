// Inbound sensor message and accepted reading
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

const CHANNEL_KEYS: [&str; 3] = ["channel", "name", "sensor"];
const PAYLOAD_KEYS: [&str; 2] = ["payload", "data"];

/// A decoded message from the transport. Either half may be missing; the
/// pipeline decides what to do with incomplete messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboundMessage {
    pub channel: Option<String>,
    pub payload: Option<Value>,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: Some(channel.into()),
            payload: Some(payload),
        }
    }

    /// Accepts `channel`/`name`/`sensor` for the sensor name and
    /// `payload`/`data` for the body. Empty names and nulls count as absent.
    pub fn from_value(value: &Value) -> Self {
        let channel = CHANNEL_KEYS
            .iter()
            .filter_map(|key| value.get(*key))
            .filter_map(Value::as_str)
            .find(|name| !name.is_empty())
            .map(str::to_string);

        let payload = PAYLOAD_KEYS
            .iter()
            .filter_map(|key| value.get(*key))
            .find(|payload| !payload.is_null())
            .cloned();

        Self { channel, payload }
    }

    /// Unparsable text becomes an empty message rather than an error.
    pub fn from_json_str(text: &str) -> Self {
        serde_json::from_str::<Value>(text)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    /// Same as `from_json_str` for raw bytes; invalid UTF-8 is just another
    /// unparsable body.
    pub fn from_json_slice(bytes: &[u8]) -> Self {
        serde_json::from_slice::<Value>(bytes)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }
}

/// A value that made it into a channel window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub channel: String,
    pub value: f64,
    pub received_at: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(channel: String, value: f64) -> Self {
        Self {
            channel,
            value,
            received_at: Utc::now(),
        }
    }
}
