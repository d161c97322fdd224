// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire messages exchanged over the control and notification characteristics.
//!
//! Control payloads are JSON objects written by the mobile app. Decoding is
//! lenient: unknown fields are ignored and a field of the wrong JSON type is
//! treated as absent. Only non-UTF-8 bytes or a non-object document are
//! rejected.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::ble_constants::UNKNOWN;

/// Human-readable text carried by every pairing acknowledgement.
pub const PAIRING_SUCCESS_MESSAGE: &str = "Pairing completed successfully";

/// Errors raised while decoding an incoming write.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Manual joystick vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualControl {
    pub x: f64,
    pub y: f64,
}

/// Control payload written by the mobile app.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPayload {
    pub power_on: bool,
    /// Percentage as sent by the client. Not clamped.
    pub speed: Option<Number>,
    pub tracking_on: bool,
    /// Empty string means no face is selected.
    pub selected_face_id: String,
    pub manual: Option<ManualControl>,
    pub device_name: String,
    /// Client clock, informational only.
    pub timestamp: Option<String>,
    /// The object exactly as received, unknown and mistyped fields included.
    pub raw: Map<String, Value>,
}

impl Default for ControlPayload {
    fn default() -> Self {
        Self {
            power_on: false,
            speed: None,
            tracking_on: false,
            selected_face_id: String::new(),
            manual: None,
            device_name: UNKNOWN.to_string(),
            timestamp: None,
            raw: Map::new(),
        }
    }
}

impl ControlPayload {
    /// Decode a raw characteristic write.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(data)?;
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self::from_fields(fields)),
            _ => Err(DecodeError::NotAnObject),
        }
    }

    fn from_fields(fields: Map<String, Value>) -> Self {
        let string_field = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        let mut payload = Self {
            power_on: fields
                .get("powerOn")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            speed: match fields.get("speed") {
                Some(Value::Number(n)) => Some(n.clone()),
                _ => None,
            },
            tracking_on: fields
                .get("trackingOn")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            selected_face_id: string_field("selectedFaceId").unwrap_or_default(),
            manual: fields
                .get("manual")
                .and_then(|v| ManualControl::deserialize(v).ok()),
            device_name: string_field("deviceName").unwrap_or_else(|| UNKNOWN.to_string()),
            timestamp: string_field("timestamp"),
            raw: Map::new(),
        };
        payload.raw = fields;
        payload
    }

    /// The payload as the client sent it, re-serialized as compact JSON.
    pub fn raw_json(&self) -> String {
        Value::Object(self.raw.clone()).to_string()
    }

    /// Name reported by the app, if it carries any identifying value.
    pub fn client_reported_name(&self) -> Option<&str> {
        let name = self.device_name.as_str();
        (!name.is_empty() && name != UNKNOWN).then_some(name)
    }

    /// Face selection for display, `NONE` when nothing is selected.
    pub fn face_label(&self) -> &str {
        if self.selected_face_id.is_empty() {
            "NONE"
        } else {
            &self.selected_face_id
        }
    }

    /// Speed for display, `N/A` when the client omitted it.
    pub fn speed_label(&self) -> String {
        self.speed
            .as_ref()
            .map(Number::to_string)
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Type tag of peripheral-to-client notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PairingSuccess,
}

/// Notification pushed to the app over the notify characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "type")]
    pub message_type: NotificationType,
    pub device_address: String,
    /// ISO-8601 time of sending.
    pub timestamp: String,
    pub message: String,
}

impl NotificationMessage {
    /// Build the pairing acknowledgement for a newly seen device.
    pub fn pairing_success(device_address: &str, at: DateTime<Utc>) -> Self {
        Self {
            message_type: NotificationType::PairingSuccess,
            device_address: device_address.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            message: PAIRING_SUCCESS_MESSAGE.to_string(),
        }
    }

    /// Serialize to UTF-8 JSON bytes.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse a notification as the app would.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(data)?;
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    #[test]
    fn test_decode_full_payload() -> Result<()> {
        let json = br#"{
            "powerOn": true,
            "speed": 75,
            "trackingOn": true,
            "selectedFaceId": "face-1",
            "manual": {"x": 0.5, "y": -1},
            "deviceName": "Pixel 8",
            "timestamp": "2026-01-01T10:00:00"
        }"#;

        let payload = ControlPayload::decode(json)?;

        assert!(payload.power_on);
        assert_eq!(payload.speed_label(), "75");
        assert!(payload.tracking_on);
        assert_eq!(payload.face_label(), "face-1");
        assert_eq!(payload.manual, Some(ManualControl { x: 0.5, y: -1.0 }));
        assert_eq!(payload.client_reported_name(), Some("Pixel 8"));
        assert_eq!(payload.timestamp.as_deref(), Some("2026-01-01T10:00:00"));
        Ok(())
    }

    #[test]
    fn test_decode_empty_object_uses_defaults() -> Result<()> {
        let payload = ControlPayload::decode(b"{}")?;
        assert_eq!(payload, ControlPayload::default());
        assert_eq!(payload.device_name, "Unknown");
        assert_eq!(payload.client_reported_name(), None);
        assert_eq!(payload.face_label(), "NONE");
        assert_eq!(payload.speed_label(), "N/A");
        Ok(())
    }

    #[test]
    fn test_decode_ignores_unknown_and_mistyped_fields() -> Result<()> {
        let payload = ControlPayload::decode(
            br#"{"powerOn": "yes", "speed": "fast", "deviceName": 42, "extra": [1, 2]}"#,
        )?;
        assert!(!payload.power_on);
        assert_eq!(payload.speed, None);
        assert_eq!(payload.device_name, "Unknown");
        assert_eq!(payload.raw["powerOn"], "yes");
        assert_eq!(payload.raw["extra"], serde_json::json!([1, 2]));
        Ok(())
    }

    #[test]
    fn test_decode_keeps_speed_unclamped() -> Result<()> {
        let payload = ControlPayload::decode(br#"{"powerOn": true, "speed": 250.5}"#)?;
        assert_eq!(payload.speed_label(), "250.5");
        Ok(())
    }

    #[test]
    fn test_decode_rejects_invalid_input() {
        assert!(matches!(
            ControlPayload::decode(&[0xff, 0xfe, 0x7b]),
            Err(DecodeError::Utf8(_))
        ));
        assert!(matches!(
            ControlPayload::decode(br#"{"powerOn": tr"#),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            ControlPayload::decode(b"[1, 2, 3]"),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn test_pairing_success_wire_format() -> Result<()> {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let message = NotificationMessage::pairing_success("AA:BB:CC:DD:EE:FF", at);

        let value: Value = serde_json::from_slice(&message.encode()?)?;
        assert_eq!(value["type"], "pairing_success");
        assert_eq!(value["device_address"], "AA:BB:CC:DD:EE:FF");
        assert_eq!(value["timestamp"], "2026-03-01T12:30:00.000Z");
        assert_eq!(value["message"], PAIRING_SUCCESS_MESSAGE);

        let decoded = NotificationMessage::decode(&message.encode()?)?;
        assert_eq!(decoded, message);
        Ok(())
    }
}
