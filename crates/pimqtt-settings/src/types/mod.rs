//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so partial JSON files are accepted; missing fields get their default
//! value. Keys that have no sensible default (the broker host) default to
//! empty and are rejected by [`crate::validate`].

mod broker;
mod device;

pub use broker::*;
pub use device::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the daemon.
///
/// # JSON Format
///
/// ```json
/// {
///   "broker": { "host": "mqtt.local", "port": 8883, "tls": true },
///   "topics": { "command": "COMMAND/picamera" },
///   "camera": { "enabled": false }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PimqttSettings {
    /// Broker connection.
    pub broker: BrokerSettings,
    /// Topic names.
    pub topics: TopicSettings,
    /// Still camera.
    pub camera: CameraSettings,
    /// Image cache directory.
    pub images: ImageSettings,
    /// Command gating.
    pub commands: CommandSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl PimqttSettings {
    /// JSON view with the broker password masked, for display.
    pub fn redacted(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(password) = value.pointer_mut("/broker/password") {
            if password.as_str().is_some_and(|p| !p.is_empty()) {
                *password = serde_json::Value::String("********".into());
            }
        }
        value
    }
}

/// Topic names, fixed at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicSettings {
    /// Subscribed command topic.
    pub command: String,
    /// Base for responses; the command name is appended.
    pub response: String,
    /// Base for photo payloads; the file name is appended.
    pub camera: String,
    /// Base for the retained liveness marker; the node id is appended.
    pub liveness: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            command: "COMMAND/picamera".to_string(),
            response: "SENSOR/picamera/status".to_string(),
            camera: "SENSOR/picamera/data".to_string(),
            liveness: "SENSOR/picamera/lwt".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive (e.g. `info`, `pimqtt_session=debug`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: pimqtt_core::logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
