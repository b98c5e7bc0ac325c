//! Required-key validation, run after all layers are applied.

use pimqtt_core::topics::has_wildcard;

use crate::errors::{Result, SettingsError};
use crate::types::PimqttSettings;

/// Smallest keepalive accepted, in seconds.
pub const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Smallest packet size limit accepted, in bytes.
pub const MIN_PACKET_BYTES: usize = 1024;

/// Check that every required key is present and well-formed.
pub fn validate(settings: &PimqttSettings) -> Result<()> {
    let broker = &settings.broker;
    if broker.host.trim().is_empty() {
        return Err(SettingsError::Missing("broker.host"));
    }
    if broker.port == 0 {
        return Err(SettingsError::InvalidValue("broker.port must be non-zero".into()));
    }
    if broker.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
        return Err(SettingsError::InvalidValue(format!(
            "broker.keepAliveSecs must be at least {MIN_KEEP_ALIVE_SECS}"
        )));
    }
    if broker.auth && broker.username.is_empty() {
        return Err(SettingsError::Missing("broker.username"));
    }
    if broker.max_packet_bytes < MIN_PACKET_BYTES {
        return Err(SettingsError::InvalidValue(format!(
            "broker.maxPacketBytes must be at least {MIN_PACKET_BYTES}"
        )));
    }
    if broker.ca_file.as_deref().is_some_and(str::is_empty) {
        return Err(SettingsError::InvalidValue("broker.caFile must not be empty".into()));
    }

    let topics = &settings.topics;
    for (key, topic) in [
        ("topics.command", &topics.command),
        ("topics.response", &topics.response),
        ("topics.camera", &topics.camera),
        ("topics.liveness", &topics.liveness),
    ] {
        if topic.trim_matches('/').is_empty() {
            return Err(SettingsError::Missing(key));
        }
        if has_wildcard(topic) {
            return Err(SettingsError::InvalidValue(format!(
                "{key} must not contain MQTT wildcards"
            )));
        }
    }

    if settings.images.extension.trim_start_matches('.').is_empty() {
        return Err(SettingsError::Missing("images.extension"));
    }
    if settings.images.dir.is_empty() {
        return Err(SettingsError::Missing("images.dir"));
    }
    if settings.camera.enabled && settings.camera.program.is_empty() {
        return Err(SettingsError::Missing("camera.program"));
    }
    Ok(())
}
