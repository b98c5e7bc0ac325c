//! # pimqtt-settings
//!
//! Configuration management with layered sources for the pimqtt daemon.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`PimqttSettings::default()`]
//! 2. **Settings file**: `~/.pimqtt/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `PIMQTT_*` overrides (highest priority)
//!
//! The merged result is validated; a missing broker host, an empty topic,
//! or a malformed value is a fatal startup error. Settings are loaded once
//! and passed to the session by value; there is no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;
pub mod validate;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
pub use validate::validate;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = PimqttSettings::default();
        let path = settings_path();
        assert!(path.ends_with(".pimqtt/settings.json"));
    }

    #[test]
    fn load_and_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"broker": {"host": "mqtt.local"}, "camera": {"enabled": false}}"#,
        )
        .unwrap();
        let settings = load_settings_from_path(&path, |_| None).unwrap();
        assert!(validate(&settings).is_ok());
        assert!(!settings.camera.enabled);
    }
}
