//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`PimqttSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `PIMQTT_*` environment variable overrides (highest priority)
//! 4. Validate required keys
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::PimqttSettings;
use crate::validate::validate;

/// Resolve the default settings path (`~/.pimqtt/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".pimqtt").join("settings.json")
}

/// Load and validate settings.
///
/// An explicit `path` must exist. Without one, the default path is used
/// when present and compiled defaults otherwise; env overrides then have to
/// supply the required keys.
pub fn load_settings(path: Option<&Path>) -> Result<PimqttSettings> {
    let settings = match path {
        Some(path) if !path.exists() => return Err(SettingsError::NotFound(path.to_path_buf())),
        Some(path) => load_settings_from_path(path, env_lookup)?,
        None => load_settings_from_path(&settings_path(), env_lookup)?,
    };
    validate(&settings)?;
    Ok(settings)
}

/// Load settings from a specific path, applying overrides from `lookup`.
///
/// If the file does not exist, returns defaults with overrides. If the file
/// contains invalid JSON or a field has the wrong type, returns an error.
/// Does not validate.
pub fn load_settings_from_path<F>(path: &Path, lookup: F) -> Result<PimqttSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(PimqttSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: PimqttSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, lookup);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are logged and ignored (fall back to file/default)
pub fn apply_env_overrides<F>(settings: &mut PimqttSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Broker ──────────────────────────────────────────────────────
    if let Some(v) = env.string("PIMQTT_HOST") {
        settings.broker.host = v;
    }
    if let Some(v) = env.u16("PIMQTT_PORT", 1, 65535) {
        settings.broker.port = v;
    }
    if let Some(v) = env.bool("PIMQTT_TLS") {
        settings.broker.tls = v;
    }
    if let Some(v) = env.string("PIMQTT_CA_FILE") {
        settings.broker.ca_file = Some(v);
    }
    if let Some(v) = env.bool("PIMQTT_AUTH") {
        settings.broker.auth = v;
    }
    if let Some(v) = env.string("PIMQTT_USERNAME") {
        settings.broker.username = v;
    }
    if let Some(v) = env.string("PIMQTT_PASSWORD") {
        settings.broker.password = v;
    }
    if let Some(v) = env.u64("PIMQTT_KEEPALIVE_SECS", 5, 65535) {
        settings.broker.keep_alive_secs = v;
    }

    // ── Camera / images ─────────────────────────────────────────────
    if let Some(v) = env.bool("PIMQTT_CAMERA_ENABLED") {
        settings.camera.enabled = v;
    }
    if let Some(v) = env.string("PIMQTT_IMAGE_DIR") {
        settings.images.dir = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("PIMQTT_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Process-environment lookup used by [`load_settings`].
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_settings(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "broker": {"port": 1883, "host": ""}
        });
        let source = serde_json::json!({
            "broker": {"host": "mqtt.local"}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["broker"]["port"], 1883);
        assert_eq!(merged["broker"]["host"], "mqtt.local");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"args": ["-n", "-o"]});
        let source = serde_json::json!({"args": ["-o"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["args"], serde_json::json!(["-o"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/settings.json");
        let settings = load_settings_from_path(path, no_env).unwrap();
        assert_eq!(settings.broker.port, 1883);
        assert!(settings.broker.host.is_empty());
    }

    #[test]
    fn load_partial_json_overrides() {
        let (_dir, path) = write_settings(
            r#"{"broker": {"host": "mqtt.local", "tls": true, "port": 8883}, "images": {"retentionSecs": 3600}}"#,
        );
        let settings = load_settings_from_path(&path, no_env).unwrap();
        assert_eq!(settings.broker.host, "mqtt.local");
        assert_eq!(settings.broker.port, 8883);
        assert!(settings.broker.tls);
        assert_eq!(settings.images.retention_secs, 3600);
        assert_eq!(settings.images.extension, "jpg");
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let (_dir, path) = write_settings("not valid json");
        assert_matches!(
            load_settings_from_path(&path, no_env),
            Err(SettingsError::Json(_))
        );
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let (_dir, path) = write_settings(r#"{"broker": {"port": "eighty"}}"#);
        assert_matches!(
            load_settings_from_path(&path, no_env),
            Err(SettingsError::Json(_))
        );
    }

    #[test]
    fn env_overrides_file() {
        let (_dir, path) = write_settings(r#"{"broker": {"host": "file-host"}}"#);
        let env = env_from(&[
            ("PIMQTT_HOST", "env-host"),
            ("PIMQTT_PORT", "8883"),
            ("PIMQTT_TLS", "yes"),
            ("PIMQTT_CAMERA_ENABLED", "off"),
        ]);
        let settings = load_settings_from_path(&path, env).unwrap();
        assert_eq!(settings.broker.host, "env-host");
        assert_eq!(settings.broker.port, 8883);
        assert!(settings.broker.tls);
        assert!(!settings.camera.enabled);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = PimqttSettings::default();
        let env = env_from(&[
            ("PIMQTT_PORT", "0"),
            ("PIMQTT_TLS", "maybe"),
            ("PIMQTT_KEEPALIVE_SECS", "1"),
            ("PIMQTT_HOST", ""),
        ]);
        apply_env_overrides(&mut settings, env);
        assert_eq!(settings.broker.port, 1883);
        assert!(!settings.broker.tls);
        assert_eq!(settings.broker.keep_alive_secs, 60);
        assert!(settings.broker.host.is_empty());
    }

    #[test]
    fn credentials_from_env() {
        let mut settings = PimqttSettings::default();
        let env = env_from(&[
            ("PIMQTT_AUTH", "true"),
            ("PIMQTT_USERNAME", "pi"),
            ("PIMQTT_PASSWORD", "raspberry"),
        ]);
        apply_env_overrides(&mut settings, env);
        assert!(settings.broker.auth);
        assert_eq!(settings.broker.username, "pi");
        assert_eq!(settings.broker.password, "raspberry");
    }

    // ── load_settings ───────────────────────────────────────────────

    #[test]
    fn explicit_missing_path_is_fatal() {
        let path = Path::new("/nonexistent/pimqtt.json");
        assert_matches!(
            load_settings(Some(path)),
            Err(SettingsError::NotFound(p)) if p == path
        );
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "Yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "FALSE", "No", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_u16_bounds() {
        assert_eq!(parse_u16_range("8883", 1, 65535), Some(8883));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("30", 5, 65535), Some(30));
        assert_eq!(parse_u64_range("4", 5, 65535), None);
        assert_eq!(parse_u64_range("", 5, 65535), None);
    }
}
