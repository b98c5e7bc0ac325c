//! Camera, image cache, and command gating settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Still camera settings.
///
/// The camera is an external capture program invoked as
/// `<program> <args...> <output-path>`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraSettings {
    /// Whether `get-photo` may use the camera at all.
    pub enabled: bool,
    /// Capture program, looked up on `PATH` unless absolute.
    pub program: String,
    /// Arguments placed before the output path.
    pub args: Vec<String>,
    /// Upper bound for a single capture, in seconds.
    pub timeout_secs: u64,
}

impl CameraSettings {
    /// Capture timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "libcamera-still".to_string(),
            args: vec!["-n".to_string(), "-o".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Image cache directory settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSettings {
    /// Directory holding captured images.
    pub dir: String,
    /// File extension of captured images, without the dot.
    pub extension: String,
    /// `flush-images` keeps files younger than this many seconds (0 keeps none).
    pub retention_secs: u64,
    /// Report what `flush-images` would delete without deleting.
    pub dry_run: bool,
}

impl ImageSettings {
    /// Image directory as a path.
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    /// Retention window as a [`Duration`].
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            dir: "/tmp/picmqtt".to_string(),
            extension: "jpg".to_string(),
            retention_secs: 0,
            dry_run: false,
        }
    }
}

/// Command gating.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandSettings {
    /// Honor the `die` command (abort the process). Off by default.
    pub allow_die: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_defaults() {
        let c = CameraSettings::default();
        assert!(c.enabled);
        assert_eq!(c.program, "libcamera-still");
        assert_eq!(c.args, vec!["-n", "-o"]);
        assert_eq!(c.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn image_defaults() {
        let i = ImageSettings::default();
        assert_eq!(i.dir_path(), PathBuf::from("/tmp/picmqtt"));
        assert_eq!(i.extension, "jpg");
        assert_eq!(i.retention(), Duration::ZERO);
        assert!(!i.dry_run);
    }

    #[test]
    fn die_is_disabled_by_default() {
        assert!(!CommandSettings::default().allow_die);
    }
}
