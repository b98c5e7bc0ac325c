//! Still camera capability.
//!
//! The camera is an external capture program. Whether it can be used is
//! decided once, at startup, by [`probe`]: the camera must be enabled in
//! settings and its program must be found. The result is never re-probed;
//! a capture that fails later is reported per command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pimqtt_settings::CameraSettings;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::CameraError;

/// Captures a single still image to a file.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Write one frame to `path`.
    async fn capture(&self, path: &Path) -> Result<(), CameraError>;
}

/// Camera backed by a capture program invoked as `<program> <args...> <path>`.
#[derive(Clone, Debug)]
pub struct CommandCamera {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCamera {
    /// Build from a resolved program path.
    pub fn new(program: PathBuf, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }
}

#[async_trait]
impl Camera for CommandCamera {
    async fn capture(&self, path: &Path) -> Result<(), CameraError> {
        debug!(program = %self.program.display(), path = %path.display(), "capturing still");
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CameraError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CameraError::Timeout(self.timeout))?
            .map_err(CameraError::Spawn)?;

        if !output.status.success() {
            return Err(CameraError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

/// Resolve the camera capability from settings and the process `PATH`.
pub fn probe(settings: &CameraSettings) -> Option<Arc<dyn Camera>> {
    probe_with_path(settings, std::env::var_os("PATH"))
}

/// [`probe`] with an explicit search path.
pub fn probe_with_path(
    settings: &CameraSettings,
    search_path: Option<OsString>,
) -> Option<Arc<dyn Camera>> {
    if !settings.enabled {
        info!("camera disabled in settings");
        return None;
    }
    let Some(program) = find_program(&settings.program, search_path) else {
        warn!(program = %settings.program, "camera program not found, get-photo disabled");
        return None;
    };
    info!(program = %program.display(), "camera available");
    Some(Arc::new(CommandCamera::new(
        program,
        settings.args.clone(),
        settings.timeout(),
    )))
}

/// Locate `program`: used as-is when it contains a path separator,
/// otherwise searched in each `search_path` entry.
pub fn find_program(program: &str, search_path: Option<OsString>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let search_path = search_path?;
    std::env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn settings(program: &str) -> CameraSettings {
        CameraSettings {
            enabled: true,
            program: program.to_owned(),
            args: Vec::new(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn disabled_camera_is_unavailable() {
        let mut s = settings("sh");
        s.enabled = false;
        assert!(probe_with_path(&s, std::env::var_os("PATH")).is_none());
    }

    #[test]
    fn missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings("definitely-not-a-camera");
        assert!(probe_with_path(&s, Some(dir.path().as_os_str().to_owned())).is_none());
    }

    #[test]
    fn program_found_on_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("fake-still");
        std::fs::write(&program, "").unwrap();
        let found = find_program("fake-still", Some(dir.path().as_os_str().to_owned()));
        assert_eq!(found, Some(program));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("cam");
        assert!(find_program(program.to_str().unwrap(), None).is_none());
        std::fs::write(&program, "").unwrap();
        assert_eq!(find_program(program.to_str().unwrap(), None), Some(program));
    }

    #[test]
    fn empty_program_never_found() {
        assert!(find_program("", std::env::var_os("PATH")).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_camera_runs_program_with_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("shot.jpg");
        // `sh -c 'printf frame > "$0"' <path>`: the output path lands in $0.
        let camera = CommandCamera::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".into(), "printf frame > \"$0\"".into()],
            Duration::from_secs(5),
        );
        camera.capture(&out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"frame");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_camera_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let camera = CommandCamera::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".into(), "echo 'no cameras available' >&2; exit 3".into()],
            Duration::from_secs(5),
        );
        let err = camera.capture(&dir.path().join("x.jpg")).await.unwrap_err();
        assert_matches!(err, CameraError::Failed { stderr, .. } if stderr == "no cameras available");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_camera_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let camera = CommandCamera::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".into(), "sleep 5".into()],
            Duration::from_millis(50),
        );
        let err = camera.capture(&dir.path().join("x.jpg")).await.unwrap_err();
        assert_matches!(err, CameraError::Timeout(_));
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let camera = CommandCamera::new(
            PathBuf::from("/nonexistent/camera"),
            Vec::new(),
            Duration::from_secs(1),
        );
        let err = camera.capture(Path::new("/tmp/x.jpg")).await.unwrap_err();
        assert_matches!(err, CameraError::Spawn(_));
    }
}
