//! Image cache directory: photo naming and `flush-images` cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use pimqtt_settings::ImageSettings;
use tracing::{debug, warn};

use crate::errors::ImageCacheError;

/// Timestamp pattern for photo file names (millisecond resolution).
pub const PHOTO_NAME_PATTERN: &str = "%Y%m%d-%H%M%S-%3f";

/// The directory captured images are written to and flushed from.
#[derive(Clone, Debug)]
pub struct ImageCache {
    dir: PathBuf,
    extension: String,
    retention: Duration,
    dry_run: bool,
}

impl ImageCache {
    /// Build a cache rooted at `dir` for files ending in `.extension`.
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_owned(),
            retention: Duration::ZERO,
            dry_run: false,
        }
    }

    /// Keep files younger than `retention` when flushing.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Report flush candidates without deleting them.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Build from settings.
    pub fn from_settings(settings: &ImageSettings) -> Self {
        Self::new(settings.dir_path(), &settings.extension)
            .with_retention(settings.retention())
            .with_dry_run(settings.dry_run)
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a photo taken at `at`.
    pub fn photo_name(&self, at: DateTime<Local>) -> String {
        format!("{}.{}", at.format(PHOTO_NAME_PATTERN), self.extension)
    }

    /// Create the directory and return the full path for a new photo.
    pub fn prepare_photo(&self, at: DateTime<Local>) -> std::io::Result<(String, PathBuf)> {
        std::fs::create_dir_all(&self.dir)?;
        let name = self.photo_name(at);
        let path = self.dir.join(&name);
        Ok((name, path))
    }

    /// Whether `path` carries the image extension (exact, case-sensitive).
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    /// Remove image files older than the retention window.
    ///
    /// Only regular files directly inside the directory whose extension
    /// matches are considered. A missing directory flushes nothing. A file
    /// that cannot be inspected or removed is logged and skipped. Returns
    /// the sorted names of removed files (or of the files that would be
    /// removed in dry-run mode).
    pub fn flush(&self, now: SystemTime) -> Result<Vec<String>, ImageCacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "image directory missing, nothing to flush");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(ImageCacheError::ReadDir {
                    dir: self.dir.clone(),
                    source,
                });
            }
        };

        let mut flushed = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %self.dir.display(), error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !self.is_image(&path) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping image without metadata");
                    continue;
                }
            };
            if !metadata.is_file() || !self.expired(metadata.modified().ok(), now) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                continue;
            };
            if !self.dry_run {
                if let Err(err) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %err, "failed to delete image");
                    continue;
                }
            }
            flushed.push(name);
        }
        flushed.sort();
        Ok(flushed)
    }

    fn expired(&self, modified: Option<SystemTime>, now: SystemTime) -> bool {
        if self.retention.is_zero() {
            return true;
        }
        // An unknown or future mtime counts as fresh.
        modified
            .and_then(|m| now.duration_since(m).ok())
            .is_some_and(|age| age >= self.retention)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
