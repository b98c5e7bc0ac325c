//! Command dispatch: payload text → [`Command`] → handler → [`Response`].

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::Local;
use pimqtt_core::format::format_bytes;
use pimqtt_core::{Command, PhotoInfo, Response, Topics};
use tracing::{debug, info, instrument, warn};

use crate::camera::Camera;
use crate::errors::{CameraError, SessionError};
use crate::images::ImageCache;
use crate::publisher::Publisher;
use crate::status::StatusCollector;

/// What happened to one incoming command message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command ran and its response was published.
    Responded(Command),
    /// The payload was not text; nothing was published.
    Dropped,
    /// `die` was received and is allowed: the caller must abort.
    Abort,
}

/// Routes commands to their handlers and publishes the responses.
pub struct CommandDispatcher {
    topics: Topics,
    camera: Option<Arc<dyn Camera>>,
    images: ImageCache,
    status: StatusCollector,
    allow_die: bool,
}

impl CommandDispatcher {
    /// Commands slower than this are logged at `warn`.
    const SLOW_COMMAND: Duration = Duration::from_secs(5);

    /// Build a dispatcher. `camera` is the capability resolved at startup.
    pub fn new(topics: Topics, camera: Option<Arc<dyn Camera>>, images: ImageCache) -> Self {
        Self {
            topics,
            camera,
            images,
            status: StatusCollector::new(),
            allow_die: false,
        }
    }

    /// Replace the status collector.
    #[must_use]
    pub fn with_status_collector(mut self, status: StatusCollector) -> Self {
        self.status = status;
        self
    }

    /// Honor the `die` command instead of treating it as unknown.
    #[must_use]
    pub fn with_allow_die(mut self, allow_die: bool) -> Self {
        self.allow_die = allow_die;
        self
    }

    /// Topics in use.
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Whether `get-photo` can capture.
    pub fn camera_enabled(&self) -> bool {
        self.camera.is_some()
    }

    /// Handle one command payload to completion.
    ///
    /// Only a failed publish is an error; handler problems become
    /// well-formed responses.
    pub async fn dispatch(
        &self,
        payload: &[u8],
        publisher: &dyn Publisher,
    ) -> Result<DispatchOutcome, SessionError> {
        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(err) => {
                warn!(len = payload.len(), error = %err, "dropping non-text command payload");
                return Ok(DispatchOutcome::Dropped);
            }
        };
        let command = Command::parse(text);
        if command == Command::Die && self.allow_die {
            warn!("die command received, aborting");
            return Ok(DispatchOutcome::Abort);
        }

        let start = Instant::now();
        let response = self.handle(&command, publisher).await?;
        self.respond(&response, publisher).await?;

        let elapsed = start.elapsed();
        if elapsed >= Self::SLOW_COMMAND {
            warn!(command = %command, duration_secs = elapsed.as_secs_f64(), "slow command");
        }
        Ok(DispatchOutcome::Responded(command))
    }

    /// Publish `response` on its response topic.
    pub async fn respond(
        &self,
        response: &Response,
        publisher: &dyn Publisher,
    ) -> Result<(), SessionError> {
        let topic = self.topics.response(response.topic_suffix());
        debug!(topic, "publishing response");
        publisher.publish(&topic, response.to_bytes(), false).await
    }

    #[instrument(skip_all, fields(command = %command))]
    async fn handle(
        &self,
        command: &Command,
        publisher: &dyn Publisher,
    ) -> Result<Response, SessionError> {
        let response = match command {
            Command::Ping => Response::Pong,
            Command::GetPhoto => self.get_photo(publisher).await?,
            Command::Status => Response::Status(Box::new(self.status.collect().await)),
            Command::Reboot => {
                info!("reboot requested, not implemented");
                Response::Reboot
            }
            Command::FlushImages => self.flush_images(),
            Command::Die | Command::Unknown(_) => {
                info!("unknown command");
                Response::Unknown
            }
        };
        Ok(response)
    }

    async fn get_photo(&self, publisher: &dyn Publisher) -> Result<Response, SessionError> {
        let Some(camera) = &self.camera else {
            debug!("camera unavailable");
            return Ok(Response::PhotoDisabled);
        };
        let captured_at = Local::now();
        let (file_name, path) = match self.images.prepare_photo(captured_at) {
            Ok(prepared) => prepared,
            Err(source) => {
                return Ok(photo_failed(&CameraError::File {
                    path: self.images.dir().to_path_buf(),
                    source,
                }));
            }
        };
        let bytes = match capture_bytes(camera.as_ref(), &path).await {
            Ok(bytes) => bytes,
            Err(err) => return Ok(photo_failed(&err)),
        };

        let topic = self.topics.camera(&file_name);
        let file_size = bytes.len() as u64;
        publisher.publish(&topic, bytes, false).await?;
        info!(file_name, file_size, topic, "photo published");

        Ok(Response::Photo(PhotoInfo {
            file_path: absolute(&path),
            file_name,
            file_size,
            file_size_human: format_bytes(file_size),
            topic,
            captured_at: captured_at.to_rfc3339(),
        }))
    }

    fn flush_images(&self) -> Response {
        let deleted_files = match self.images.flush(SystemTime::now()) {
            Ok(files) => files,
            Err(err) => {
                warn!(error = %err, "image flush failed");
                Vec::new()
            }
        };
        info!(count = deleted_files.len(), "images flushed");
        Response::ImagesFlushed { deleted_files }
    }
}

async fn capture_bytes(camera: &dyn Camera, path: &Path) -> Result<Vec<u8>, CameraError> {
    camera.capture(path).await?;
    tokio::fs::read(path).await.map_err(|source| CameraError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn photo_failed(err: &CameraError) -> Response {
    warn!(error = %err, "photo capture failed");
    Response::PhotoFailed {
        error: err.to_string(),
    }
}

fn absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::publisher::test_support::RecordingPublisher;

    const FRAME: &[u8] = b"\xff\xd8jpeg-frame\xff\xd9";

    struct FakeCamera;

    #[async_trait]
    impl Camera for FakeCamera {
        async fn capture(&self, path: &Path) -> Result<(), CameraError> {
            std::fs::write(path, FRAME).map_err(|source| CameraError::File {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    struct BrokenCamera;

    #[async_trait]
    impl Camera for BrokenCamera {
        async fn capture(&self, _path: &Path) -> Result<(), CameraError> {
            Err(CameraError::Timeout(Duration::from_secs(30)))
        }
    }

    fn topics() -> Topics {
        Topics::new("cmd", "resp", "cam", "lwt", "rpi")
    }

    fn dispatcher(dir: &Path, camera: Option<Arc<dyn Camera>>) -> CommandDispatcher {
        CommandDispatcher::new(topics(), camera, ImageCache::new(dir, "jpg"))
            .with_status_collector(StatusCollector::with_sample_window(Duration::from_millis(10)))
    }

    // ── Simple commands ──

    #[tokio::test]
    async fn ping_publishes_pong() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let outcome = dispatcher(dir.path(), None)
            .dispatch(b"ping", &publisher)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Responded(Command::Ping));

        let published = publisher.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "resp/ping");
        assert_eq!(published[0].json(), json!({"ping": "pong"}));
        assert!(!published[0].retain);
    }

    #[tokio::test]
    async fn reboot_is_acknowledged() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(dir.path(), None)
            .dispatch(b"reboot", &publisher)
            .await
            .unwrap();
        let published = publisher.take();
        assert_eq!(published[0].topic, "resp/reboot");
        assert!(published[0].json()["reboot"].is_string());
    }

    #[tokio::test]
    async fn unknown_command_gets_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let outcome = dispatcher(dir.path(), None)
            .dispatch(b"make-coffee", &publisher)
            .await
            .unwrap();
        assert_matches!(outcome, DispatchOutcome::Responded(Command::Unknown(ref t)) if t == "make-coffee");
        let published = publisher.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "resp/unknown");
        assert_eq!(published[0].json(), json!({}));
    }

    #[tokio::test]
    async fn non_text_payload_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let outcome = dispatcher(dir.path(), None)
            .dispatch(&[0xff, 0xfe, 0x00], &publisher)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(publisher.take().is_empty());
    }

    // ── die ──

    #[tokio::test]
    async fn die_is_unknown_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let outcome = dispatcher(dir.path(), None)
            .dispatch(b"die", &publisher)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Responded(Command::Die));
        assert_eq!(publisher.take()[0].topic, "resp/unknown");
    }

    #[tokio::test]
    async fn allowed_die_aborts_without_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let outcome = dispatcher(dir.path(), None)
            .with_allow_die(true)
            .dispatch(b"die", &publisher)
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Abort);
        assert!(publisher.take().is_empty());
    }

    // ── get-photo ──

    #[tokio::test]
    async fn photo_disabled_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let image_dir = root.path().join("images");
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(&image_dir, None)
            .dispatch(b"get-photo", &publisher)
            .await
            .unwrap();

        let published = publisher.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "resp/get-photo");
        assert_eq!(published[0].json(), json!({"get-photo": "disabled"}));
        assert!(!image_dir.exists());
    }

    #[tokio::test]
    async fn photo_bytes_then_description() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let d = dispatcher(dir.path(), Some(Arc::new(FakeCamera)));
        assert!(d.camera_enabled());
        let _ = d.dispatch(b"get-photo", &publisher).await.unwrap();

        let published = publisher.take();
        assert_eq!(published.len(), 2);
        let (image, response) = (&published[0], &published[1]);
        assert!(image.topic.starts_with("cam/"));
        assert!(image.topic.ends_with(".jpg"));
        assert_eq!(image.payload, FRAME);
        assert!(!image.retain);

        assert_eq!(response.topic, "resp/get-photo");
        let info = &response.json()["get-photo"];
        assert_eq!(info["file_size"], FRAME.len());
        assert_eq!(info["topic"], image.topic.as_str());
        assert_eq!(info["file_size_human"], format_bytes(FRAME.len() as u64));
        let file_path = info["file_path"].as_str().unwrap();
        assert!(Path::new(file_path).is_absolute());
        assert!(Path::new(file_path).exists());
    }

    #[tokio::test]
    async fn photo_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(dir.path(), Some(Arc::new(BrokenCamera)))
            .dispatch(b"get-photo", &publisher)
            .await
            .unwrap();

        let published = publisher.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "resp/get-photo");
        let error = published[0].json()["get-photo"]["error"].clone();
        assert!(error.as_str().unwrap().contains("timed out"));
    }

    // ── flush-images ──

    #[tokio::test]
    async fn flush_reports_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("1.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(dir.path(), None)
            .dispatch(b"flush-images", &publisher)
            .await
            .unwrap();

        let published = publisher.take();
        assert_eq!(published[0].topic, "resp/flush-images");
        assert_eq!(
            published[0].json(),
            json!({"flush-images": {"deleted_files": ["1.jpg", "2.jpg"]}})
        );
        assert!(dir.path().join("keep.txt").exists());
    }

    #[tokio::test]
    async fn flush_missing_dir_reports_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(&dir.path().join("nope"), None)
            .dispatch(b"flush-images", &publisher)
            .await
            .unwrap();
        assert_eq!(
            publisher.take()[0].json(),
            json!({"flush-images": {"deleted_files": []}})
        );
    }

    // ── status ──

    #[tokio::test]
    async fn status_has_core_sections() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = RecordingPublisher::default();
        let _ = dispatcher(dir.path(), None)
            .dispatch(b"status", &publisher)
            .await
            .unwrap();
        let published = publisher.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "resp/status");
        let status = &published[0].json()["status"];
        for key in ["system", "cpu", "memory", "disk", "net"] {
            assert!(status.get(key).is_some(), "missing {key}");
        }
    }
}
