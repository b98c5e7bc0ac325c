//! Typed responses and their wire shapes.
//!
//! Every response is a single-key JSON object named after the command that
//! produced it, except [`Response::Unknown`], which is an empty object. The
//! variant also decides the topic suffix under the response base.

use serde::Serialize;
use serde_json::{Value, json};

use crate::constants::REBOOT_PLACEHOLDER;
use crate::status::StatusReport;

/// Topic suffix for the startup announcement.
pub const STARTUP_SUFFIX: &str = "startup";

/// Topic suffix for unrecognized commands.
pub const UNKNOWN_SUFFIX: &str = "unknown";

/// Announcement published once after the session connects.
#[derive(Clone, Debug, Serialize)]
pub struct StartupInfo {
    /// MQTT client identifier in use.
    pub client_id: String,
    /// Node identifier used for the liveness topic.
    pub node_id: String,
    /// Daemon version.
    pub version: String,
    /// Connection time, RFC 3339.
    pub started_at: String,
    /// Whether `get-photo` can capture.
    pub camera: bool,
}

/// Description of a captured photo.
#[derive(Clone, Debug, Serialize)]
pub struct PhotoInfo {
    /// File name within the image directory.
    pub file_name: String,
    /// Absolute path of the file.
    pub file_path: String,
    /// Exact size in bytes of the published payload.
    pub file_size: u64,
    /// Size rendered with binary units.
    pub file_size_human: String,
    /// Camera topic the bytes were published on.
    pub topic: String,
    /// Capture time, RFC 3339.
    pub captured_at: String,
}

/// Outcome of one command, ready to be published.
#[derive(Clone, Debug)]
pub enum Response {
    /// Startup announcement.
    Startup(StartupInfo),
    /// Reply to `ping`.
    Pong,
    /// A captured photo.
    Photo(PhotoInfo),
    /// Camera capability disabled or unavailable.
    PhotoDisabled,
    /// Capture was attempted and failed.
    PhotoFailed {
        /// Failure description.
        error: String,
    },
    /// System snapshot.
    Status(Box<StatusReport>),
    /// Reboot placeholder acknowledgment.
    Reboot,
    /// Image cache cleanup result.
    ImagesFlushed {
        /// File names removed (or selected, in dry-run mode).
        deleted_files: Vec<String>,
    },
    /// Unrecognized command.
    Unknown,
}

impl Response {
    /// Suffix appended to the response base topic.
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            Self::Startup(_) => STARTUP_SUFFIX,
            Self::Pong => "ping",
            Self::Photo(_) | Self::PhotoDisabled | Self::PhotoFailed { .. } => "get-photo",
            Self::Status(_) => "status",
            Self::Reboot => "reboot",
            Self::ImagesFlushed { .. } => "flush-images",
            Self::Unknown => UNKNOWN_SUFFIX,
        }
    }

    /// JSON payload.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Startup(info) => json!({ "startup": info }),
            Self::Pong => json!({ "ping": "pong" }),
            Self::Photo(info) => json!({ "get-photo": info }),
            Self::PhotoDisabled => json!({ "get-photo": "disabled" }),
            Self::PhotoFailed { error } => json!({ "get-photo": { "error": error } }),
            Self::Status(report) => json!({ "status": report }),
            Self::Reboot => json!({ "reboot": REBOOT_PLACEHOLDER }),
            Self::ImagesFlushed { deleted_files } => {
                json!({ "flush-images": { "deleted_files": deleted_files } })
            }
            Self::Unknown => json!({}),
        }
    }

    /// Serialized UTF-8 payload bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
