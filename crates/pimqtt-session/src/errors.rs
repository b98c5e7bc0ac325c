//! Session, camera, and image cache errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::state::SessionState;

/// Errors that end (or prevent) a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// TLS was requested but the transport could not be configured.
    #[error("TLS setup failed: {0}")]
    Tls(String),
    /// The broker could not be reached or refused the connection.
    #[error("failed to connect to broker: {0}")]
    Connect(#[source] rumqttc::ConnectionError),
    /// An established connection dropped.
    #[error("connection to broker lost: {0}")]
    ConnectionLost(#[source] rumqttc::ConnectionError),
    /// The client request channel rejected a publish/subscribe.
    #[error("broker client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// A state change the session state machine does not allow.
    #[error("invalid session state transition: {from} -> {to}")]
    InvalidTransition {
        /// State before the attempted change.
        from: SessionState,
        /// Requested state.
        to: SessionState,
    },
}

/// Errors from a single photo capture.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The capture program could not be started.
    #[error("failed to start capture program: {0}")]
    Spawn(#[source] std::io::Error),
    /// The capture program did not finish in time.
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),
    /// The capture program exited unsuccessfully.
    #[error("capture program exited with {status}: {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The image file could not be prepared or read back.
    #[error("image file {}: {source}", path.display())]
    File {
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors scanning the image cache directory as a whole.
///
/// Per-file problems are logged and skipped; only an unreadable directory
/// surfaces here.
#[derive(Debug, Error)]
pub enum ImageCacheError {
    /// The directory listing failed.
    #[error("cannot read image directory {}: {source}", dir.display())]
    ReadDir {
        /// Directory scanned.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
