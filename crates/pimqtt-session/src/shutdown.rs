//! Operator stop coordination via `CancellationToken`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default wait for the session task to finish after a stop request.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Signals the session to stop and waits for it to wind down.
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the cancellation token to hand to the session.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request a stop.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a stop has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request a stop and wait up to `timeout` for `handle`.
    ///
    /// Returns the task's output, or `None` if it panicked or had to be
    /// aborted after the timeout.
    pub async fn graceful_shutdown<T>(
        &self,
        mut handle: JoinHandle<T>,
        timeout: Option<Duration>,
    ) -> Option<T> {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        self.shutdown();
        info!(timeout_secs = timeout.as_secs(), "waiting for session to stop");

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(output)) => Some(output),
            Ok(Err(err)) => {
                warn!(error = %err, "session task failed during shutdown");
                None
            }
            Err(_elapsed) => {
                warn!("shutdown timed out after {timeout:?}, aborting session task");
                handle.abort();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_not_shutting_down() {
        assert!(!ShutdownCoordinator::new().is_shutting_down());
    }

    #[test]
    fn shutdown_is_idempotent_and_propagates() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_the_token() {
        let coord = ShutdownCoordinator::new();
        let signal_side = coord.clone();
        signal_side.shutdown();
        assert!(coord.is_shutting_down());
    }

    #[tokio::test]
    async fn graceful_shutdown_returns_task_output() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        let handle = tokio::spawn(async move {
            token.cancelled().await;
            "stopped"
        });
        assert_eq!(coord.graceful_shutdown(handle, None).await, Some("stopped"));
    }

    #[tokio::test]
    async fn graceful_shutdown_times_out() {
        let coord = ShutdownCoordinator::new();
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(300)).await;
        });
        let out = coord
            .graceful_shutdown(handle, Some(Duration::from_millis(50)))
            .await;
        assert!(out.is_none());
        assert!(coord.is_shutting_down());
    }
}
