//! # pimqtt-session
//!
//! The command session: one broker connection, one command topic, one
//! response per command.
//!
//! - [`session::CommandSession`]: connection lifecycle, liveness marker, receive loop
//! - [`dispatcher::CommandDispatcher`]: command → handler → [`pimqtt_core::Response`]
//! - [`publisher::Publisher`]: the publish seam (rumqttc client in production)
//! - [`camera`]: still-capture capability resolved once at startup
//! - [`images::ImageCache`]: photo naming and `flush-images` cleanup
//! - [`status::StatusCollector`]: system snapshot via `sysinfo`
//! - [`shutdown::ShutdownCoordinator`]: operator stop via `CancellationToken`
//!
//! Commands are processed strictly one at a time, in arrival order, on the
//! task that polls the MQTT event loop.

#![deny(unsafe_code)]

pub mod camera;
pub mod dispatcher;
pub mod errors;
pub mod identity;
pub mod images;
pub mod publisher;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod status;

pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use errors::{CameraError, ImageCacheError, SessionError};
pub use publisher::Publisher;
pub use session::CommandSession;
pub use shutdown::ShutdownCoordinator;
pub use state::SessionState;
