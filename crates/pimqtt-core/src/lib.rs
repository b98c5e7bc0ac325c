//! # pimqtt-core
//!
//! Shared vocabulary for the pimqtt command daemon.
//!
//! - **Commands**: [`Command`] parsed from inbound payload text
//! - **Responses**: [`Response`] tagged union serialized to the legacy JSON shapes
//! - **Status report**: serializable types describing a system snapshot
//! - **Topics**: [`Topics`] naming for response, camera, and liveness channels
//! - **Formatting**: byte, frequency, percentage, and temperature renderers
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod command;
pub mod constants;
pub mod format;
pub mod logging;
pub mod response;
pub mod status;
pub mod topics;

pub use command::Command;
pub use response::{PhotoInfo, Response, StartupInfo};
pub use topics::Topics;
