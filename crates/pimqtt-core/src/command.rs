//! Inbound command parsing.
//!
//! Commands arrive as plain payload text on the command topic. Matching is
//! exact and case-sensitive; surrounding whitespace is significant, so
//! `" ping"` is an unknown command rather than a ping.

use std::fmt;

/// A request received on the command topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Liveness probe, answered with `pong`.
    Ping,
    /// Capture one still image and publish it.
    GetPhoto,
    /// Gather a live system snapshot.
    Status,
    /// Reboot request (acknowledged only).
    Reboot,
    /// Clean up the image cache directory.
    FlushImages,
    /// Abort the process without a graceful disconnect.
    Die,
    /// Anything else; carries the raw text for logging.
    Unknown(String),
}

impl Command {
    /// Parse payload text into a command. Never fails.
    pub fn parse(text: &str) -> Self {
        match text {
            "ping" => Self::Ping,
            "get-photo" => Self::GetPhoto,
            "status" => Self::Status,
            "reboot" => Self::Reboot,
            "flush-images" => Self::FlushImages,
            "die" => Self::Die,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// Wire name of the command, also used as the response topic suffix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::GetPhoto => "get-photo",
            Self::Status => "status",
            Self::Reboot => "reboot",
            Self::FlushImages => "flush-images",
            Self::Die => "die",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "unknown({raw:?})"),
            other => f.write_str(other.name()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
