//! Broker connection settings.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Broker connection settings. Immutable after load.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerSettings {
    /// Broker host name or address. Required.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Wrap the transport in TLS before connecting.
    pub tls: bool,
    /// PEM CA bundle for TLS; system roots when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,
    /// Authenticate with `username`/`password`.
    pub auth: bool,
    /// Username, required when `auth` is set.
    pub username: String,
    /// Password.
    pub password: String,
    /// MQTT keepalive interval in seconds.
    pub keep_alive_secs: u64,
    /// Client-id prefix; the host name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id_prefix: Option<String>,
    /// Largest MQTT packet sent or accepted, in bytes. Bounds photo payloads.
    pub max_packet_bytes: usize,
}

impl BrokerSettings {
    /// Keepalive as a [`Duration`].
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            tls: false,
            ca_file: None,
            auth: false,
            username: String::new(),
            password: String::new(),
            keep_alive_secs: 60,
            client_id_prefix: None,
            max_packet_bytes: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("ca_file", &self.ca_file)
            .field("auth", &self.auth)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("client_id_prefix", &self.client_id_prefix)
            .field("max_packet_bytes", &self.max_packet_bytes)
            .finish()
    }
}
