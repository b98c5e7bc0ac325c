//! Node and client identifiers.

use pimqtt_core::constants::{CLIENT_ID_SUFFIX_RANGE, NAME};
use rand::Rng;
use sysinfo::System;

/// Stable node identifier: the host name with MQTT topic metacharacters
/// replaced, or the package name when the host name is unknown.
pub fn node_id() -> String {
    sanitize_node_id(System::host_name().as_deref())
}

/// Client identifier `<prefix or node id>-<random>`.
pub fn client_id(prefix: Option<&str>, node_id: &str) -> String {
    let suffix = rand::rng().random_range(0..CLIENT_ID_SUFFIX_RANGE);
    client_id_with_suffix(prefix, node_id, suffix)
}

fn client_id_with_suffix(prefix: Option<&str>, node_id: &str, suffix: u32) -> String {
    let base = prefix.map(str::trim).filter(|p| !p.is_empty()).unwrap_or(node_id);
    format!("{base}-{suffix}")
}

fn sanitize_node_id(host_name: Option<&str>) -> String {
    let cleaned: String = host_name
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '+' | '#') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        NAME.to_owned()
    } else {
        cleaned
    }
}
