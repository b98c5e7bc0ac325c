//! Package-level constants.

/// Current version of the daemon (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "pimqtt";

/// Retained liveness payload while the session is connected.
pub const LIVENESS_ONLINE: &str = "Online";

/// Retained liveness payload once the session is gone (last-will).
pub const LIVENESS_OFFLINE: &str = "Offline";

/// Acknowledgment text published for `reboot`.
pub const REBOOT_PLACEHOLDER: &str = "not implemented";

/// Upper bound (exclusive) for the random client-id suffix.
pub const CLIENT_ID_SUFFIX_RANGE: u32 = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn name_is_lowercase() {
        assert_eq!(NAME, NAME.to_lowercase());
    }

    #[test]
    fn liveness_payloads_are_exact() {
        assert_eq!(LIVENESS_ONLINE, "Online");
        assert_eq!(LIVENESS_OFFLINE, "Offline");
    }
}
