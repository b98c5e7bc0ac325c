//! Topic naming.
//!
//! Bases may be configured with or without a trailing `/`; leaves are
//! always joined with exactly one separator.

/// The fixed set of topics a session uses, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    command: String,
    response_base: String,
    camera_base: String,
    liveness: String,
}

impl Topics {
    /// Build the topic set. `node_id` selects the liveness leaf.
    pub fn new(
        command: impl Into<String>,
        response_base: &str,
        camera_base: &str,
        liveness_base: &str,
        node_id: &str,
    ) -> Self {
        Self {
            command: command.into(),
            response_base: trim_base(response_base).to_owned(),
            camera_base: trim_base(camera_base).to_owned(),
            liveness: join(liveness_base, node_id),
        }
    }

    /// The subscribed command topic.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// `<response-base>/<suffix>`.
    pub fn response(&self, suffix: &str) -> String {
        join(&self.response_base, suffix)
    }

    /// `<camera-base>/<filename>`.
    pub fn camera(&self, filename: &str) -> String {
        join(&self.camera_base, filename)
    }

    /// `<liveness-base>/<node-id>`.
    pub fn liveness(&self) -> &str {
        &self.liveness
    }
}

fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}

fn join(base: &str, leaf: &str) -> String {
    format!("{}/{}", trim_base(base), leaf.trim_start_matches('/'))
}

/// Whether a topic contains MQTT wildcard characters.
pub fn has_wildcard(topic: &str) -> bool {
    topic.contains('+') || topic.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new(
            "COMMAND/picamera",
            "SENSOR/picamera/status/",
            "SENSOR/picamera/data",
            "SENSOR/picamera/lwt",
            "raspberrypi",
        )
    }

    #[test]
    fn response_topic_appends_suffix() {
        assert_eq!(topics().response("status"), "SENSOR/picamera/status/status");
        assert_eq!(topics().response("ping"), "SENSOR/picamera/status/ping");
    }

    #[test]
    fn camera_topic_keyed_by_filename() {
        assert_eq!(
            topics().camera("20240101-120000.jpg"),
            "SENSOR/picamera/data/20240101-120000.jpg"
        );
    }

    #[test]
    fn liveness_topic_uses_node_id() {
        assert_eq!(topics().liveness(), "SENSOR/picamera/lwt/raspberrypi");
    }

    #[test]
    fn command_topic_is_verbatim() {
        assert_eq!(topics().command(), "COMMAND/picamera");
    }

    #[test]
    fn leading_slash_in_leaf_is_collapsed() {
        assert_eq!(topics().response("/reboot"), "SENSOR/picamera/status/reboot");
    }

    #[test]
    fn wildcard_detection() {
        assert!(has_wildcard("a/+/b"));
        assert!(has_wildcard("a/#"));
        assert!(!has_wildcard("a/b"));
    }
}
