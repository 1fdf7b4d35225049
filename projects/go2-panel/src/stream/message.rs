use serde_json::Value;

/// One inbound payload from the `/ws/logs` feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    LogEntry(String),
    GamepadEvent { connected: bool },
    RawText(String),
}

impl StreamMessage {
    /// Never fails: anything that is not a recognised envelope is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        // only objects carry an envelope; arrays and scalars stay raw
        let Ok(Value::Object(mut envelope)) = serde_json::from_str::<Value>(raw) else {
            return Self::RawText(raw.to_owned());
        };

        let data = envelope.remove("data");
        match envelope.get("type").and_then(Value::as_str) {
            Some("log") => Self::LogEntry(data_text(data)),
            Some("gamepad") => Self::GamepadEvent {
                connected: data.as_ref().and_then(Value::as_str) == Some("connected"),
            },
            _ => Self::RawText(raw.to_owned()),
        }
    }
}

fn data_text(data: Option<Value>) -> String {
    match data {
        None => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::StreamMessage;

    #[test]
    fn log_envelope_yields_data_field() {
        let message = StreamMessage::parse(r#"{"type":"log","data":"teleop started"}"#);
        assert_eq!(message, StreamMessage::LogEntry("teleop started".to_owned()));
    }

    #[test]
    fn gamepad_envelope_reports_connectivity() {
        assert_eq!(
            StreamMessage::parse(r#"{"type":"gamepad","data":"connected"}"#),
            StreamMessage::GamepadEvent { connected: true }
        );
        assert_eq!(
            StreamMessage::parse(r#"{"type":"gamepad","data":"disconnected"}"#),
            StreamMessage::GamepadEvent { connected: false }
        );
        assert_eq!(
            StreamMessage::parse(r#"{"type":"gamepad","data":true}"#),
            StreamMessage::GamepadEvent { connected: false }
        );
    }

    #[test]
    fn non_string_log_data_is_rendered_as_json() {
        let message = StreamMessage::parse(r#"{"type":"log","data":{"level":"info"}}"#);
        assert_eq!(
            message,
            StreamMessage::LogEntry(r#"{"level":"info"}"#.to_owned())
        );
        let missing = StreamMessage::parse(r#"{"type":"log"}"#);
        assert_eq!(missing, StreamMessage::LogEntry(String::new()));
    }

    #[test]
    fn explicit_null_log_data_is_shown() {
        let message = StreamMessage::parse(r#"{"type":"log","data":null}"#);
        assert_eq!(message, StreamMessage::LogEntry("null".to_owned()));
    }

    #[test]
    fn unknown_or_malformed_payloads_stay_raw() {
        for raw in [
            "2025-01-01 10:00:00 | INFO | plain loguru line",
            r#"{"type":"telemetry","data":"x"}"#,
            r#"{"data":"no type"}"#,
            "null",
            "42",
            r#"["log","smuggled"]"#,
            r#"["gamepad","connected"]"#,
            r#"{"type":7,"data":"x"}"#,
            r#"{"type":"log","data":"#,
            "",
        ] {
            assert_eq!(
                StreamMessage::parse(raw),
                StreamMessage::RawText(raw.to_owned()),
                "payload {raw:?}"
            );
        }
    }
}
