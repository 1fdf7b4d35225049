use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{api::models::BackendStatus, stream::connector::EventSink};

use super::log_buffer::LogBuffer;

#[derive(Default)]
struct PanelInner {
    logs: LogBuffer,
    gamepad: Option<bool>,
    backend: Option<BackendStatus>,
    camera_status: String,
    latest_frame: Option<Vec<u8>>,
}

/// Everything the operator sees: log tail, gamepad indicator, backend status,
/// camera status and the newest camera frame.
pub struct PanelView {
    inner: Mutex<PanelInner>,
    echo: bool,
}

impl PanelView {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PanelInner::default()),
            echo: false,
        }
    }

    /// Also prints every update to stdout.
    pub fn with_echo() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    fn inner(&self) -> MutexGuard<'_, PanelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.inner().logs.lines().map(str::to_owned).collect()
    }

    pub fn log_len(&self) -> usize {
        self.inner().logs.len()
    }

    pub fn gamepad(&self) -> Option<bool> {
        self.inner().gamepad
    }

    pub fn gamepad_label(&self) -> &'static str {
        match self.gamepad() {
            Some(true) => "Gamepad: connected",
            Some(false) => "Gamepad: not detected",
            None => "Gamepad: unknown",
        }
    }

    pub fn set_backend_status(&self, status: BackendStatus) {
        let summary = status.summary();
        let gamepad = status.gamepad_connected;
        let changed = {
            let mut inner = self.inner();
            let changed = inner.backend.as_ref() != Some(&status);
            inner.backend = Some(status);
            inner.gamepad = Some(gamepad);
            changed
        };
        if self.echo && changed {
            println!("{summary} | {}", self.gamepad_label());
        }
    }

    pub fn backend_summary(&self) -> Option<String> {
        self.inner().backend.as_ref().map(BackendStatus::summary)
    }

    pub fn set_camera_status(&self, text: &str) {
        self.inner().camera_status = text.to_owned();
        if self.echo {
            println!("[camera] {text}");
        }
    }

    pub fn camera_status(&self) -> String {
        self.inner().camera_status.clone()
    }

    pub fn set_latest_frame(&self, frame: Vec<u8>) {
        self.inner().latest_frame = Some(frame);
    }

    pub fn latest_frame(&self) -> Option<Vec<u8>> {
        self.inner().latest_frame.clone()
    }
}

impl Default for PanelView {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for PanelView {
    fn append_log(&self, line: &str) {
        self.inner().logs.push(line);
        if self.echo {
            println!("{line}");
        }
    }

    fn set_gamepad(&self, connected: bool) {
        self.inner().gamepad = Some(connected);
        if self.echo {
            println!("[{}]", self.gamepad_label());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{api::models::BackendStatus, stream::connector::EventSink};

    use super::PanelView;

    #[test]
    fn log_sink_is_bounded() {
        let view = PanelView::new();
        for n in 0..501 {
            view.append_log(&format!("line {n}"));
        }
        let lines = view.log_lines();
        assert_eq!(lines.len(), 500);
        assert_eq!(lines.first().map(String::as_str), Some("line 1"));
        assert_eq!(lines.last().map(String::as_str), Some("line 500"));
    }

    #[test]
    fn gamepad_indicator_follows_latest_report() {
        let view = PanelView::new();
        assert_eq!(view.gamepad_label(), "Gamepad: unknown");

        view.set_gamepad(true);
        assert_eq!(view.gamepad_label(), "Gamepad: connected");

        view.set_backend_status(BackendStatus {
            running: true,
            config: Some(json!({ "rate_hz": 50.0 })),
            gamepad_connected: false,
        });
        assert_eq!(view.gamepad_label(), "Gamepad: not detected");
        assert_eq!(
            view.backend_summary().as_deref(),
            Some("Status: running | Config: {\"rate_hz\":50.0}")
        );
    }

    #[test]
    fn camera_state_is_kept() {
        let view = PanelView::new();
        assert!(view.latest_frame().is_none());

        view.set_camera_status("continuous stream connected");
        view.set_latest_frame(vec![0xFF, 0xD8, 0xFF, 0xD9]);

        assert_eq!(view.camera_status(), "continuous stream connected");
        assert_eq!(view.latest_frame(), Some(vec![0xFF, 0xD8, 0xFF, 0xD9]));
    }
}
