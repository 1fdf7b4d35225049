use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Acquisition strategy chosen by the camera selector.
///
/// `Undecided` is the only non-terminal value; once `Continuous` or `Polled`
/// is reached the selector never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    Undecided,
    Continuous,
    Polled,
}

impl CameraMode {
    pub fn is_decided(self) -> bool {
        self != CameraMode::Undecided
    }
}
