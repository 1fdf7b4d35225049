use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot returned by `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BackendStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub gamepad_connected: bool,
}

impl BackendStatus {
    pub fn summary(&self) -> String {
        let running = if self.running { "running" } else { "stopped" };
        let config = match &self.config {
            Some(Value::Null) | None => "—".to_owned(),
            Some(value) => value.to_string(),
        };
        format!("Status: {running} | Config: {config}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMethod {
    #[default]
    LocalSta,
    LocalAp,
    Remote,
}

impl ConnectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalSta => "localsta",
            Self::LocalAp => "localap",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised names fall back to `LocalSta`, the backend's own default.
impl FromStr for ConnectionMethod {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let method = match value.trim().to_lowercase().as_str() {
            "localap" | "ap" => Self::LocalAp,
            "remote" | "cloud" => Self::Remote,
            _ => Self::LocalSta,
        };
        Ok(method)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectRequest {
    pub method: ConnectionMethod,
    pub ip: Option<String>,
}

impl ConnectRequest {
    pub fn new(method: ConnectionMethod, ip: Option<String>) -> Self {
        let ip = ip
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Self { method, ip }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<'a> {
    pub cmd: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoveRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YawRequest {
    pub wz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestMoveRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub duration_ms: u64,
}

/// Partial update for the backend teleop settings; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadzone: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_z: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_method: Option<ConnectionMethod>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SettingsResponse {
    #[serde(default)]
    pub settings: Value,
}
