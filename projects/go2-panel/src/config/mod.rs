use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use url::Url;

use crate::{
    camera::selector::{CameraEndpoints, CameraTiming},
    stream::{policy::ReconnectPolicy, stream_url},
};

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub base_url: Url,
    pub stream_retry: Duration,
    pub stream_max_retries: Option<u32>,
    pub camera_decision_timeout: Duration,
    pub camera_poll_interval: Duration,
    pub status_poll_interval: Duration,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
    pub snapshot_path: Option<PathBuf>,
}

fn positive_u64(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

impl PanelConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let raw_base =
            env::var("PANEL_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_owned());
        let base_url = Url::parse(raw_base.trim())
            .with_context(|| format!("PANEL_BASE_URL is not a valid url: {raw_base}"))?;

        let stream_retry = env::var("STREAM_RETRY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(2000));
        let stream_max_retries = env::var("STREAM_MAX_RETRIES")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok());

        let camera_decision_timeout = Duration::from_millis(
            positive_u64("CAMERA_DECISION_TIMEOUT_MS").unwrap_or(1500),
        );
        let camera_poll_interval =
            Duration::from_millis(positive_u64("CAMERA_POLL_INTERVAL_MS").unwrap_or(250));
        let status_poll_interval =
            Duration::from_secs(positive_u64("STATUS_POLL_SECONDS").unwrap_or(5));
        let request_timeout =
            Duration::from_secs(positive_u64("REQUEST_TIMEOUT_SECONDS").unwrap_or(10));

        let log_dir = env::var("LOG_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "logs".to_owned());
        let snapshot_path = match env::var("SNAPSHOT_PATH") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => Some(PathBuf::from("snapshots/latest.jpg")),
        };

        Ok(Self {
            base_url,
            stream_retry,
            stream_max_retries,
            camera_decision_timeout,
            camera_poll_interval,
            status_poll_interval,
            request_timeout,
            log_dir: PathBuf::from(log_dir),
            snapshot_path,
        })
    }

    pub fn stream_url(&self) -> anyhow::Result<Url> {
        stream_url(&self.base_url)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let policy = ReconnectPolicy::fixed(self.stream_retry);
        match self.stream_max_retries {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }

    pub fn camera_timing(&self) -> CameraTiming {
        CameraTiming {
            decision_timeout: self.camera_decision_timeout,
            poll_interval: self.camera_poll_interval,
        }
    }

    pub fn camera_endpoints(&self) -> anyhow::Result<CameraEndpoints> {
        Ok(CameraEndpoints::from_base(&self.base_url)?)
    }
}
