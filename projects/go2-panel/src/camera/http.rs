use std::{
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::panel::view::PanelView;

use super::{
    frames::MjpegFrameExtractor,
    traits::{CameraProbe, CameraSurface},
};

/// Probe that counts as loaded once the first complete JPEG arrives.
pub struct HttpCameraProbe {
    client: Client,
}

impl HttpCameraProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CameraProbe for HttpCameraProbe {
    async fn probe(&self, url: &Url) -> Result<()> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("camera probe request failed")?;
        if !response.status().is_success() {
            bail!("camera probe returned {}", response.status());
        }

        let mut body = response.bytes_stream();
        let mut extractor = MjpegFrameExtractor::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("camera probe body failed")?;
            if extractor.feed(&chunk).is_some() {
                return Ok(());
            }
        }
        bail!("camera probe ended before a complete frame")
    }
}

/// Camera surface that keeps the newest frame in the panel view and, when
/// configured, mirrors it to a file on disk.
pub struct FrameRecorder {
    client: Client,
    view: Arc<PanelView>,
    snapshot_path: Option<PathBuf>,
    frame_timeout: Duration,
    stream_task: Mutex<Option<JoinHandle<()>>>,
    frame_task: Mutex<Option<JoinHandle<()>>>,
}

impl FrameRecorder {
    pub fn new(
        client: Client,
        view: Arc<PanelView>,
        snapshot_path: Option<PathBuf>,
        frame_timeout: Duration,
    ) -> Self {
        Self {
            client,
            view,
            snapshot_path,
            frame_timeout,
            stream_task: Mutex::new(None),
            frame_task: Mutex::new(None),
        }
    }

    fn replace_task(slot: &Mutex<Option<JoinHandle<()>>>, task: JoinHandle<()>) {
        let previous = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl CameraSurface for FrameRecorder {
    fn set_status(&self, text: &str) {
        self.view.set_camera_status(text);
    }

    fn bind_stream(&self, url: Url) {
        let client = self.client.clone();
        let sink = FrameSink::new(self.view.clone(), self.snapshot_path.clone());
        let task = tokio::spawn(async move {
            if let Err(err) = read_stream(&client, &url, &sink).await {
                warn!("camera stream stopped: {err:#}");
            }
        });
        Self::replace_task(&self.stream_task, task);
    }

    /// A newer frame request cancels one still in flight.
    fn show_frame(&self, url: Url) {
        let client = self.client.clone();
        let sink = FrameSink::new(self.view.clone(), self.snapshot_path.clone());
        let frame_timeout = self.frame_timeout;
        let task = tokio::spawn(async move {
            if let Err(err) = fetch_frame(&client, &url, frame_timeout, &sink).await {
                warn!("camera frame fetch failed: {err:#}");
            }
        });
        Self::replace_task(&self.frame_task, task);
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        for slot in [&mut self.stream_task, &mut self.frame_task] {
            let task = slot.get_mut().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(task) = task {
                task.abort();
            }
        }
    }
}

struct FrameSink {
    view: Arc<PanelView>,
    snapshot_path: Option<PathBuf>,
}

impl FrameSink {
    fn new(view: Arc<PanelView>, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            view,
            snapshot_path,
        }
    }

    async fn store(&self, frame: Vec<u8>) {
        if let Some(path) = &self.snapshot_path {
            if let Err(err) = tokio::fs::write(path, &frame).await {
                warn!("failed to write camera frame to {}: {err}", path.display());
            }
        }
        self.view.set_latest_frame(frame);
    }
}

async fn read_stream(client: &Client, url: &Url, sink: &FrameSink) -> Result<()> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("failed to open camera stream {url}"))?;
    if !response.status().is_success() {
        bail!("camera stream returned {}", response.status());
    }

    info!("camera stream opened: {url}");
    let mut body = response.bytes_stream();
    let mut extractor = MjpegFrameExtractor::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.context("camera stream read failed")?;
        if let Some(frame) = extractor.feed(&chunk) {
            sink.store(frame).await;
        }
    }

    warn!(
        "camera stream ended after {} frames",
        extractor.frames_seen()
    );
    Ok(())
}

async fn fetch_frame(
    client: &Client,
    url: &Url,
    frame_timeout: Duration,
    sink: &FrameSink,
) -> Result<()> {
    let response = client
        .get(url.clone())
        .timeout(frame_timeout)
        .send()
        .await
        .context("frame request failed")?;

    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        debug!("no camera frame available yet");
        return Ok(());
    }
    if !status.is_success() {
        bail!("frame endpoint returned {status}");
    }

    let frame = response.bytes().await.context("frame body failed")?;
    if frame.is_empty() {
        return Ok(());
    }
    sink.store(frame.to_vec()).await;
    Ok(())
}
