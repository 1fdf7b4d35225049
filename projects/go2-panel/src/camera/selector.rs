use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::core::state::CameraMode;

use super::traits::{CameraProbe, CameraSurface};

pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub const CONTINUOUS_STATUS: &str = "continuous stream connected";
pub const UNAVAILABLE_STATUS: &str = "continuous stream unavailable, polling frames...";
pub const SLOW_STATUS: &str = "continuous stream slow, polling frames...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraEndpoints {
    pub stream: Url,
    pub frame: Url,
}

impl CameraEndpoints {
    pub fn from_base(base: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            stream: base.join("/api/video/mjpeg")?,
            frame: base.join("/api/video/frame")?,
        })
    }

    pub fn probe_url(&self) -> Url {
        let mut url = self.stream.clone();
        url.query_pairs_mut().append_pair("probe", "1");
        url
    }

    pub fn frame_url(&self, stamp_ms: u64) -> Url {
        let mut url = self.frame.clone();
        url.query_pairs_mut()
            .append_pair("ts", &stamp_ms.to_string());
        url
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraTiming {
    pub decision_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for CameraTiming {
    fn default() -> Self {
        Self {
            decision_timeout: DEFAULT_DECISION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Loaded,
    Failed(String),
    TimedOut,
}

/// Picks continuous streaming or single-frame polling once, then sticks with it.
pub struct CameraFeedSelector<S: CameraSurface> {
    endpoints: CameraEndpoints,
    timing: CameraTiming,
    surface: Arc<S>,
    mode_tx: watch::Sender<CameraMode>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<S: CameraSurface + 'static> CameraFeedSelector<S> {
    pub fn new(endpoints: CameraEndpoints, timing: CameraTiming, surface: Arc<S>) -> Self {
        let (mode_tx, _) = watch::channel(CameraMode::Undecided);
        Self {
            endpoints,
            timing,
            surface,
            mode_tx,
            poller: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> CameraMode {
        *self.mode_tx.borrow()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<CameraMode> {
        self.mode_tx.subscribe()
    }

    pub fn endpoints(&self) -> &CameraEndpoints {
        &self.endpoints
    }

    /// Races one probe of the continuous stream against the decision window.
    pub async fn run<P: CameraProbe + ?Sized>(&self, probe: &P) -> CameraMode {
        if self.mode().is_decided() {
            return self.mode();
        }

        let url = self.endpoints.probe_url();
        info!("probing continuous camera stream: {url}");
        let outcome = tokio::select! {
            result = probe.probe(&url) => match result {
                Ok(()) => ProbeOutcome::Loaded,
                Err(err) => ProbeOutcome::Failed(format!("{err:#}")),
            },
            _ = sleep(self.timing.decision_timeout) => ProbeOutcome::TimedOut,
        };

        self.resolve(outcome);
        self.mode()
    }

    pub fn spawn<P: CameraProbe + 'static>(self: &Arc<Self>, probe: P) -> JoinHandle<CameraMode> {
        let selector = Arc::clone(self);
        tokio::spawn(async move { selector.run(&probe).await })
    }

    /// Applies the first outcome only. Returns `false` when a decision already exists.
    pub fn resolve(&self, outcome: ProbeOutcome) -> bool {
        let next = match outcome {
            ProbeOutcome::Loaded => CameraMode::Continuous,
            ProbeOutcome::Failed(_) | ProbeOutcome::TimedOut => CameraMode::Polled,
        };
        let took_effect = self.mode_tx.send_if_modified(|mode| {
            if mode.is_decided() {
                return false;
            }
            *mode = next;
            true
        });
        if !took_effect {
            debug!("camera outcome {outcome:?} ignored, mode already {:?}", self.mode());
            return false;
        }

        match outcome {
            ProbeOutcome::Loaded => {
                info!("camera using continuous stream {}", self.endpoints.stream);
                self.surface.bind_stream(self.endpoints.stream.clone());
                self.surface.set_status(CONTINUOUS_STATUS);
            }
            ProbeOutcome::Failed(reason) => {
                warn!("camera stream probe failed ({reason}), falling back to frame polling");
                self.surface.set_status(UNAVAILABLE_STATUS);
                self.start_polling();
            }
            ProbeOutcome::TimedOut => {
                warn!(
                    "camera stream probe undecided after {:?}, falling back to frame polling",
                    self.timing.decision_timeout
                );
                self.surface.set_status(SLOW_STATUS);
                self.start_polling();
            }
        }
        true
    }

    pub(crate) fn start_polling(&self) {
        self.stop_polling();

        let surface = Arc::clone(&self.surface);
        let endpoints = self.endpoints.clone();
        let period = self.timing.poll_interval.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut stamps = FrameStamps::start();
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                surface.show_frame(endpoints.frame_url(stamps.next()));
            }
        });

        *self.poller.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Teardown. The decided mode is kept.
    pub fn stop(&self) {
        self.stop_polling();
    }

    fn stop_polling(&self) {
        let previous = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = previous {
            task.abort();
        }
    }
}

impl<S: CameraSurface> Drop for CameraFeedSelector<S> {
    fn drop(&mut self) {
        let poller = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = poller.take() {
            task.abort();
        }
    }
}

/// Epoch-millisecond cache busters that strictly increase even when ticks land
/// within the same millisecond.
struct FrameStamps {
    origin_ms: u64,
    origin: Instant,
    last: Option<u64>,
}

impl FrameStamps {
    fn start() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self {
            origin_ms,
            origin: Instant::now(),
            last: None,
        }
    }

    fn next(&mut self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        let now = self.origin_ms.saturating_add(elapsed);
        let stamp = match self.last {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last = Some(stamp);
        stamp
    }
}
