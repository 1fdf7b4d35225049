use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::state::ConnectionState;

use super::{message::StreamMessage, policy::ReconnectPolicy, transport::StreamTransport};

pub const CONNECTED_NOTICE: &str = "[stream connected]";
pub const RETRYING_NOTICE: &str = "[stream disconnected, retrying...]";
pub const GAVE_UP_NOTICE: &str = "[stream disconnected]";

/// Display side of the log feed.
pub trait EventSink: Send + Sync {
    fn append_log(&self, line: &str);
    fn set_gamepad(&self, connected: bool);
}

/// Keeps the log/gamepad feed attached to `sink` across arbitrary disconnects.
pub struct StreamConnector<T: StreamTransport, S: EventSink> {
    url: Url,
    transport: T,
    policy: ReconnectPolicy,
    sink: Arc<S>,
    state_tx: watch::Sender<ConnectionState>,
}

impl<T, S> StreamConnector<T, S>
where
    T: StreamTransport + 'static,
    S: EventSink + 'static,
{
    pub fn new(url: Url, transport: T, policy: ReconnectPolicy, sink: Arc<S>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url,
            transport,
            policy,
            sink,
            state_tx,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Runs the connect/read/reconnect loop on its own task. Abort the handle to tear it down.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run().await {
                warn!("log stream stopped: {err:#}");
            }
        })
    }

    /// Only returns once the reconnect policy is exhausted.
    pub async fn run(&self) -> Result<()> {
        let mut failures: u32 = 0;
        loop {
            match self.transport.open(&self.url).await {
                Ok(mut payloads) => {
                    failures = 0;
                    self.state_tx.send_replace(ConnectionState::Connected);
                    info!("log stream connected: {}", self.url);
                    self.sink.append_log(CONNECTED_NOTICE);

                    while let Some(payload) = payloads.next().await {
                        match payload {
                            Ok(raw) => self.dispatch(&raw),
                            Err(err) => {
                                warn!("log stream read failed: {err:#}");
                                break;
                            }
                        }
                    }
                    info!("log stream closed: {}", self.url);
                }
                Err(err) => warn!("log stream connect failed: {err:#}"),
            }

            self.state_tx.send_replace(ConnectionState::Disconnected);
            let Some(delay) = self.policy.after_failure(&mut failures) else {
                self.sink.append_log(GAVE_UP_NOTICE);
                bail!("gave up after {failures} consecutive failed attempts");
            };

            self.sink.append_log(RETRYING_NOTICE);
            debug!("log stream reconnect in {delay:?}");
            sleep(delay).await;
        }
    }

    fn dispatch(&self, raw: &str) {
        match StreamMessage::parse(raw) {
            StreamMessage::LogEntry(line) | StreamMessage::RawText(line) => {
                self.sink.append_log(&line)
            }
            StreamMessage::GamepadEvent { connected } => self.sink.set_gamepad(connected),
        }
    }
}
