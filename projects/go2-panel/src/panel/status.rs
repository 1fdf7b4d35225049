use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::warn;

use crate::{
    api::{client::PanelApi, models::BackendStatus},
    core::errors::ApiResult,
};

use super::view::PanelView;

pub async fn refresh_status(api: &PanelApi, view: &PanelView) -> ApiResult<BackendStatus> {
    let status = api.status().await?;
    view.set_backend_status(status.clone());
    Ok(status)
}

/// Fetches the status once and renders it the way the watch view shows it.
pub async fn status_report(api: &PanelApi) -> ApiResult<String> {
    let view = PanelView::new();
    let status = refresh_status(api, &view).await?;
    Ok(format!("{}\n{}", status.summary(), view.gamepad_label()))
}

/// Refreshes the backend status immediately and then once per period.
pub struct StatusPoller {
    api: PanelApi,
    view: Arc<PanelView>,
    period: Duration,
}

impl StatusPoller {
    pub fn new(api: PanelApi, view: Arc<PanelView>, period: Duration) -> Self {
        Self {
            api,
            view,
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = refresh_status(&self.api, &self.view).await {
                warn!("status refresh failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
    use serde_json::json;
    use tokio::time::{sleep, timeout};

    use crate::{api::client::PanelApi, panel::view::PanelView, test_support::spawn_backend};

    use super::{StatusPoller, status_report};

    async fn wait_for_hits(hits: &AtomicUsize, wanted: usize) {
        timeout(Duration::from_secs(5), async {
            while hits.load(Ordering::SeqCst) < wanted {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("backend should be polled");
    }

    #[tokio::test]
    async fn poller_keeps_view_in_sync() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/status",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "running": n > 0, "gamepad_connected": true, "config": null }))
                }),
            )
            .with_state(hits.clone());
        let api = PanelApi::new(spawn_backend(router).await, Duration::from_secs(5))
            .expect("client should build");
        let view = Arc::new(PanelView::new());

        let handle = StatusPoller::new(api, view.clone(), Duration::from_millis(20)).spawn();
        wait_for_hits(&hits, 3).await;
        sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(
            view.backend_summary().as_deref(),
            Some("Status: running | Config: —")
        );
        assert_eq!(view.gamepad(), Some(true));
    }

    #[tokio::test]
    async fn failures_do_not_stop_polling() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/status",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::SERVICE_UNAVAILABLE
                }),
            )
            .with_state(hits.clone());
        let api = PanelApi::new(spawn_backend(router).await, Duration::from_secs(5))
            .expect("client should build");
        let view = Arc::new(PanelView::new());

        let handle = StatusPoller::new(api, view.clone(), Duration::from_millis(20)).spawn();
        wait_for_hits(&hits, 3).await;
        handle.abort();

        assert_eq!(view.backend_summary(), None);
        assert_eq!(view.gamepad(), None);
    }

    #[tokio::test]
    async fn report_uses_the_view_gamepad_label() {
        let router = Router::new().route(
            "/api/status",
            get(|| async {
                Json(json!({ "running": false, "gamepad_connected": false, "config": {} }))
            }),
        );
        let api = PanelApi::new(spawn_backend(router).await, Duration::from_secs(5))
            .expect("client should build");

        let report = status_report(&api).await.expect("status should load");
        assert_eq!(report, "Status: stopped | Config: {}\nGamepad: not detected");
    }
}
